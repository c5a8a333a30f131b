use std::io;

use clap::error::ErrorKind;
use clap::Parser;

use crate::config::config::{parse_charset_map, validate_input_name, Cli};
use crate::config::ports::{AppConfig, ConfigPort, ConversionPort};
use crate::service::config_service::{ConfigService, DefaultConfigAdapter};
use crate::utils::charset::{CharsetRegistry, DEFAULT_CHARSET_MAP};
use crate::utils::convert::{ConversionAdapter, ConversionReport};
use crate::utils::utils::{print_startup_diagnostics, setup_logging};

pub fn process_args(args: Vec<String>) -> io::Result<ConversionReport> {
    let cli = parse_cli(args)?;
    process_cli_mode(cli)
}

// 參數錯誤以 InvalidInput 回報，--help 與 --version 交由 clap 處理
pub fn parse_cli(args: Vec<String>) -> io::Result<Cli> {
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string())),
    }
}

pub fn process_cli_mode(cli: Cli) -> io::Result<ConversionReport> {
    setup_logging(&cli.log_level)?;

    // 未指定別名時使用預設配置
    let config_port: Box<dyn ConfigPort> = if cli.charset_map == DEFAULT_CHARSET_MAP {
        Box::new(DefaultConfigAdapter::new(cli.input.clone()))
    } else {
        log::info!("使用自訂文字碼別名：{}", cli.charset_map);
        Box::new(CliConfigAdapter::new(cli.clone()))
    };

    let config_service = ConfigService::new(config_port);
    let config = config_service.get_config()?;

    // 別名只在此建立一次，之後注入轉換流程
    let registry = CharsetRegistry::new(config.charset_map.clone());
    if let Err(e) = print_startup_diagnostics(&registry) {
        log::warn!("無法輸出文字碼清單：{}", e);
    }

    let conversion_port: Box<dyn ConversionPort> = Box::new(ConversionAdapter::new(registry));
    let report = conversion_port.execute(config.clone())?;

    if cli.show_config {
        println!("實際使用的配置：{:#?}", config);
    }

    Ok(report)
}

// CLI 配置適配器
pub struct CliConfigAdapter {
    cli: Cli,
}

impl CliConfigAdapter {
    pub fn new(cli: Cli) -> Self {
        CliConfigAdapter { cli }
    }
}

impl ConfigPort for CliConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        let input = validate_input_name(&self.cli.input)?;
        let charset_map = parse_charset_map(&self.cli.charset_map)?;

        Ok(AppConfig {
            input: input.to_string(),
            charset_map,
        })
    }
}
