use std::io::{self, Write};

use crate::utils::charset::CharsetRegistry;

pub fn setup_logging(log_level: &str) -> io::Result<()> {
    let log_level_filter = match log_level {
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    let result = env_logger::Builder::new()
        .filter_level(log_level_filter)
        .try_init();
    if result.is_err() {
        log::debug!("日誌已初始化，沿用現有設定");
    }
    Ok(())
}

/// 先輸出別名設定，再輸出所有可用的文字碼名稱
pub fn write_startup_diagnostics<W: Write>(writer: &mut W, registry: &CharsetRegistry) -> io::Result<()> {
    writeln!(writer, "{}", registry.aliases())?;
    for name in registry.available_charsets() {
        writeln!(writer, "{}", name)?;
    }
    Ok(())
}

pub fn print_startup_diagnostics(registry: &CharsetRegistry) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_startup_diagnostics(&mut handle, registry)?;
    handle.flush()
}
