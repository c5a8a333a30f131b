use std::io;

use crate::config::ports::{AppConfig, ConfigPort};
use crate::utils::charset::CharsetAliases;

// 配置服務，負責選擇適當的配置適配器
pub struct ConfigService {
    config_port: Box<dyn ConfigPort>,
}

impl ConfigService {
    pub fn new(config_port: Box<dyn ConfigPort>) -> Self {
        ConfigService { config_port }
    }

    pub fn get_config(&self) -> io::Result<AppConfig> {
        self.config_port.get_config()
    }
}

// 預設配置適配器：只指定輸入檔，使用內建別名
pub struct DefaultConfigAdapter {
    input: String,
}

impl DefaultConfigAdapter {
    pub fn new(input: String) -> Self {
        DefaultConfigAdapter { input }
    }
}

impl ConfigPort for DefaultConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        Ok(AppConfig {
            input: self.input.clone(),
            charset_map: CharsetAliases::builtin(),
        })
    }
}
