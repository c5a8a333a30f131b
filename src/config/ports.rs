use std::io;

use crate::utils::charset::CharsetAliases;
use crate::utils::convert::ConversionReport;

// 應用配置結構體
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub input: String,
    pub charset_map: CharsetAliases,
}

// 配置來源的 Port
pub trait ConfigPort {
    fn get_config(&self) -> io::Result<AppConfig>;
}

// 轉換執行的 Port
pub trait ConversionPort {
    fn execute(&self, config: AppConfig) -> io::Result<ConversionReport>;
}
