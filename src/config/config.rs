use clap::Parser;
use std::io;

use crate::utils::charset::{CharsetAliases, DEFAULT_CHARSET_MAP};

#[derive(Parser, Clone, Debug)]
#[command(
    name = "japanese_charset_convert",
    version,
    about = "將 Shift-JIS 文字檔轉換為 UTF-8、Shift-JIS 與 JIS (ISO-2022-JP)",
    long_about = "讀取 Shift-JIS 文字檔，依序輸出四個檔案：\n  <input>_utf8.txt  Shift-JIS -> UTF-8\n  <input>_sjis.txt  UTF-8 -> Shift-JIS\n  <input>_jis.txt   UTF-8 -> JIS\n  <input>_jis2.txt  Shift-JIS -> JIS\n行尾一律為 CRLF，無法表示的字元替換為 '?'。"
)]
pub struct Cli {
    /// 輸入檔名（以目前工作目錄為基準）
    pub input: String,
    /// 文字碼別名，格式為 target/name，以逗號分隔；空字串表示不使用別名
    #[arg(long, default_value = DEFAULT_CHARSET_MAP)]
    pub charset_map: String,
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warn", "error"])]
    pub log_level: String,
    #[arg(long, default_value_t = false)]
    pub show_config: bool,
}

pub fn validate_input_name(input: &str) -> io::Result<&str> {
    if input.trim().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "輸入檔名不可為空"));
    }
    Ok(input)
}

pub fn parse_charset_map(charset_map: &str) -> io::Result<CharsetAliases> {
    charset_map.parse().map_err(|e: io::Error| {
        log::error!("文字碼別名設定錯誤：{}", e);
        e
    })
}
