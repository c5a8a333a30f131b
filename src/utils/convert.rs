use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::config::ports::{AppConfig, ConversionPort};
use crate::utils::charset::{Charset, CharsetRegistry, EncodingId};
use crate::utils::file::{create_output_file, derive_output_path, open_line_reader, resolve_input_path};

// 行尾固定為 CRLF，與執行平台無關
pub const NEW_LINE: &str = "\r\n";

pub const SUFFIX_TO_UTF8: &str = "_utf8.txt";
pub const SUFFIX_TO_SJIS: &str = "_sjis.txt";
pub const SUFFIX_TO_JIS: &str = "_jis.txt";
pub const SUFFIX_TO_JIS2: &str = "_jis2.txt";

/// 一次排定的轉換
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub src: PathBuf,
    pub src_encoding: EncodingId,
    pub dest: PathBuf,
    pub dest_encoding: EncodingId,
}

impl ConversionJob {
    pub fn new(src: PathBuf, src_encoding: EncodingId, dest: PathBuf, dest_encoding: EncodingId) -> Self {
        ConversionJob { src, src_encoding, dest, dest_encoding }
    }

    pub fn execute(&self, registry: &CharsetRegistry) -> io::Result<ConversionStats> {
        convert(registry, &self.src, self.src_encoding, &self.dest, self.dest_encoding)
    }
}

/// 完成的轉換的行數統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub lines: usize,
    pub substituted_lines: usize,
}

/// 整次執行的結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub completed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl ConversionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 由一個 Shift-JIS 輸入檔產生的四個轉換，依執行順序排列
pub fn build_conversion_plan(input: &Path) -> Vec<ConversionJob> {
    let path_sjis = input.to_path_buf();
    let path_utf8 = derive_output_path(input, SUFFIX_TO_UTF8);
    let path_re_sjis = derive_output_path(input, SUFFIX_TO_SJIS);
    let path_jis = derive_output_path(input, SUFFIX_TO_JIS);
    let path_jis2 = derive_output_path(input, SUFFIX_TO_JIS2);

    vec![
        ConversionJob::new(path_sjis.clone(), EncodingId::ShiftJis, path_utf8.clone(), EncodingId::Utf8),
        ConversionJob::new(path_utf8.clone(), EncodingId::Utf8, path_re_sjis, EncodingId::ShiftJis),
        ConversionJob::new(path_utf8, EncodingId::Utf8, path_jis, EncodingId::Jis),
        ConversionJob::new(path_sjis, EncodingId::ShiftJis, path_jis2, EncodingId::Jis),
    ]
}

/// 將 `src` 逐行轉換為 `dest` 的文字碼
///
/// 每一行先經過 [`convert_charset`] 再寫出，行尾為 CRLF。
/// 來源開啟成功後才建立（或覆寫）輸出檔；讀取中途失敗時輸出檔會被截斷。
pub fn convert(
    registry: &CharsetRegistry,
    src: &Path,
    src_encoding: EncodingId,
    dest: &Path,
    dest_encoding: EncodingId,
) -> io::Result<ConversionStats> {
    let src_charset = registry.charset_for(src_encoding)?;
    let dest_charset = registry.charset_for(dest_encoding)?;

    let reader = open_line_reader(src, src_charset)?;
    let mut writer = create_output_file(dest)?;
    let (new_line, _) = dest_charset.encode(NEW_LINE);

    let mut stats = ConversionStats::default();
    for line in reader {
        let line = line?;
        let (converted, substituted) = convert_charset(&line, dest_charset);
        if substituted {
            stats.substituted_lines += 1;
        }
        let (bytes, _) = dest_charset.encode(&converted);
        writer.write_all(&bytes)?;
        writer.write_all(&new_line)?;
        stats.lines += 1;
    }
    writer.flush()?;

    Ok(stats)
}

/// 以 `charset` 編碼後再解碼，無法表示的字元會變成 `?`。
/// 第二個值表示是否發生替換。
pub fn convert_charset(line: &str, charset: Charset) -> (String, bool) {
    charset.round_trip(line)
}

/// 依序執行所有轉換，失敗的轉換只記錄錯誤，繼續執行下一個
pub fn execute_conversion(registry: &CharsetRegistry, jobs: &[ConversionJob]) -> ConversionReport {
    let mut report = ConversionReport::default();

    for job in jobs {
        info!(
            "開始轉換：{}（{}）-> {}（{}）",
            job.src.display(),
            job.src_encoding,
            job.dest.display(),
            job.dest_encoding
        );
        match job.execute(registry) {
            Ok(stats) => {
                if stats.substituted_lines > 0 {
                    warn!(
                        "{} 中有 {} 行含無法以 {} 表示的字元，已替換為 '?'",
                        job.dest.display(),
                        stats.substituted_lines,
                        job.dest_encoding
                    );
                }
                info!("轉換完成：{}，共 {} 行", job.dest.display(), stats.lines);
                report.completed.push(job.dest.clone());
            }
            Err(e) => {
                error!(
                    "轉換失敗：{} -> {}：{}",
                    job.src.display(),
                    job.dest.display(),
                    e
                );
                report.failed.push(job.dest.clone());
            }
        }
    }

    report
}

// 轉換執行適配器，持有啟動時建立的文字碼註冊表
pub struct ConversionAdapter {
    registry: CharsetRegistry,
}

impl ConversionAdapter {
    pub fn new(registry: CharsetRegistry) -> Self {
        ConversionAdapter { registry }
    }
}

impl ConversionPort for ConversionAdapter {
    fn execute(&self, config: AppConfig) -> io::Result<ConversionReport> {
        let input = resolve_input_path(&config.input);
        info!("開始文字碼轉換，輸入檔案：{}", input.display());

        let jobs = build_conversion_plan(&input);
        Ok(execute_conversion(&self.registry, &jobs))
    }
}
