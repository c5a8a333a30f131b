use std::process;

use japanese_charset_convert::action::cli::process_args;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    match process_args(args) {
        Ok(report) => {
            // 個別轉換失敗只記錄，不影響結束代碼
            log::info!(
                "程式執行完成，成功 {} 個，失敗 {} 個",
                report.completed.len(),
                report.failed.len()
            );
            for path in &report.completed {
                println!("輸出檔案：{}", path.display());
            }
        }
        Err(e) => {
            eprintln!("parameter error.");
            eprintln!("{}", e);
            process::exit(-1);
        }
    }
}
