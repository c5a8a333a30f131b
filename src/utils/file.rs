use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Component, Path, PathBuf};

use encoding_rs::{Decoder, DecoderResult};

use crate::utils::charset::Charset;

const READ_CHUNK_SIZE: usize = 8 * 1024;

// 輸入檔名一律以目前工作目錄為基準，絕對路徑也視為相對路徑
pub fn resolve_input_path(input: &str) -> PathBuf {
    let relative: PathBuf = Path::new(input)
        .components()
        .filter(|component| !matches!(component, Component::Prefix(_) | Component::RootDir | Component::CurDir))
        .collect();
    Path::new(".").join(relative)
}

/// 在 `input` 的檔名後加上 `suffix`，輸出到同一目錄
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", file_name, suffix))
}

pub fn open_line_reader(path: &Path, charset: Charset) -> io::Result<LineReader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(LineReader::new(BufReader::new(file), charset))
}

// 建立或覆寫輸出檔
pub fn create_output_file(path: &Path) -> io::Result<BufWriter<File>> {
    let file = File::create(path)?;
    Ok(BufWriter::new(file))
}

/// 解碼位元組串流並逐行輸出
///
/// 行尾為 `\n`、`\r` 或 `\r\n`，不包含在行內；輸入結尾的行尾不會產生空行。
/// 無法解碼的位元組或不屬於 `charset` 的字元會以 `InvalidData` 結束串流。
pub struct LineReader<R> {
    reader: R,
    charset: Charset,
    decoder: Decoder,
    chunk: Vec<u8>,
    pending: String,
    skip_lf: bool,
    eof: bool,
    failure: Option<io::Error>,
    line_number: usize,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R, charset: Charset) -> Self {
        LineReader {
            reader,
            charset,
            decoder: charset.new_decoder(),
            chunk: vec![0; READ_CHUNK_SIZE],
            pending: String::new(),
            skip_lf: false,
            eof: false,
            failure: None,
            line_number: 0,
        }
    }

    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line() {
                return self.checked(line).map(Some);
            }
            if self.eof {
                if let Some(err) = self.failure.take() {
                    // 解碼失敗前的殘餘內容不輸出
                    self.pending.clear();
                    return Err(err);
                }
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.pending);
                return self.checked(line).map(Some);
            }
            self.fill()?;
        }
    }

    fn take_line(&mut self) -> Option<String> {
        if self.skip_lf && !self.pending.is_empty() {
            if self.pending.starts_with('\n') {
                self.pending.remove(0);
            }
            self.skip_lf = false;
        }

        let pos = self.pending.find(|c| c == '\r' || c == '\n')?;
        let rest = &self.pending[pos..];
        let consumed = if rest.starts_with("\r\n") {
            2
        } else {
            if rest.len() == 1 && rest.starts_with('\r') {
                // 下一個區塊可能以 \n 開頭
                self.skip_lf = true;
            }
            1
        };

        let line = self.pending[..pos].to_string();
        self.pending.drain(..pos + consumed);
        Some(line)
    }

    fn fill(&mut self) -> io::Result<()> {
        let read = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let last = read == 0;

        let mut src = &self.chunk[..read];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length_without_replacement(src.len())
                .unwrap_or(src.len() * 3 + 16);
            self.pending.reserve(needed);

            let (result, consumed) = self
                .decoder
                .decode_to_string_without_replacement(src, &mut self.pending, last);
            src = &src[consumed..];

            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(_, _) => {
                    // 已解碼的完整行仍先交給呼叫端
                    self.failure = Some(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("第 {} 行附近含有無法以 {} 解碼的位元組", self.line_number + 1, self.charset),
                    ));
                    self.eof = true;
                    return Ok(());
                }
            }
        }

        if last {
            self.eof = true;
        }
        Ok(())
    }

    fn checked(&mut self, line: String) -> io::Result<String> {
        self.line_number += 1;
        match self.charset.check_repertoire(&line) {
            Ok(()) => Ok(self.charset.normalize_decoded(&line).into_owned()),
            Err(ch) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("第 {} 行的字元 {:?} 不屬於 {}", self.line_number, ch, self.charset),
            )),
        }
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => {
                // 發生錯誤後不再繼續讀取
                self.eof = true;
                self.pending.clear();
                Some(Err(e))
            }
        }
    }
}
