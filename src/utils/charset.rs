use std::borrow::Cow;
use std::fmt;
use std::io;
use std::str::FromStr;

use encoding_rs::{Decoder, Encoding, EncoderResult, ISO_2022_JP, SHIFT_JIS, UTF_8};

// 無法以輸出文字碼表示的字元一律替換成此字元
pub const SUBSTITUTION_CHAR: char = '?';

// 預設的文字碼別名，格式為 target/name，以逗號分隔
pub const DEFAULT_CHARSET_MAP: &str = "windows-31j/Shift_JIS,x-windows-iso2022jp/ISO-2022-JP";

// JIS X 0208 與 Windows-31J 對應不同的字元：(JIS 的對應, Windows-31J 的對應)
const JIS_MS_DIVERGENT: [(char, char); 6] = [
    ('\u{301C}', '\u{FF5E}'), // 〜
    ('\u{2016}', '\u{2225}'), // ‖
    ('\u{2212}', '\u{FF0D}'), // −
    ('\u{00A2}', '\u{FFE0}'), // ¢
    ('\u{00A3}', '\u{FFE1}'), // £
    ('\u{00AC}', '\u{FFE2}'), // ¬
];

/// 轉換計畫使用的文字碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingId {
    Utf8,
    ShiftJis,
    Jis,
}

impl EncodingId {
    pub fn canonical_name(self) -> &'static str {
        match self {
            EncodingId::Utf8 => "UTF-8",
            EncodingId::ShiftJis => "Shift_JIS",
            EncodingId::Jis => "ISO-2022-JP",
        }
    }
}

impl fmt::Display for EncodingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// 註冊表中實際使用的編碼器
///
/// `ShiftJis` 與 `Iso2022Jp` 只涵蓋 JIS X 0208，並採用 JIS 的對應（〜 為 U+301C）。
/// Windows 版本另含 NEC 特殊文字（13 區，①、Ⅰ 等）、IBM 擴充與外字。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    ShiftJis,
    Windows31j,
    Iso2022Jp,
    WindowsIso2022Jp,
}

impl Charset {
    pub const ALL: [Charset; 5] = [
        Charset::Utf8,
        Charset::ShiftJis,
        Charset::Windows31j,
        Charset::Iso2022Jp,
        Charset::WindowsIso2022Jp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::ShiftJis => "Shift_JIS",
            Charset::Windows31j => "windows-31j",
            Charset::Iso2022Jp => "ISO-2022-JP",
            Charset::WindowsIso2022Jp => "x-windows-iso2022jp",
        }
    }

    /// 別名設定比對用的鍵；ISO-2022-JP 的鍵是 `ISO2022JP`
    pub fn alias_key(self) -> &'static str {
        match self {
            Charset::Iso2022Jp => "ISO2022JP",
            other => other.name(),
        }
    }

    fn labels(self) -> &'static [&'static str] {
        match self {
            Charset::Utf8 => &["utf8", "unicode-1-1-utf-8"],
            Charset::ShiftJis => &["sjis", "shift-jis", "x-sjis", "shift_jis_x0208"],
            Charset::Windows31j => &["ms932", "cp932", "windows-932", "csWindows31J"],
            Charset::Iso2022Jp => &["jis", "iso2022jp", "csISO2022JP"],
            Charset::WindowsIso2022Jp => &["windows-iso2022jp"],
        }
    }

    pub fn for_name(name: &str) -> Option<Charset> {
        let name = name.trim();
        Charset::ALL.into_iter().find(|charset| {
            charset.name().eq_ignore_ascii_case(name)
                || charset.labels().iter().any(|label| label.eq_ignore_ascii_case(name))
        })
    }

    fn encoding(self) -> &'static Encoding {
        match self {
            Charset::Utf8 => UTF_8,
            Charset::ShiftJis | Charset::Windows31j => SHIFT_JIS,
            Charset::Iso2022Jp | Charset::WindowsIso2022Jp => ISO_2022_JP,
        }
    }

    fn is_strict(self) -> bool {
        matches!(self, Charset::ShiftJis | Charset::Iso2022Jp)
    }

    /// 解碼結果是否可包含 `ch`
    pub fn accepts(self, ch: char) -> bool {
        !(self.is_strict() && is_windows_extension(ch))
    }

    /// 回傳第一個不屬於此文字碼的字元
    pub fn check_repertoire(self, text: &str) -> Result<(), char> {
        match text.chars().find(|&ch| !self.accepts(ch)) {
            Some(ch) => Err(ch),
            None => Ok(()),
        }
    }

    // 串流解碼用，UTF-8 的 BOM 保留為文字
    pub fn new_decoder(self) -> Decoder {
        self.encoding().new_decoder_without_bom_handling()
    }

    /// 將解碼器輸出的 Windows-31J 對應換成此文字碼的對應
    pub fn normalize_decoded<'a>(self, text: &'a str) -> Cow<'a, str> {
        if !self.is_strict() || !text.chars().any(|ch| ms_to_jis(ch).is_some()) {
            return Cow::Borrowed(text);
        }
        Cow::Owned(text.chars().map(|ch| ms_to_jis(ch).unwrap_or(ch)).collect())
    }

    /// 編碼 `text`，無法表示的字元寫成 [`SUBSTITUTION_CHAR`]。
    /// 回傳位元組與替換的字元數。
    pub fn encode(self, text: &str) -> (Vec<u8>, usize) {
        let mut substituted = 0;
        let text: Cow<'_, str> = if self.is_strict() {
            Cow::Owned(
                text.chars()
                    .map(|ch| {
                        if is_windows_extension(ch) || ms_to_jis(ch).is_some() {
                            substituted += 1;
                            SUBSTITUTION_CHAR
                        } else {
                            jis_to_ms(ch).unwrap_or(ch)
                        }
                    })
                    .collect(),
            )
        } else {
            Cow::Borrowed(text)
        };

        let (bytes, unmappable) = encode_with_substitution(self.encoding(), &text);
        (bytes, substituted + unmappable)
    }

    /// 解碼 `bytes`，錯誤的位元組換成 U+FFFD
    pub fn decode(self, bytes: &[u8]) -> String {
        let (text, _) = self.encoding().decode_without_bom_handling(bytes);
        self.normalize_decoded(&text).into_owned()
    }

    /// 先編碼再以同一文字碼解碼，讓無法表示的字元在寫出前就被替換。
    /// 旗標表示是否發生替換。
    pub fn round_trip(self, text: &str) -> (String, bool) {
        let (bytes, substituted) = self.encode(text);
        (self.decode(&bytes), substituted > 0)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn jis_to_ms(ch: char) -> Option<char> {
    JIS_MS_DIVERGENT.iter().find(|(jis, _)| *jis == ch).map(|(_, ms)| *ms)
}

fn ms_to_jis(ch: char) -> Option<char> {
    JIS_MS_DIVERGENT.iter().find(|(_, ms)| *ms == ch).map(|(jis, _)| *jis)
}

// 外字（U+E000-U+E757）以及 Shift_JIS 第一個位元組為擴充區的字元
// 0x87: NEC 特殊文字 (13 區)，0xED/0xEE: NEC 選定 IBM 擴充，0xF0-0xF9: 外字，0xFA-0xFC: IBM 擴充
fn is_windows_extension(ch: char) -> bool {
    if ch.is_ascii() {
        return false;
    }
    if ('\u{E000}'..='\u{E757}').contains(&ch) {
        return true;
    }
    let mut buf = [0u8; 4];
    let (bytes, _, had_errors) = SHIFT_JIS.encode(ch.encode_utf8(&mut buf));
    if had_errors || bytes.len() != 2 {
        return false;
    }
    matches!(bytes[0], 0x87 | 0xED | 0xEE | 0xF0..=0xFC)
}

fn encode_with_substitution(encoding: &'static Encoding, text: &str) -> (Vec<u8>, usize) {
    let mut encoder = encoding.new_encoder();
    let mut output = Vec::with_capacity(text.len());
    let mut substituted = 0;
    let mut rest = text;

    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(rest.len())
            .unwrap_or(rest.len() * 4 + 8);
        output.reserve(needed);

        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut output, true);
        rest = &rest[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(ch) => {
                log::debug!("無法以 {} 表示的字元：{:?}，替換為 '{}'", encoding.name(), ch, SUBSTITUTION_CHAR);
                substituted += 1;
                // 替換字元經由編碼器寫出，ISO-2022-JP 會先切回 ASCII
                let mut substitute = [0u8; 4];
                let substitute = SUBSTITUTION_CHAR.encode_utf8(&mut substitute);
                let needed = encoder
                    .max_buffer_length_from_utf8_without_replacement(substitute.len())
                    .unwrap_or(8);
                output.reserve(needed);
                let (result, _) = encoder.encode_from_utf8_to_vec_without_replacement(substitute, &mut output, false);
                debug_assert!(matches!(result, EncoderResult::InputEmpty));
            }
        }
    }

    (output, substituted)
}

/// 文字碼別名設定
///
/// 文字形式為以逗號分隔的 `target/name`，例如 `windows-31j/Shift_JIS`。
/// `name` 與 [`Charset::alias_key`] 比對。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharsetAliases {
    entries: Vec<(String, String)>,
}

impl CharsetAliases {
    pub fn none() -> Self {
        CharsetAliases::default()
    }

    /// 未指定時使用的別名設定
    pub fn builtin() -> Self {
        let mut aliases = CharsetAliases::none();
        aliases.insert(Charset::Windows31j.name(), EncodingId::ShiftJis.canonical_name());
        aliases.insert(Charset::WindowsIso2022Jp.name(), EncodingId::Jis.canonical_name());
        aliases
    }

    pub fn insert(&mut self, target: &str, name: &str) {
        self.entries.retain(|(_, existing)| !existing.eq_ignore_ascii_case(name));
        self.entries.push((target.to_string(), name.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(_, alias)| alias.eq_ignore_ascii_case(name.trim()))
            .map(|(target, _)| target.as_str())
            .unwrap_or(name)
    }
}

impl FromStr for CharsetAliases {
    type Err = io::Error;

    fn from_str(s: &str) -> io::Result<Self> {
        let mut aliases = CharsetAliases::none();
        for entry in s.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (target, name) = entry.split_once('/').ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("無效的文字碼別名設定：'{}'，格式應為 target/name", entry),
                )
            })?;
            let (target, name) = (target.trim(), name.trim());
            if target.is_empty() || name.is_empty() || name.contains('/') {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("無效的文字碼別名設定：'{}'", entry),
                ));
            }
            aliases.insert(target, name);
        }
        Ok(aliases)
    }
}

impl fmt::Display for CharsetAliases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (target, name)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}/{}", target, name)?;
        }
        Ok(())
    }
}

/// 依別名設定將文字碼名稱解析為 [`Charset`]
#[derive(Debug, Clone)]
pub struct CharsetRegistry {
    aliases: CharsetAliases,
}

impl CharsetRegistry {
    pub fn new(aliases: CharsetAliases) -> Self {
        CharsetRegistry { aliases }
    }

    pub fn aliases(&self) -> &CharsetAliases {
        &self.aliases
    }

    pub fn lookup(&self, name: &str) -> io::Result<Charset> {
        let charset = Charset::for_name(name).ok_or_else(|| unsupported(name))?;
        let target = self.aliases.resolve(charset.alias_key());
        let resolved = Charset::for_name(target).ok_or_else(|| unsupported(target))?;
        log::debug!("文字碼 {} 解析為 {}", name, resolved);
        Ok(resolved)
    }

    pub fn charset_for(&self, id: EncodingId) -> io::Result<Charset> {
        self.lookup(id.canonical_name())
    }

    /// 所有可用的文字碼名稱，不分大小寫排序
    pub fn available_charsets(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Charset::ALL.iter().map(|charset| charset.name()).collect();
        names.sort_by_key(|name| name.to_ascii_lowercase());
        names
    }
}

fn unsupported(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("不支援的文字碼：{}", name))
}

impl Default for CharsetRegistry {
    fn default() -> Self {
        CharsetRegistry::new(CharsetAliases::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_label_ignores_case() {
        assert_eq!(Charset::for_name("utf-8"), Some(Charset::Utf8));
        assert_eq!(Charset::for_name("SJIS"), Some(Charset::ShiftJis));
        assert_eq!(Charset::for_name("MS932"), Some(Charset::Windows31j));
        assert_eq!(Charset::for_name("jis"), Some(Charset::Iso2022Jp));
        assert_eq!(Charset::for_name("EUC-JP"), None);
    }

    #[test]
    fn test_default_aliases_extend_shift_jis_only() {
        let registry = CharsetRegistry::default();
        assert_eq!(registry.charset_for(EncodingId::ShiftJis).unwrap(), Charset::Windows31j);
        // ISO-2022-JP 的鍵是 ISO2022JP，預設設定中的 /ISO-2022-JP 不會生效
        assert_eq!(registry.charset_for(EncodingId::Jis).unwrap(), Charset::Iso2022Jp);
        assert_eq!(registry.charset_for(EncodingId::Utf8).unwrap(), Charset::Utf8);
    }

    #[test]
    fn test_jis_alias_by_key_picks_windows_variant() {
        let registry = CharsetRegistry::new("x-windows-iso2022jp/ISO2022JP".parse().unwrap());
        assert_eq!(registry.charset_for(EncodingId::Jis).unwrap(), Charset::WindowsIso2022Jp);
        assert_eq!(registry.lookup("jis").unwrap(), Charset::WindowsIso2022Jp);
        assert_eq!(registry.charset_for(EncodingId::ShiftJis).unwrap(), Charset::ShiftJis);
    }

    #[test]
    fn test_no_aliases_pick_strict_variants() {
        let registry = CharsetRegistry::new(CharsetAliases::none());
        assert_eq!(registry.charset_for(EncodingId::ShiftJis).unwrap(), Charset::ShiftJis);
        assert_eq!(registry.charset_for(EncodingId::Jis).unwrap(), Charset::Iso2022Jp);
    }

    #[test]
    fn test_unknown_alias_target_is_unsupported() {
        let registry = CharsetRegistry::new("x-unknown/Shift_JIS".parse().unwrap());
        let err = registry.charset_for(EncodingId::ShiftJis).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(
            CharsetRegistry::default().lookup("EUC-JP").unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_alias_map_text_form() {
        let aliases: CharsetAliases = DEFAULT_CHARSET_MAP.parse().unwrap();
        assert_eq!(aliases.to_string(), DEFAULT_CHARSET_MAP);
        assert_eq!(aliases, CharsetAliases::builtin());
        assert_eq!(aliases.resolve("shift_jis"), "windows-31j");
        assert_eq!(aliases.resolve("UTF-8"), "UTF-8");
        assert_eq!(aliases.resolve("ISO2022JP"), "ISO2022JP");

        let empty: CharsetAliases = "".parse().unwrap();
        assert!(empty.is_empty());

        assert!("windows-31j".parse::<CharsetAliases>().is_err());
        assert!("/Shift_JIS".parse::<CharsetAliases>().is_err());
    }

    #[test]
    fn test_later_alias_replaces_earlier() {
        let aliases: CharsetAliases = "windows-31j/Shift_JIS,Shift_JIS/Shift_JIS".parse().unwrap();
        assert_eq!(aliases.resolve("Shift_JIS"), "Shift_JIS");
    }

    #[test]
    fn test_available_charsets_sorted() {
        let names = CharsetRegistry::default().available_charsets();
        assert_eq!(
            names,
            vec!["ISO-2022-JP", "Shift_JIS", "UTF-8", "windows-31j", "x-windows-iso2022jp"]
        );
    }

    #[test]
    fn test_shift_jis_encode() {
        let (bytes, substituted) = Charset::Windows31j.encode("日本語");
        assert_eq!(bytes, vec![0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA]);
        assert_eq!(substituted, 0);
    }

    #[test]
    fn test_circled_number_in_windows_variants() {
        assert_eq!(Charset::Windows31j.encode("①").0, vec![0x87, 0x40]);
        assert_eq!(
            Charset::WindowsIso2022Jp.encode("①").0,
            b"\x1b$B\x2d\x21\x1b(B".to_vec()
        );
    }

    #[test]
    fn test_circled_number_substituted_in_strict_variants() {
        assert_eq!(Charset::ShiftJis.round_trip("A①B"), ("A?B".to_string(), true));
        assert_eq!(Charset::Iso2022Jp.round_trip("あ①い"), ("あ?い".to_string(), true));
    }

    #[test]
    fn test_unmappable_char_substituted_once() {
        let (bytes, substituted) = Charset::Iso2022Jp.encode("x😀y");
        assert_eq!(bytes, b"x?y".to_vec());
        assert_eq!(substituted, 1);
    }

    #[test]
    fn test_substitution_returns_jis_to_ascii() {
        let (bytes, _) = Charset::Iso2022Jp.encode("あ😀");
        assert_eq!(bytes, b"\x1b$B\x24\x22\x1b(B?".to_vec());
        assert_eq!(Charset::Iso2022Jp.decode(&bytes), "あ?");
    }

    #[test]
    fn test_round_trip_is_identity_for_representable_text() {
        let text = "こんにちは、世界 ABC 123";
        for charset in Charset::ALL {
            assert_eq!(charset.round_trip(text), (text.to_string(), false), "{}", charset);
        }
    }

    #[test]
    fn test_check_repertoire() {
        assert_eq!(Charset::ShiftJis.check_repertoire("日本①"), Err('①'));
        assert_eq!(Charset::Windows31j.check_repertoire("日本①"), Ok(()));
        assert_eq!(Charset::Utf8.check_repertoire("①"), Ok(()));
    }

    #[test]
    fn test_user_defined_area_outside_strict_repertoire() {
        assert_eq!(Charset::ShiftJis.check_repertoire("\u{E000}"), Err('\u{E000}'));
        assert_eq!(Charset::Iso2022Jp.check_repertoire("a\u{E757}"), Err('\u{E757}'));
        assert_eq!(Charset::Windows31j.check_repertoire("\u{E000}"), Ok(()));
        assert_eq!(Charset::ShiftJis.round_trip("\u{E000}"), ("?".to_string(), true));
    }

    #[test]
    fn test_strict_variants_use_jis_mapping() {
        // 〜 ‖ − ¢ £ ¬
        let jis = "\u{301C}\u{2016}\u{2212}\u{00A2}\u{00A3}\u{00AC}";
        assert_eq!(
            Charset::ShiftJis.encode(jis),
            (vec![0x81, 0x60, 0x81, 0x61, 0x81, 0x7C, 0x81, 0x91, 0x81, 0x92, 0x81, 0xCA], 0)
        );
        assert_eq!(Charset::ShiftJis.round_trip(jis), (jis.to_string(), false));
        assert_eq!(Charset::Iso2022Jp.round_trip(jis), (jis.to_string(), false));
        assert_eq!(Charset::ShiftJis.decode(&[0x81, 0x60]), "\u{301C}");
        assert_eq!(Charset::Iso2022Jp.encode("\u{301C}").0, b"\x1b$B\x21\x41\x1b(B".to_vec());
    }

    #[test]
    fn test_windows_variants_use_ms_mapping() {
        let ms = "\u{FF5E}\u{2225}\u{FF0D}\u{FFE0}\u{FFE1}\u{FFE2}";
        assert_eq!(Charset::Windows31j.round_trip(ms), (ms.to_string(), false));
        assert_eq!(Charset::Windows31j.decode(&[0x81, 0x60]), "\u{FF5E}");
        assert_eq!(Charset::Windows31j.round_trip("\u{301C}"), ("?".to_string(), true));
        // Windows-31J 的對應在嚴格版本中無法表示
        assert_eq!(Charset::Iso2022Jp.round_trip("\u{FF5E}"), ("?".to_string(), true));
        assert_eq!(Charset::ShiftJis.round_trip("x\u{FFE2}"), ("x?".to_string(), true));
    }
}
