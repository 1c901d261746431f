use super::{ExtractError, Extracted, Extractor};

/// Plain text, Markdown and subtitle files
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let text =
            decode_text(bytes).unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned());
        Ok(Extracted::new(normalize_newlines(&text)))
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

/// Decode bytes as UTF-8 or BOM-marked UTF-16, stripping any byte order mark.
/// Returns `None` when the bytes are neither.
pub(crate) fn decode_text(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => std::str::from_utf8(rest).ok().map(str::to_string),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => std::str::from_utf8(bytes).ok().map(str::to_string),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Convert `\r\n` and lone `\r` line endings to `\n`
pub(crate) fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Clean up text recovered from markup: collapse runs of spaces and tabs,
/// trim each line and allow at most one blank line between paragraphs.
pub(crate) fn tidy(text: &str) -> String {
    let text = normalize_newlines(text).replace('\0', "");
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        out.push_str(&line);
    }

    out
}

#[cfg(test)]
mod text_tests {
    use super::*;

    #[test]
    fn test_decode_strips_utf8_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello").as_deref(), Some("hello"));
    }

    #[test]
    fn test_decode_utf16_le() {
        let bytes = [0xFF, 0xFE, b'h', 0, b'i', 0];
        assert_eq!(decode_text(&bytes).as_deref(), Some("hi"));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert_eq!(decode_text(&[0xC3, 0x28]), None);
    }

    #[test]
    fn test_tidy_collapses_whitespace_and_blank_lines() {
        let messy = "  Title \r\n\r\n\r\n\tfirst   line\nsecond\n\n\n";
        assert_eq!(tidy(messy), "Title\n\nfirst line\nsecond");
    }

    #[test]
    fn test_text_extractor_keeps_content() {
        let extracted = TextExtractor.extract("a.md", b"# Heading\r\n\r\nBody").unwrap();
        assert_eq!(extracted.text, "# Heading\n\nBody");
    }
}
