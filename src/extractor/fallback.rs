use super::text::{decode_text, normalize_newlines};
use super::{ExtractError, Extracted, Extractor};

/// Share of printable bytes required before binary input is salvaged as text
pub const MIN_PRINTABLE_RATIO: f64 = 0.85;

/// Fallback extractor for unknown/unsupported file types
pub struct FallbackExtractor;

impl Extractor for FallbackExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        // Valid text: use as-is
        if let Some(text) = decode_text(bytes) {
            return Ok(Extracted::new(normalize_newlines(&text)));
        }

        // Binary or invalid UTF-8: keep printable ASCII if it dominates
        let printable = Self::extract_printable(bytes);
        let ratio = printable.len() as f64 / bytes.len() as f64;
        if ratio >= MIN_PRINTABLE_RATIO && !printable.trim().is_empty() {
            return Ok(Extracted::new(normalize_newlines(&printable)));
        }

        Err(ExtractError::UnsupportedFormat {
            name: name.to_string(),
            reason: format!(
                "content is binary ({:.0}% printable)",
                ratio * 100.0
            ),
        })
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

impl FallbackExtractor {
    /// Extract printable ASCII from binary data
    fn extract_printable(bytes: &[u8]) -> String {
        bytes
            .iter()
            .filter(|&&b| b.is_ascii_graphic() || b.is_ascii_whitespace())
            .map(|&b| b as char)
            .collect()
    }
}
