use super::text::tidy;
use super::{ExtractError, Extracted, Extractor};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Upper bound on a single pdf-extract run; some fonts make it spin
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// PDF documents
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let raw = match extract_with_timeout(bytes) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                debug!("pdf-extract returned no text, reading pages with lopdf");
                extract_pages(bytes)?
            }
            Err(reason) => {
                warn!(%reason, "pdf-extract failed, reading pages with lopdf");
                extract_pages(bytes)?
            }
        };

        let mut extracted = Extracted::new(tidy(&cleanup(&raw)));
        if let Ok(document) = lopdf::Document::load_mem(bytes) {
            extracted = extracted.with("pages", document.get_pages().len());
        }
        Ok(extracted)
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Run pdf-extract on its own thread so a hang or panic cannot take the
/// caller with it
fn extract_with_timeout(bytes: &[u8]) -> Result<String, String> {
    let data = bytes.to_vec();
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let result = pdf_extract::extract_text_from_mem(&data).map_err(|e| e.to_string());
        let _ = tx.send(result);
    });

    match rx.recv_timeout(EXTRACT_TIMEOUT) {
        Ok(result) => {
            let _ = handle.join();
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            error!(
                timeout_secs = EXTRACT_TIMEOUT.as_secs(),
                "PDF extraction timed out"
            );
            Err("timed out".to_string())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            error!("PDF extraction thread crashed");
            Err("extraction thread crashed".to_string())
        }
    }
}

/// Page-by-page text through lopdf
fn extract_pages(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| ExtractError::malformed("pdf", format!("failed to load PDF: {}", e)))?;

    let mut text = String::new();
    for page in document.get_pages().keys() {
        match document.extract_text(&[*page]) {
            Ok(page_text) => {
                if !text.is_empty() {
                    text.push_str("\n\n");
                }
                text.push_str(&page_text);
            }
            Err(e) => debug!(page, error = %e, "Could not read page text"),
        }
    }

    if text.trim().is_empty() {
        return Err(ExtractError::malformed(
            "pdf",
            "no extractable text; the PDF may be image-based or encrypted",
        ));
    }
    Ok(text)
}

/// Undo typographic ligatures and stray control characters
fn cleanup(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace('\u{00A0}', " ")
        .replace('\u{000C}', "\n\n")
}
