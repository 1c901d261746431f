mod epub;
mod evernote;
mod fallback;
mod html;
mod json;
mod mime;
mod notebook;
mod office;
mod pdf;
mod registry;
mod result;
mod sheet;
mod text;
mod xml;


pub use epub::EpubExtractor;
pub use evernote::EnexExtractor;
pub use fallback::FallbackExtractor;
pub use html::HtmlExtractor;
pub use json::{ChatGptExtractor, MessagesJsonExtractor, TextArrayExtractor};
pub use mime::{EmailExtractor, MhtmlExtractor};
pub use notebook::NotebookExtractor;
pub use office::{DocxExtractor, OdtExtractor, PptxExtractor};
pub use pdf::PdfExtractor;
pub use registry::{ExtractorRegistry, SOURCE_KEY};
pub use result::Extracted;
pub use sheet::{CsvExtractor, SpreadsheetExtractor};
pub use text::TextExtractor;
pub use xml::XmlExtractor;

use thiserror::Error;

/// Why a document could not be turned into text
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported format for {name}: {reason}")]
    UnsupportedFormat { name: String, reason: String },

    #[error("Failed to read {format} content: {reason}")]
    Malformed { format: &'static str, reason: String },
}

impl ExtractError {
    pub(crate) fn malformed(format: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            format,
            reason: reason.to_string(),
        }
    }
}

/// Core trait that all format extractors implement
pub trait Extractor: Send + Sync {
    /// Turn raw bytes into plain text
    ///
    /// # Arguments
    /// * `name` - File name of the upload (e.g., "report.pdf")
    /// * `bytes` - Raw file contents
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError>;

    /// Short identifier reported alongside extracted text
    fn name(&self) -> &'static str;
}
