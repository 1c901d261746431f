use crate::splitter::Metadata;

/// Plain text pulled out of a document, plus format details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Normalized text ready for splitting
    pub text: String,
    /// Format details (page counts, titles, ...) and the `source` name
    pub metadata: Metadata,
    /// Name of the extractor that produced the text
    pub extractor: &'static str,
}

impl Extracted {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
            extractor: "",
        }
    }

    /// Attach a metadata entry
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Number of characters in the extracted text
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
