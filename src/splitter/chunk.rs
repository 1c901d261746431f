use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value metadata carried from a source document onto its chunks
pub type Metadata = BTreeMap<String, String>;

/// A piece of extracted text waiting to be split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Plain text content
    pub text: String,
    /// Metadata copied onto every chunk (e.g. `source`)
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A bounded slice of a source text, ready for indexing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The text of this chunk, a contiguous slice of the source
    pub content: String,
    /// Byte offset of `content` in the source text
    pub start_offset: usize,
    /// Metadata inherited from the source document
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, start_offset: usize) -> Self {
        Self {
            content: content.into(),
            start_offset,
            metadata: Metadata::new(),
        }
    }

    /// Byte offset one past the last byte of this chunk in the source text
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.content.len()
    }
}
