mod error;
mod fetch;

#[cfg(test)]
mod tests;

pub use error::{FetchError, SourceError};
pub use fetch::{PageFetcher, DEFAULT_FETCH_ENDPOINT, DEFAULT_FETCH_TIMEOUT};

use crate::security::PathSanitizer;
use std::path::Path;

/// Name given to text fetched from a URL; it routes through the text extractor
pub const FETCHED_PAGE_NAME: &str = "httpdata.md";

/// Largest upload accepted, in bytes
pub const MAX_UPLOAD_SIZE: u64 = 200 * 1024 * 1024;

/// Where the text to process came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// An uploaded file with a sanitized name
    Upload { name: String, bytes: Vec<u8> },
    /// A web page already rendered to text
    Fetched { url: String, text: String },
}

impl Source {
    /// Wrap uploaded bytes, sanitizing the client-supplied name
    pub fn upload(raw_name: &str, bytes: Vec<u8>) -> Result<Self, SourceError> {
        let name = PathSanitizer::sanitize(raw_name)?;

        if bytes.len() as u64 > MAX_UPLOAD_SIZE {
            return Err(SourceError::FileTooLarge {
                size: bytes.len() as u64,
                max: MAX_UPLOAD_SIZE,
            });
        }

        Ok(Self::Upload { name, bytes })
    }

    /// Read a local file as an upload
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let display = path.display().to_string();

        let size = std::fs::metadata(path)
            .map_err(|source| SourceError::Read {
                path: display.clone(),
                source,
            })?
            .len();
        if size > MAX_UPLOAD_SIZE {
            return Err(SourceError::FileTooLarge {
                size,
                max: MAX_UPLOAD_SIZE,
            });
        }

        let bytes = std::fs::read(path).map_err(|source| SourceError::Read {
            path: display.clone(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(display);
        Self::upload(&name, bytes)
    }

    pub fn fetched(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Fetched {
            url: url.into(),
            text: text.into(),
        }
    }

    /// Name used to pick an extractor and label chunks
    pub fn name(&self) -> &str {
        match self {
            Source::Upload { name, .. } => name.as_str(),
            Source::Fetched { .. } => FETCHED_PAGE_NAME,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Source::Upload { bytes, .. } => bytes.as_slice(),
            Source::Fetched { text, .. } => text.as_bytes(),
        }
    }

    /// Origin URL of fetched pages
    pub fn url(&self) -> Option<&str> {
        match self {
            Source::Upload { .. } => None,
            Source::Fetched { url, .. } => Some(url.as_str()),
        }
    }
}
