mod output;
mod session;


pub use output::{to_json, to_records, to_text, ChunkRecord, Download};
pub use session::Session;

use crate::auth::AuthError;
use crate::config::AppConfig;
use crate::extractor::{
    ExtractError, Extracted, Extractor, ExtractorRegistry, TextExtractor, SOURCE_KEY,
};
use crate::source::{FetchError, PageFetcher, Source, SourceError};
use crate::splitter::{ConfigError, Document, RecursiveSplitter, SplitConfig, DEFAULT_CHUNK_SIZE};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

/// Smallest chunk size accepted from users
pub const MIN_CHUNK_SIZE: usize = 512;

/// Overlap used for every user-facing split
pub const FIXED_CHUNK_OVERLAP: usize = 200;

/// Name used for edited text when the session has no document name yet
pub const EDITED_TEXT_NAME: &str = "edited.txt";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// User-controlled splitting parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    chunk_size: usize,
    keep_separator: bool,
}

impl IngestOptions {
    pub fn new(chunk_size: usize, keep_separator: bool) -> Result<Self, ConfigError> {
        if chunk_size < MIN_CHUNK_SIZE {
            return Err(ConfigError::ChunkSizeBelowMinimum {
                chunk_size,
                minimum: MIN_CHUNK_SIZE,
            });
        }
        Ok(Self {
            chunk_size,
            keep_separator,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn keep_separator(&self) -> bool {
        self.keep_separator
    }

    /// Splitter settings: default separators, fixed overlap
    pub fn split_config(&self) -> SplitConfig {
        SplitConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(FIXED_CHUNK_OVERLAP)
            .keep_separator(self.keep_separator)
            .build()
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            keep_separator: true,
        }
    }
}

/// Summary of one processing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Document name the chunks are labelled with
    pub name: String,
    /// Extractor that produced the text
    pub extractor: &'static str,
    /// Characters of extracted text
    pub char_count: usize,
    pub chunk_count: usize,
    /// Hex SHA-256 of the input bytes
    pub digest: String,
}

/// Extract, split and record documents in a session
pub struct IngestPipeline {
    registry: ExtractorRegistry,
    fetcher: PageFetcher,
}

impl IngestPipeline {
    pub fn new(registry: ExtractorRegistry, fetcher: PageFetcher) -> Self {
        Self { registry, fetcher }
    }

    /// Pipeline with every default extractor and the configured reader service
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let fetcher = PageFetcher::with_timeout(&config.fetch_endpoint, config.fetch_timeout)?;
        Ok(Self::new(ExtractorRegistry::with_defaults(), fetcher))
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Retrieve a web page as a source, for authenticated sessions only
    pub fn fetch(&self, session: &Session, url: &str) -> Result<Source, PipelineError> {
        session.require_uid()?;
        let text = self.fetcher.fetch(url)?;
        Ok(Source::fetched(url.trim(), text))
    }

    /// Extract text from `source`, split it, and make the result the
    /// session's latest content
    pub fn process(
        &self,
        session: &mut Session,
        source: Source,
        options: &IngestOptions,
    ) -> Result<IngestReport, PipelineError> {
        session.require_uid()?;
        let splitter = RecursiveSplitter::new(options.split_config())?;

        let name = source.name().to_string();
        let extracted = self.registry.extract(&name, source.bytes())?;
        if let Some(url) = source.url() {
            debug!(url, "Processing fetched page");
        }

        Ok(self.split_into(session, &splitter, name, digest(source.bytes()), extracted))
    }

    /// Re-split edited text as plain text under the session's current name
    pub fn reprocess(
        &self,
        session: &mut Session,
        edited_text: &str,
        options: &IngestOptions,
    ) -> Result<IngestReport, PipelineError> {
        session.require_uid()?;
        let splitter = RecursiveSplitter::new(options.split_config())?;

        let name = session
            .latest_content_name()
            .unwrap_or(EDITED_TEXT_NAME)
            .to_string();
        let mut extracted = TextExtractor.extract(&name, edited_text.as_bytes())?;
        extracted.extractor = TextExtractor.name();
        extracted
            .metadata
            .insert(SOURCE_KEY.to_string(), name.clone());

        Ok(self.split_into(
            session,
            &splitter,
            name,
            digest(edited_text.as_bytes()),
            extracted,
        ))
    }

    fn split_into(
        &self,
        session: &mut Session,
        splitter: &RecursiveSplitter,
        name: String,
        digest: String,
        extracted: Extracted,
    ) -> IngestReport {
        let char_count = extracted.char_count();
        let extractor = extracted.extractor;
        let document = Document::with_metadata(extracted.text, extracted.metadata);
        let chunks = splitter.split_documents(std::slice::from_ref(&document));

        info!(
            name = %name,
            extractor,
            char_count,
            chunks = chunks.len(),
            chunk_size = splitter.config().chunk_size(),
            keep_separator = splitter.config().keep_separator(),
            "Processed document"
        );

        let report = IngestReport {
            name: name.clone(),
            extractor,
            char_count,
            chunk_count: chunks.len(),
            digest: digest.clone(),
        };
        session.store(name, digest, to_records(&chunks));
        report
    }
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
