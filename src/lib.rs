// Public API exports
pub mod auth;
pub mod config;
pub mod extractor;
pub mod pipeline;
pub mod security;
pub mod source;
pub mod splitter;

// Re-export main types for convenience
pub use auth::{AuthError, TokenVerifier};
pub use config::{load_dotenv, AppConfig};
pub use security::PathSanitizer;

pub use extractor::{ExtractError, Extracted, Extractor, ExtractorRegistry};

pub use source::{FetchError, PageFetcher, Source, SourceError};

pub use splitter::{
    split, Chunk, ConfigError, Document, RecursiveSplitter, SplitConfig, DEFAULT_CHUNK_OVERLAP,
    DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATORS,
};

pub use pipeline::{
    ChunkRecord, Download, IngestOptions, IngestPipeline, IngestReport, PipelineError, Session,
};
