mod chunk;
mod config;
mod length;
mod recursive;


pub use chunk::{Chunk, Document, Metadata};
pub use config::{ConfigError, SplitConfig, SplitConfigBuilder};
pub use length::{ByteCount, CharCount, EstimatedTokens, LengthFunction};
pub use recursive::RecursiveSplitter;

/// Default maximum chunk length (in the configured length unit)
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Overlap carried between consecutive chunks
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators tried from coarsest to finest; `""` splits between characters
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Metadata key holding a chunk's start offset when `add_start_index` is set
pub const START_INDEX_KEY: &str = "start_index";

/// Split `text` into overlapping chunks according to `config`.
///
/// Fails only when the configuration itself is invalid; any text content is
/// accepted. Empty text yields no chunks.
pub fn split(text: &str, config: &SplitConfig) -> Result<Vec<Chunk>, ConfigError> {
    let splitter = RecursiveSplitter::new(config.clone())?;
    Ok(splitter.split_text(text))
}
