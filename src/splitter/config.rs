use super::length::{CharCount, LengthFunction};
use super::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATORS};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Invalid splitting parameters, rejected before any work is done
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})")]
    OverlapTooLarge {
        chunk_size: usize,
        chunk_overlap: usize,
    },

    #[error("at least one separator is required")]
    NoSeparators,

    #[error("chunk_size {chunk_size} is below the minimum of {minimum}")]
    ChunkSizeBelowMinimum { chunk_size: usize, minimum: usize },
}

/// Immutable parameters for one split call
#[derive(Clone)]
pub struct SplitConfig {
    separators: Vec<String>,
    chunk_size: usize,
    chunk_overlap: usize,
    keep_separator: bool,
    add_start_index: bool,
    length_function: Arc<dyn LengthFunction>,
}

impl SplitConfig {
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder::new()
    }

    /// Check `0 < chunk_size`, `chunk_overlap < chunk_size` and a non-empty
    /// separator list
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        if self.separators.is_empty() {
            return Err(ConfigError::NoSeparators);
        }
        Ok(())
    }

    pub fn separators(&self) -> &[String] {
        &self.separators
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn keep_separator(&self) -> bool {
        self.keep_separator
    }

    pub fn add_start_index(&self) -> bool {
        self.add_start_index
    }

    /// Measure `text` with the configured length function
    pub fn measure(&self, text: &str) -> usize {
        self.length_function.measure(text)
    }

    /// Whether lengths of adjacent pieces can simply be summed
    pub fn additive_length(&self) -> bool {
        self.length_function.is_additive()
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfigBuilder::new().build()
    }
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("separators", &self.separators)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("keep_separator", &self.keep_separator)
            .field("add_start_index", &self.add_start_index)
            .field("length_function", &self.length_function.name())
            .finish()
    }
}

/// Builder for [`SplitConfig`]; validation happens when the config is used
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SplitConfig {
                separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
                chunk_size: DEFAULT_CHUNK_SIZE,
                chunk_overlap: DEFAULT_CHUNK_OVERLAP,
                keep_separator: true,
                add_start_index: false,
                length_function: Arc::new(CharCount),
            },
        }
    }

    /// Replace the separator list (coarsest first)
    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn keep_separator(mut self, keep: bool) -> Self {
        self.config.keep_separator = keep;
        self
    }

    /// Record each chunk's start offset in its metadata
    pub fn add_start_index(mut self, enabled: bool) -> Self {
        self.config.add_start_index = enabled;
        self
    }

    pub fn length_function(mut self, length_function: impl LengthFunction + 'static) -> Self {
        self.config.length_function = Arc::new(length_function);
        self
    }

    pub fn build(self) -> SplitConfig {
        self.config
    }
}

impl Default for SplitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use crate::splitter::EstimatedTokens;

    #[test]
    fn test_default_config() {
        let config = SplitConfig::default();
        assert_eq!(config.separators(), &["\n\n", "\n", " ", ""]);
        assert_eq!(config.chunk_size(), 4096);
        assert_eq!(config.chunk_overlap(), 200);
        assert!(config.keep_separator());
        assert!(!config.add_start_index());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_equal_to_size_rejected() {
        let config = SplitConfig::builder()
            .chunk_size(100)
            .chunk_overlap(100)
            .build();
        assert_eq!(
            config.validate(),
            Err(ConfigError::OverlapTooLarge {
                chunk_size: 100,
                chunk_overlap: 100
            })
        );
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = SplitConfig::builder().chunk_size(0).chunk_overlap(0).build();
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
    }

    #[test]
    fn test_empty_separators_rejected() {
        let config = SplitConfig::builder()
            .separators(Vec::<String>::new())
            .build();
        assert_eq!(config.validate(), Err(ConfigError::NoSeparators));
    }

    #[test]
    fn test_debug_names_length_function() {
        let config = SplitConfig::builder()
            .length_function(EstimatedTokens)
            .build();
        let debug = format!("{:?}", config);
        assert!(debug.contains("estimated-tokens"));
        assert_eq!(config.measure("abcdefgh"), 2);
    }
}
