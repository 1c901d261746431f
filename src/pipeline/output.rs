use crate::splitter::{Chunk, Metadata};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One chunk as written to the JSON download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub content: String,
    pub metadata: Metadata,
}

impl From<&Chunk> for ChunkRecord {
    fn from(chunk: &Chunk) -> Self {
        Self {
            content: chunk.content.clone(),
            metadata: chunk.metadata.clone(),
        }
    }
}

pub fn to_records(chunks: &[Chunk]) -> Vec<ChunkRecord> {
    chunks.iter().map(ChunkRecord::from).collect()
}

/// Chunk contents separated by blank lines
pub fn to_text(records: &[ChunkRecord]) -> String {
    records
        .iter()
        .map(|record| record.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Records as a pretty-printed JSON array
pub fn to_json(records: &[ChunkRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// A named file ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub data: String,
}

impl Download {
    /// `ragclarify_<hex>.txt`
    pub fn text(data: String) -> Self {
        Self {
            file_name: format!("ragclarify_{}.txt", Uuid::new_v4().simple()),
            data,
        }
    }

    /// `ragclarify_json_<hex>.json`
    pub fn json(data: String) -> Self {
        Self {
            file_name: format!("ragclarify_json_{}.json", Uuid::new_v4().simple()),
            data,
        }
    }

    /// Write into `dir`, returning the full path
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.data)?;
        Ok(path)
    }
}
