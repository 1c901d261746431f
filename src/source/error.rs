use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("File too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Reader service returned error status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No URL given")]
    EmptyUrl,
}
