use super::output::{to_json, to_text, ChunkRecord, Download};
use crate::auth::{AuthError, TokenVerifier};
use chrono::{DateTime, Utc};
use tracing::info;

/// Per-user state carried between processing requests
#[derive(Debug, Default, Clone)]
pub struct Session {
    uid: Option<String>,
    latest_content: Option<String>,
    latest_content_name: Option<String>,
    latest_records: Option<Vec<ChunkRecord>>,
    source_digest: Option<String>,
    processed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify `token` unless the session is already authenticated, and
    /// return the user id
    pub fn authenticate(
        &mut self,
        token: Option<&str>,
        verifier: &TokenVerifier,
    ) -> Result<&str, AuthError> {
        if self.uid.is_none() {
            let token = token.ok_or(AuthError::MissingToken)?;
            let uid = verifier.verify(token)?;
            info!(uid = %uid, "Session authenticated");
            self.uid = Some(uid);
        }
        self.require_uid()
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn require_uid(&self) -> Result<&str, AuthError> {
        self.uid.as_deref().ok_or(AuthError::MissingToken)
    }

    /// Name edited text is labelled with until a document is processed
    pub fn set_content_name(&mut self, name: impl Into<String>) {
        self.latest_content_name = Some(name.into());
    }

    /// Replace the latest results
    pub(crate) fn store(&mut self, name: String, digest: String, records: Vec<ChunkRecord>) {
        self.latest_content = Some(to_text(&records));
        self.latest_content_name = Some(name);
        self.latest_records = Some(records);
        self.source_digest = Some(digest);
        self.processed_at = Some(Utc::now());
    }

    /// Chunk contents of the latest run joined by blank lines
    pub fn latest_content(&self) -> Option<&str> {
        self.latest_content.as_deref()
    }

    /// Name of the document behind the latest run
    pub fn latest_content_name(&self) -> Option<&str> {
        self.latest_content_name.as_deref()
    }

    pub fn latest_records(&self) -> Option<&[ChunkRecord]> {
        self.latest_records.as_deref()
    }

    /// Hex SHA-256 of the latest processed input
    pub fn source_digest(&self) -> Option<&str> {
        self.source_digest.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn text_download(&self) -> Option<Download> {
        self.latest_content
            .as_ref()
            .map(|content| Download::text(content.clone()))
    }

    pub fn json_download(&self) -> Result<Option<Download>, serde_json::Error> {
        match &self.latest_records {
            Some(records) => Ok(Some(Download::json(to_json(records)?))),
            None => Ok(None),
        }
    }
}
