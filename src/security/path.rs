use crate::source::SourceError;

pub struct PathSanitizer;

impl PathSanitizer {
    /// Reduce an uploaded file name to a safe base name, rejecting:
    /// - Directory traversal (../)
    /// - Absolute paths (/etc/passwd, C:\Windows)
    /// - Control characters
    ///
    /// Both `/` and `\` count as separators so browser-supplied Windows paths
    /// are handled on every platform. Hidden files are allowed.
    pub fn sanitize(raw_name: &str) -> Result<String, SourceError> {
        Self::sanitize_with_options(raw_name, true)
    }

    /// Sanitize with custom options
    pub fn sanitize_with_options(raw_name: &str, allow_hidden: bool) -> Result<String, SourceError> {
        let normalized = raw_name.trim().replace('\\', "/");

        // Reject empty names
        if normalized.is_empty() {
            return Err(SourceError::InvalidName("Empty file name".to_string()));
        }

        // Reject absolute paths
        if normalized.starts_with('/') || has_drive_prefix(&normalized) {
            return Err(SourceError::InvalidName(format!(
                "Absolute path not allowed: {}",
                raw_name
            )));
        }

        let mut components = Vec::new();
        for part in normalized.split('/') {
            match part {
                // Skip current directory markers and doubled separators
                "" | "." => continue,
                // Reject parent directory traversal
                ".." => {
                    return Err(SourceError::InvalidName(format!(
                        "Parent directory traversal not allowed: {}",
                        raw_name
                    )));
                }
                part => {
                    if part.chars().any(char::is_control) {
                        return Err(SourceError::InvalidName(format!(
                            "Control characters not allowed: {:?}",
                            raw_name
                        )));
                    }
                    if !allow_hidden && part.starts_with('.') {
                        return Err(SourceError::InvalidName(format!(
                            "Hidden files not allowed: {}",
                            raw_name
                        )));
                    }
                    components.push(part);
                }
            }
        }

        // The last component is the file name
        components
            .last()
            .map(|name| name.to_string())
            .ok_or_else(|| SourceError::InvalidName(format!("No valid components: {}", raw_name)))
    }
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
