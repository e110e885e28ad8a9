use thiserror::Error;

/// Coarse classification of a [`GeodocError`], used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    Unauthorized,
    Usage,
    StorageFailure,
}

#[derive(Error, Debug)]
pub enum GeodocError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document is not valid: {0}")]
    Invalid(String),

    #[error("Document {hash} is not owned by {owner}")]
    Unauthorized { hash: String, owner: String },

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Unknown document format: {0}")]
    UnknownFormat(String),

    #[error("Schema unavailable at {location}: {reason}")]
    SchemaUnavailable { location: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GeodocError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeodocError::NotFound(_) => ErrorKind::NotFound,
            GeodocError::Invalid(_) => ErrorKind::Invalid,
            GeodocError::Unauthorized { .. } => ErrorKind::Unauthorized,
            GeodocError::Usage(_) | GeodocError::UnknownFormat(_) => ErrorKind::Usage,
            GeodocError::SchemaUnavailable { .. }
            | GeodocError::Storage(_)
            | GeodocError::Config(_)
            | GeodocError::Io(_)
            | GeodocError::Database(_)
            | GeodocError::Serialization(_) => ErrorKind::StorageFailure,
        }
    }

    /// HTTP status class a web front end reports for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Invalid => 415,
            ErrorKind::Unauthorized => 403,
            ErrorKind::Usage | ErrorKind::StorageFailure => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeodocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = GeodocError::NotFound("geodoc.wmc".into());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn invalid_maps_to_unsupported_media_type() {
        let err = GeodocError::Invalid("missing element".into());
        assert_eq!(err.status_code(), 415);
    }

    #[test]
    fn schema_fetch_failure_is_server_side() {
        let err = GeodocError::SchemaUnavailable {
            location: "http://example.org/a.xsd".into(),
            reason: "timeout".into(),
        };
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: GeodocError = io.into();
        assert!(matches!(err, GeodocError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
    }
}
