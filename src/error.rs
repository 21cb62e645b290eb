//! Error taxonomy for workflow operations.
//!
//! Every operation on the [`Workflow`](crate::workflow::Workflow) returns a
//! [`WorkflowError`] on failure. The same error is also rendered into the
//! error banner, so the `Display` text of each variant is the user-visible
//! message.

use std::fmt;

/// Generic messages used when the service does not provide one.
pub const GENERATE_FAILED: &str = "Failed to generate configuration";
pub const EXPLAIN_FAILED: &str = "Failed to explain configuration";

/// Errors surfaced by workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Please describe your A/B test")]
    EmptyDescription,

    #[error("No configuration to explain")]
    NoConfiguration,

    #[error("A request is already in progress")]
    RequestInFlight,

    #[error("Nothing to copy yet")]
    NothingToCopy,

    #[error("Please upload a JSON file")]
    UnsupportedFileType { name: String },

    #[error("Failed to read file")]
    FileRead {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON file: {detail}")]
    InvalidJsonFile { name: String, detail: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Failed to copy to clipboard")]
    Clipboard(String),
}

/// Broad error categories, one per failure domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocalValidation,
    FileType,
    FileRead,
    JsonParse,
    Remote,
    Clipboard,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyDescription
            | Self::NoConfiguration
            | Self::RequestInFlight
            | Self::NothingToCopy => ErrorKind::LocalValidation,
            Self::UnsupportedFileType { .. } => ErrorKind::FileType,
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::InvalidJsonFile { .. } => ErrorKind::JsonParse,
            Self::Remote(_) => ErrorKind::Remote,
            Self::Clipboard(_) => ErrorKind::Clipboard,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote errors
// ---------------------------------------------------------------------------

/// A failed call to the generation service.
///
/// `message` is what the user sees: the service-provided `error` field when
/// there is one, otherwise whatever the transport reported or a generic
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub message: String,
    /// HTTP status for non-2xx responses, `None` for transport failures.
    pub status: Option<u16>,
}

impl RemoteError {
    /// Non-2xx response. Uses the service message if present.
    pub fn status(status: u16, service_message: Option<String>, fallback: &str) -> Self {
        let message = service_message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Self {
            message,
            status: Some(status),
        }
    }

    /// The request never produced an HTTP response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// A 2xx response whose body did not match the contract.
    pub fn malformed(fallback: &str) -> Self {
        Self {
            message: fallback.to_string(),
            status: None,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_service_message() {
        let err = RemoteError::status(500, Some("model overloaded".into()), GENERATE_FAILED);
        assert_eq!(err.to_string(), "model overloaded");
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn status_error_falls_back_when_message_missing_or_empty() {
        let err = RemoteError::status(502, None, GENERATE_FAILED);
        assert_eq!(err.message, GENERATE_FAILED);
        let err = RemoteError::status(400, Some(String::new()), EXPLAIN_FAILED);
        assert_eq!(err.message, EXPLAIN_FAILED);
    }

    #[test]
    fn whitespace_service_message_is_passed_through() {
        let err = RemoteError::status(400, Some("  ".into()), EXPLAIN_FAILED);
        assert_eq!(err.message, "  ");
    }

    #[test]
    fn banner_texts_match_variants() {
        assert_eq!(
            WorkflowError::EmptyDescription.to_string(),
            "Please describe your A/B test"
        );
        assert_eq!(
            WorkflowError::InvalidJsonFile {
                name: "x.json".into(),
                detail: "EOF while parsing".into()
            }
            .to_string(),
            "Invalid JSON file: EOF while parsing"
        );
        let remote: WorkflowError = RemoteError::transport("connection refused").into();
        assert_eq!(remote.to_string(), "connection refused");
    }

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(WorkflowError::NoConfiguration.kind(), ErrorKind::LocalValidation);
        assert_eq!(
            WorkflowError::UnsupportedFileType { name: "a.txt".into() }.kind(),
            ErrorKind::FileType
        );
        assert_eq!(
            WorkflowError::Clipboard("no xclip".into()).kind(),
            ErrorKind::Clipboard
        );
    }
}
