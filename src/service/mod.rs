/// Client side of the configuration generation service.
///
/// The service is remote and opaque: it turns a natural-language description
/// (plus an optional seed configuration) into JSON, and turns JSON into a
/// natural-language explanation. Only its request/response contract lives
/// here:
///
/// - `POST {base}/generate` — `{description, existingJson}` → `{json}`
/// - `POST {base}/explain`  — `{json}` → `{explanation}`
///
/// Error responses carry `{error}`. The workflow talks to the service through
/// the [`ConfigService`] trait so it can be exercised without a network.
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

pub mod http;

pub use http::HttpConfigService;

/// Request body for `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub description: String,
    /// Seed configuration; serialized as `null` when absent.
    #[serde(rename = "existingJson")]
    pub existing_json: Option<String>,
}

impl GenerateRequest {
    /// Build a request from raw form fields.
    ///
    /// Both fields are trimmed; a seed that is empty after trimming becomes
    /// `None`.
    pub fn new(description: &str, seed: Option<&str>) -> Self {
        let existing_json = seed
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            description: description.trim().to_string(),
            existing_json,
        }
    }
}

/// Request body for `POST /explain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub json: String,
}

/// Successful body of `POST /generate`.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    pub json: String,
}

/// Successful body of `POST /explain`.
#[derive(Debug, Deserialize)]
pub(crate) struct ExplainResponse {
    pub explanation: String,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

/// The remote generation/explanation service.
///
/// Implementations must be shareable across threads: the interactive shell
/// runs each request on a worker thread.
pub trait ConfigService: Send + Sync {
    /// Generate a configuration; returns the JSON text exactly as received.
    fn generate(&self, request: &GenerateRequest) -> Result<String, RemoteError>;

    /// Explain a configuration in natural language.
    fn explain(&self, request: &ExplainRequest) -> Result<String, RemoteError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
