/// HTTP implementation of [`ConfigService`] using the synchronous `ureq`
/// client.
///
/// Failure mapping:
///
/// - **non-2xx**: the body's `error` field if it parses, otherwise the generic
///   fallback for the operation;
/// - **transport** (refused, DNS, timeout): the transport error text;
/// - **2xx with a body that does not match the contract**: generic fallback.
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{
    ConfigService, ErrorBody, ExplainRequest, ExplainResponse, GenerateRequest, GenerateResponse,
};
use crate::config::ServiceConfig;
use crate::error::{EXPLAIN_FAILED, GENERATE_FAILED, RemoteError};

/// HTTP client for the generation service.
#[derive(Debug)]
pub struct HttpConfigService {
    base_url: String,
    timeout: Option<Duration>,
    agent: ureq::Agent,
}

impl HttpConfigService {
    /// Build a client from the resolved `[service]` config.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::new(&config.base_url, timeout)
    }

    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            // On Windows "localhost" may resolve to ::1 first while the
            // service only binds IPv4.
            base_url: base_url
                .trim_end_matches('/')
                .replace("://localhost", "://127.0.0.1"),
            timeout,
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout; `None` waits as long as the transport allows.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether anything answers HTTP at the base URL.
    ///
    /// Any status code counts as reachable; only transport failures do not.
    pub fn is_reachable(&self) -> bool {
        let result = self
            .agent
            .get(&self.base_url)
            .timeout(Duration::from_secs(5))
            .call();
        match result {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(ureq::Error::Transport(_)) => false,
        }
    }

    fn post<B, R>(&self, endpoint: &str, body: &B, fallback: &str) -> Result<R, RemoteError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);

        match self.agent.post(&url).send_json(body) {
            Ok(resp) => resp
                .into_json::<R>()
                .map_err(|_| RemoteError::malformed(fallback)),
            Err(ureq::Error::Status(code, resp)) => {
                let message = resp.into_json::<ErrorBody>().ok().and_then(|b| b.error);
                Err(RemoteError::status(code, message, fallback))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(RemoteError::transport(transport.to_string()))
            }
        }
    }
}

impl ConfigService for HttpConfigService {
    fn generate(&self, request: &GenerateRequest) -> Result<String, RemoteError> {
        let resp: GenerateResponse = self.post("generate", request, GENERATE_FAILED)?;
        Ok(resp.json)
    }

    fn explain(&self, request: &ExplainRequest) -> Result<String, RemoteError> {
        let resp: ExplainResponse = self.post("explain", request, EXPLAIN_FAILED)?;
        Ok(resp.explanation)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
