//! Error types produced by the OSRM client.

use routeweave_core::MatrixError;
use thiserror::Error;

/// Errors produced while planning, fetching or decoding OSRM queries.
///
/// [`OsrmError::is_input_error`] tells callers whether the failure was caused
/// by their input (and can be corrected) or by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum OsrmError {
    /// An option value was rejected before any request was made.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the rejected value.
        message: String,
    },
    /// No points were supplied.
    #[error("cannot query the routing service for empty points")]
    EmptyInput,
    /// The backend rejected the request as malformed.
    #[error("error in input data when getting maps: {message}")]
    BackendUserInput {
        /// Body or aggregated messages reported by the backend.
        message: String,
    },
    /// The backend or the transport failed.
    #[error("error response from routing service: {message}")]
    BackendService {
        /// Body or aggregated messages describing the failure.
        message: String,
    },
    /// The backend answered but did not report success.
    #[error("expected \"Ok\" response code; got {code:?} ({message:?})")]
    BackendStatus {
        /// Status code reported in the response body.
        code: String,
        /// Message reported alongside the status code.
        message: String,
    },
    /// A route response contained no route.
    #[error("routing service returned no route")]
    MissingRoute,
    /// The response could not be decoded.
    #[error("failed to decode routing response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
    /// The request was cancelled before it completed.
    #[error("routing request was cancelled")]
    Cancelled,
}

impl OsrmError {
    /// Whether the failure stems from the caller's input.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::EmptyInput | Self::BackendUserInput { .. }
        )
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn decode(error: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: error.to_string(),
        }
    }

    /// Collapse the failures of a concurrent batch into one error.
    ///
    /// A single failure is returned unchanged. Several failures are joined
    /// into one message, classified as user input if any of them was, else
    /// as cancelled if any task was cancelled, else as a service failure.
    pub(crate) fn aggregate(mut errors: Vec<Self>) -> Option<Self> {
        if errors.len() <= 1 {
            return errors.pop();
        }
        let message = errors
            .iter()
            .map(Self::detail)
            .collect::<Vec<_>>()
            .join("\n");
        if errors.iter().any(Self::is_input_error) {
            Some(Self::BackendUserInput { message })
        } else if errors.iter().any(|err| matches!(err, Self::Cancelled)) {
            Some(Self::Cancelled)
        } else {
            Some(Self::BackendService { message })
        }
    }

    /// Message without the variant's prefix, for joining under one prefix.
    fn detail(&self) -> String {
        match self {
            Self::BackendUserInput { message } | Self::BackendService { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<TransportError> for OsrmError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Http {
                status: 400, body, ..
            } => Self::BackendUserInput { message: body },
            other => Self::BackendService {
                message: other.to_string(),
            },
        }
    }
}

impl From<OsrmError> for MatrixError {
    fn from(error: OsrmError) -> Self {
        match error {
            OsrmError::EmptyInput => Self::EmptyInput,
            other if other.is_input_error() => Self::InvalidInput {
                message: other.to_string(),
            },
            other => Self::Service {
                message: other.to_string(),
            },
        }
    }
}

/// Transport-level errors encountered while issuing HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned a non-success HTTP status.
    #[error("request to {url} failed with status {status}: {body}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, usually the backend's own error report.
        body: String,
    },
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Fully qualified request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The request failed before a response was received.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// Error reported by the HTTP client.
        message: String,
    },
}

/// Error type for client construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The configured base URL is not a valid absolute URL.
    #[error("invalid base URL {url:?}: {source}")]
    BaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The client configuration failed validation.
    #[error(transparent)]
    Config(#[from] OsrmError),
}
