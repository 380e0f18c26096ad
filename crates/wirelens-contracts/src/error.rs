use std::fmt;

/// Failure taxonomy for the relay. Parse-level ambiguity in an
/// inference reply is NOT an error; it collapses into an
/// indeterminate verdict at the decision-parser layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The caller supplied no usable authorization credential.
    Unauthenticated,
    /// The request shape is unusable (missing galleries, malformed
    /// body, missing upload field).
    BadRequest(String),
    /// A referenced exemplar image is absent on disk.
    AssetUnavailable(String),
    /// The metadata service could not be reached (includes timeouts).
    UpstreamUnavailable(String),
    /// The metadata service answered with a non-success status.
    UpstreamRejected { status: u16, body: String },
    /// The inference call itself failed, distinct from a
    /// successful-but-unparseable reply.
    InferenceService(String),
    /// Staging or cleanup I/O failed.
    Storage(String),
}

impl RelayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        RelayError::BadRequest(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        RelayError::Storage(message.into())
    }

    pub fn inference(message: impl Into<String>) -> Self {
        RelayError::InferenceService(message.into())
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Unauthenticated => write!(f, "authorization credential missing"),
            RelayError::BadRequest(message) => write!(f, "bad request: {message}"),
            RelayError::AssetUnavailable(message) => {
                write!(f, "reference asset unavailable: {message}")
            }
            RelayError::UpstreamUnavailable(message) => {
                write!(f, "metadata service unreachable: {message}")
            }
            RelayError::UpstreamRejected { status, body } => {
                write!(f, "metadata service rejected request ({status}): {body}")
            }
            RelayError::InferenceService(message) => {
                write!(f, "inference service error: {message}")
            }
            RelayError::Storage(message) => write!(f, "storage error: {message}"),
        }
    }
}

impl std::error::Error for RelayError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_upstream_status_and_body() {
        let err = RelayError::UpstreamRejected {
            status: 404,
            body: "room not found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("room not found"));
    }

    #[test]
    fn variants_are_comparable_for_assertions() {
        assert_eq!(RelayError::Unauthenticated, RelayError::Unauthenticated);
        assert_ne!(
            RelayError::bad_request("a"),
            RelayError::AssetUnavailable("a".to_string())
        );
    }
}
