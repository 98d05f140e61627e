use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by the catalog client.
///
/// The taxonomy is deliberately flat: callers branch on the kind and show
/// [`CatalogError::user_message`], the wrapped cause is only for logs.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request failed: {0}")]
    Transport(#[source] BoxError),

    #[error("empty response: {0}")]
    EmptyResponse(String),

    #[error("failed to decode response at '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub fn transport(cause: impl Into<BoxError>) -> Self {
        CatalogError::Transport(cause.into())
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            CatalogError::Transport(cause) => cause
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout),
            _ => false,
        }
    }

    /// Short message suitable for an inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::InvalidRequest(_) => "The movie service rejected the request.".to_string(),
            CatalogError::Transport(_) if self.is_timeout() => {
                "The movie service took too long to respond. Please try again.".to_string()
            }
            CatalogError::Transport(_) => {
                "Couldn't reach the movie service. Check your connection and try again."
                    .to_string()
            }
            CatalogError::EmptyResponse(_) => "No movies were returned.".to_string(),
            CatalogError::Decode { .. } => {
                "Received an unexpected response from the movie service.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_transport_failure_is_not_a_timeout() {
        let err = CatalogError::transport("connection reset");
        assert!(!err.is_timeout());
        assert!(err.user_message().contains("connection"));
    }

    #[test]
    fn decode_error_keeps_the_json_path() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = CatalogError::Decode {
            path: "results[0].id".to_string(),
            source,
        };
        assert!(err.to_string().contains("results[0].id"));
    }
}
