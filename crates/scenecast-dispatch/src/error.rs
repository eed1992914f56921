//! Dispatch error types.

use thiserror::Error;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Dispatch failures. Every round-trip failure names the worker.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to build worker HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("worker {endpoint} unreachable: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("worker {endpoint} timed out after {secs} seconds")]
    Timeout { endpoint: String, secs: u64 },

    #[error("worker {endpoint} returned {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("worker {endpoint} returned an invalid response: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("worker {endpoint} sent undecodable data for scene {order_index}: {source}")]
    Decode {
        endpoint: String,
        order_index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("worker {endpoint} returned scene {order_index} it was not assigned")]
    Unassigned { endpoint: String, order_index: usize },

    #[error("failed to store segment from worker {endpoint}: {source}")]
    Io {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// Endpoint of the worker whose call failed.
    pub fn endpoint(&self) -> Option<&str> {
        let endpoint = match self {
            DispatchError::Client(_) => return None,
            DispatchError::Transport { endpoint, .. }
            | DispatchError::Timeout { endpoint, .. }
            | DispatchError::Rejected { endpoint, .. }
            | DispatchError::InvalidResponse { endpoint, .. }
            | DispatchError::Decode { endpoint, .. }
            | DispatchError::Unassigned { endpoint, .. }
            | DispatchError::Io { endpoint, .. } => endpoint,
        };
        Some(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_failure_names_no_worker() {
        let source = reqwest::get("not a url").await.unwrap_err();
        let err = DispatchError::Client(source);
        assert_eq!(err.endpoint(), None);
        assert!(err.to_string().starts_with("failed to build worker HTTP client"));
    }

    #[test]
    fn test_round_trip_failures_name_the_worker() {
        let err = DispatchError::Timeout {
            endpoint: "http://worker-1:4000/process-scenes".to_string(),
            secs: 600,
        };
        assert_eq!(err.endpoint(), Some("http://worker-1:4000/process-scenes"));
    }
}
