use thiserror::Error;

/// Remote ledger node error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NodeError {
    /// Transport-level errors (network, connection, HTTP status)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    /// Request exceeded the client timeout
    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// JSON-RPC error object returned by the node
    #[error("RPC response error: {message} (code: {code:?})")]
    RpcResponse { code: Option<i64>, message: String },

    /// The source account does not exist on the ledger
    #[error("Account not found: {account}")]
    AccountNotFound { account: String },

    /// The node simulated the transaction and reported an error
    #[error("Simulation failed: {0}")]
    Simulation(String),

    /// Response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request payload could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl NodeError {
    /// Whether this error reports a missing ledger entry
    pub fn is_not_found(&self) -> bool {
        match self {
            NodeError::AccountNotFound { .. } => true,
            NodeError::RpcResponse { message, .. } => message.to_lowercase().contains("not found"),
            _ => false,
        }
    }

    /// Get the endpoint associated with this error, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            NodeError::Transport { endpoint, .. } => Some(endpoint),
            NodeError::Timeout { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// Create from a reqwest error with context
    pub fn from_reqwest(err: reqwest::Error, endpoint: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            NodeError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms,
            }
        } else if err.is_decode() {
            NodeError::InvalidResponse(err.to_string())
        } else {
            NodeError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(NodeError::AccountNotFound {
            account: "G".into()
        }
        .is_not_found());
        assert!(NodeError::RpcResponse {
            code: Some(-32600),
            message: "Account Not Found: GABC".into()
        }
        .is_not_found());
        assert!(!NodeError::Transport {
            endpoint: "http://node".into(),
            message: "connection refused".into()
        }
        .is_not_found());
    }

    #[test]
    fn test_endpoint_extraction() {
        let err = NodeError::Timeout {
            endpoint: "http://node".into(),
            timeout_ms: 30_000,
        };
        assert_eq!(err.endpoint(), Some("http://node"));
        assert_eq!(err.to_string(), "Timeout after 30000ms (endpoint: http://node)");
        assert_eq!(NodeError::Simulation("x".into()).endpoint(), None);
    }
}
