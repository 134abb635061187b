//! Hue adapter error types.

use randomizer_domain::error::{GatewayError, ValidationError};

/// Errors specific to the Hue adapter.
#[derive(Debug, thiserror::Error)]
pub enum HueError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request failed before a response arrived, or the body was unreadable.
    #[error("bridge request failed")]
    Request(#[from] reqwest::Error),

    /// The bridge answered with a non-success status.
    #[error("bridge answered with HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// The bridge listed errors in the response envelope.
    #[error("bridge reported errors: {0}")]
    Api(String),

    /// The response did not contain the requested resource.
    #[error("{kind} {id} not found")]
    Missing { kind: &'static str, id: String },

    /// A resource id in the response is not a UUID.
    #[error("bridge returned an invalid resource id '{0}'")]
    InvalidId(String),

    /// A resource in the response violates a domain invariant.
    #[error("bridge returned an invalid resource")]
    Invalid(#[from] ValidationError),

    /// The application key cannot be sent as a header.
    #[error("API key is not a valid header value")]
    InvalidApiKey,

    /// The request limiter was closed.
    #[error("connection limiter closed")]
    PoolClosed,
}

impl HueError {
    /// Convert into a [`GatewayError`] for propagation across port boundaries.
    pub fn into_domain(self) -> GatewayError {
        match self {
            Self::Status(status) => GatewayError::Status {
                status: status.as_u16(),
            },
            Self::Api(message) => GatewayError::Rejected(message),
            Self::Missing { kind, id } => GatewayError::NotFound { kind, id },
            Self::Request(err) if err.is_decode() => GatewayError::Decode(Box::new(err)),
            Self::InvalidId(_) | Self::Invalid(_) => GatewayError::Decode(Box::new(self)),
            other => GatewayError::Transport(Box::new(other)),
        }
    }
}

impl From<HueError> for GatewayError {
    fn from(err: HueError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_status_to_domain_status() {
        let err: GatewayError = HueError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE).into();
        assert!(matches!(err, GatewayError::Status { status: 503 }));
    }

    #[test]
    fn should_convert_api_errors_to_rejection() {
        let err: GatewayError = HueError::Api("device unreachable".to_string()).into();
        assert_eq!(err.to_string(), "bridge rejected the request: device unreachable");
    }

    #[test]
    fn should_convert_missing_resource_to_not_found() {
        let err: GatewayError = HueError::Missing {
            kind: "light",
            id: "abc".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::NotFound { kind: "light", .. }));
    }

    #[test]
    fn should_convert_invalid_id_to_decode_error() {
        let err: GatewayError = HueError::InvalidId("nope".to_string()).into();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn should_convert_pool_closed_to_transport_error() {
        let err: GatewayError = HueError::PoolClosed.into();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
