//! Error types for the Cloud Controller client
//!
//! Requests made through the platform traits report [`GatewayError`];
//! [`ClientError`] covers building the client and logging in.

use scs_core::GatewayError;

/// Client construction and login error
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP client could not be built
    #[error("couldn't build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    /// Platform rejected or failed a request
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ClientError {
    /// Whether the credentials were refused
    #[inline]
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::Auth(_)))
    }
}

/// Request failed before a response arrived
pub(crate) fn transport(url: &str, error: &reqwest::Error) -> GatewayError {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    GatewayError::Transport {
        url: url.to_string(),
        message,
    }
}

/// Response body could not be read or decoded
pub(crate) fn decode(url: &str, error: impl std::fmt::Display) -> GatewayError {
    GatewayError::Decode {
        url: url.to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_recognised() {
        let err = ClientError::from(GatewayError::Auth("bad credentials".to_string()));
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "authentication failed: bad credentials");
    }

    #[test]
    fn decode_error_names_url() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = decode("https://api/v2/info", source);
        assert!(err.to_string().starts_with("could not decode response from https://api/v2/info"));
    }
}
