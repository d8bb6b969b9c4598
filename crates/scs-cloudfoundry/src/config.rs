//! Connection settings for a Cloud Controller

use std::time::Duration;

/// Where and how to reach the Cloud Controller
#[derive(Clone, PartialEq, Eq)]
pub struct CloudFoundryConfig {
    /// API endpoint, e.g. `https://api.sys.example.com`
    pub api_address: String,
    pub username: String,
    pub password: String,
    /// Accept any TLS certificate
    pub skip_ssl_validation: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// OAuth client used for the password grant
    pub client_id: String,
}

impl CloudFoundryConfig {
    /// Create a config with defaults for everything but the credentials
    #[must_use]
    pub fn new(api_address: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            api_address: api_address.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            skip_ssl_validation: false,
            timeout: Duration::from_secs(30),
            client_id: "cf".to_string(),
        }
    }

    /// Builder: skip TLS verification
    #[inline]
    #[must_use]
    pub fn with_skip_ssl_validation(mut self, skip: bool) -> Self {
        self.skip_ssl_validation = skip;
        self
    }

    /// Builder: set request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path or a `next_url`
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.api_address, path.trim_start_matches('/'))
        }
    }
}

impl std::fmt::Debug for CloudFoundryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudFoundryConfig")
            .field("api_address", &self.api_address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("skip_ssl_validation", &self.skip_ssl_validation)
            .field("timeout", &self.timeout)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = CloudFoundryConfig::new("https://api.example.com/", "admin", "secret");
        assert_eq!(config.api_address, "https://api.example.com");
        assert_eq!(config.url("/v2/info"), "https://api.example.com/v2/info");
        assert_eq!(config.url("v2/info"), "https://api.example.com/v2/info");
    }

    #[test]
    fn absolute_urls_pass_through() {
        let config = CloudFoundryConfig::new("https://api.example.com", "admin", "secret");
        assert_eq!(config.url("https://uaa.example.com/oauth/token"), "https://uaa.example.com/oauth/token");
    }

    #[test]
    fn debug_hides_password() {
        let config = CloudFoundryConfig::new("https://api", "admin", "hunter2").with_skip_ssl_validation(true);
        let text = format!("{config:?}");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("skip_ssl_validation: true"));
    }
}
