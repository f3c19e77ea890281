//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the agent listens unless told otherwise
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6174";

/// Identifies this library to the agent
pub const DEFAULT_USER_AGENT: &str = "Lokal Rust - github.com/lokal-so/lokal-rust";

/// Header carrying the API token
pub const API_TOKEN_HEADER: &str = "X-Auth-Token";

/// HTTP Basic credentials for the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse `username:password`; the password may itself contain `:`
    pub fn parse(credentials: &str) -> Option<Self> {
        let (username, password) = credentials.split_once(':')?;
        Some(Self::new(username, password))
    }
}

/// Agent client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub basic_auth: Option<BasicAuth>,
    pub api_token: Option<String>,
    pub user_agent: String,
    /// Per-request timeout; none means the transport default
    #[serde(with = "duration_secs_opt")]
    pub timeout: Option<Duration>,
}

/// Helper module for serializing an optional Duration as seconds
mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            basic_auth: None,
            api_token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.basic_auth = Some(BasicAuth::new(username, password));
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:6174");
        assert!(config.basic_auth.is_none());
        assert!(config.api_token.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .base_url("http://10.0.0.2:6174")
            .basic_auth("admin", "secret")
            .api_token("tok")
            .timeout(Duration::from_secs(10))
            .build();

        assert_eq!(config.base_url, "http://10.0.0.2:6174");
        assert_eq!(config.basic_auth, Some(BasicAuth::new("admin", "secret")));
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_basic_auth_parse() {
        assert_eq!(
            BasicAuth::parse("user:pa:ss"),
            Some(BasicAuth::new("user", "pa:ss"))
        );
        assert_eq!(BasicAuth::parse("no-colon"), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_token": "abc", "timeout": 5}"#).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
