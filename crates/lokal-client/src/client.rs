//! Agent client - versioned request primitive
//!
//! Every call to the agent goes through [`AgentClient::request`], which
//! attaches credentials, enforces the server version policy and maps HTTP
//! failures before the body is handed to the caller.

use crate::banner::{StartupBanner, TerminalBanner};
use crate::config::{BasicAuth, ClientConfig, API_TOKEN_HEADER};
use crate::error::{LokalError, Result};
use crate::tunnel::Tunnel;
use crate::version::{check_server_version, SERVER_VERSION_HEADER};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Client for the local Lokal agent REST API
///
/// Holds the base URL, credentials and a pooled HTTP session. One client can
/// back any number of [`Tunnel`] handles; each handle borrows it. The client
/// is `Send + Sync`, but it does not coordinate requests issued from
/// different threads: two tunnels created concurrently for the same address
/// are resolved by the agent alone.
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
    basic_auth: Option<BasicAuth>,
    api_token: Option<String>,
    banner: Arc<dyn StartupBanner>,
}

impl AgentClient {
    /// Create a client for the default loopback endpoint
    pub fn new() -> Result<Self> {
        Self::from_config(ClientConfig::default())
    }

    /// Create a client from configuration
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            basic_auth: config.basic_auth,
            api_token: config.api_token,
            banner: Arc::new(TerminalBanner::new()),
        })
    }

    /// Point the client at a different agent endpoint
    pub fn set_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&url.into());
        self
    }

    /// Send HTTP Basic credentials with every request
    pub fn set_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(BasicAuth::new(username, password));
        self
    }

    /// Send an API token with every request
    pub fn set_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Replace the startup banner shown by tunnels that enable it
    pub fn with_banner(mut self, banner: impl StartupBanner + 'static) -> Self {
        self.banner = Arc::new(banner);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn banner(&self) -> Arc<dyn StartupBanner> {
        Arc::clone(&self.banner)
    }

    /// Start configuring a new tunnel backed by this client
    pub fn new_tunnel(&self) -> Tunnel<'_> {
        Tunnel::new(self)
    }

    /// Issue a request and decode the response body
    ///
    /// Fails with [`LokalError::IncompatibleServer`] when the response lacks
    /// the version header or advertises an unsupported version, whatever the
    /// status. Error statuses then fail with [`LokalError::Http`].
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Agent request: {} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(token) = &self.api_token {
            request = request.header(API_TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        let advertised = response
            .headers()
            .get(SERVER_VERSION_HEADER)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        let version = check_server_version(advertised.as_deref())?;
        debug!("Agent responded {} (server version {})", status, version);

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(LokalError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| LokalError::InvalidResponse(e.to_string()))
    }

    /// `GET` a path on the agent
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// `POST` a JSON body to a path on the agent
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }
}

impl fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentClient")
            .field("base_url", &self.base_url)
            .field("basic_auth", &self.basic_auth.as_ref().map(|a| &a.username))
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Equivalent to [`AgentClient::new`]
pub fn new_default() -> Result<AgentClient> {
    AgentClient::new()
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
