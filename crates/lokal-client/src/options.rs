//! Per-tunnel policy options
//!
//! These are forwarded to the agent verbatim. The client does not validate
//! CIDR ranges or header rules; the agent rejects bad values.

use serde::{Deserialize, Serialize};

/// Access and header policy for a tunnel, sent nested as `options`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelOptions {
    /// Credentials in `username:password` form
    pub basic_auth: Vec<String>,
    pub cidr_allow: Vec<String>,
    pub cidr_deny: Vec<String>,
    pub request_header_add: Vec<String>,
    pub request_header_remove: Vec<String>,
    pub response_header_add: Vec<String>,
    pub response_header_remove: Vec<String>,
    pub header_key: Vec<String>,
}

impl TunnelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_basic_auth(mut self, credentials: impl Into<String>) -> Self {
        self.basic_auth.push(credentials.into());
        self
    }

    pub fn set_basic_auth(mut self, credentials: Vec<String>) -> Self {
        self.basic_auth = credentials;
        self
    }

    pub fn allow_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.cidr_allow.push(cidr.into());
        self
    }

    pub fn set_cidr_allow(mut self, cidrs: Vec<String>) -> Self {
        self.cidr_allow = cidrs;
        self
    }

    pub fn deny_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.cidr_deny.push(cidr.into());
        self
    }

    pub fn set_cidr_deny(mut self, cidrs: Vec<String>) -> Self {
        self.cidr_deny = cidrs;
        self
    }

    /// Header to inject into requests, e.g. `X-Forwarded-Proto: https`
    pub fn add_request_header(mut self, header: impl Into<String>) -> Self {
        self.request_header_add.push(header.into());
        self
    }

    pub fn set_request_header_add(mut self, headers: Vec<String>) -> Self {
        self.request_header_add = headers;
        self
    }

    pub fn remove_request_header(mut self, name: impl Into<String>) -> Self {
        self.request_header_remove.push(name.into());
        self
    }

    pub fn set_request_header_remove(mut self, names: Vec<String>) -> Self {
        self.request_header_remove = names;
        self
    }

    pub fn add_response_header(mut self, header: impl Into<String>) -> Self {
        self.response_header_add.push(header.into());
        self
    }

    pub fn set_response_header_add(mut self, headers: Vec<String>) -> Self {
        self.response_header_add = headers;
        self
    }

    pub fn remove_response_header(mut self, name: impl Into<String>) -> Self {
        self.response_header_remove.push(name.into());
        self
    }

    pub fn set_response_header_remove(mut self, names: Vec<String>) -> Self {
        self.response_header_remove = names;
        self
    }

    /// Header-based key required on incoming requests
    pub fn add_header_key(mut self, key: impl Into<String>) -> Self {
        self.header_key.push(key.into());
        self
    }

    pub fn set_header_key(mut self, keys: Vec<String>) -> Self {
        self.header_key = keys;
        self
    }
}
