//! Wire types for the agent REST API

use crate::options::TunnelOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path for starting a tunnel
pub const TUNNEL_START_PATH: &str = "/api/tunnel/start";

/// Path prefix for tunnel info lookups, followed by the tunnel id
pub const TUNNEL_INFO_PATH: &str = "/api/tunnel/info";

/// Kind of traffic a tunnel carries
///
/// Only HTTP tunnels get their public address synchronously. For every other
/// kind the agent picks a port after the tunnel is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TunnelType {
    #[default]
    Http,
    Tcp,
    Udp,
}

impl TunnelType {
    pub fn is_http(&self) -> bool {
        matches!(self, TunnelType::Http)
    }
}

impl fmt::Display for TunnelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelType::Http => write!(f, "HTTP"),
            TunnelType::Tcp => write!(f, "TCP"),
            TunnelType::Udp => write!(f, "UDP"),
        }
    }
}

impl FromStr for TunnelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(TunnelType::Http),
            "tcp" => Ok(TunnelType::Tcp),
            "udp" => Ok(TunnelType::Udp),
            other => Err(format!("Unknown tunnel type: {}", other)),
        }
    }
}

/// Tunnel fields exactly as submitted to `/api/tunnel/start`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelRecord {
    /// Assigned by the agent; empty until the tunnel is created
    pub id: String,
    pub name: String,
    pub tunnel_type: TunnelType,
    /// Local service being exposed, e.g. `127.0.0.1:3000`
    pub local_address: String,
    pub server_id: String,
    pub address_tunnel: String,
    pub address_tunnel_port: u16,
    /// `host` or `host:port`; a `:` means the port is known
    pub address_public: String,
    /// LAN name without the `.local` suffix
    pub address_mdns: String,
    pub inspect: bool,
    pub options: TunnelOptions,
    pub ignore_duplicate: bool,
    pub startup_banner: bool,
}

/// Tunnel description returned in the `data` list of an agent response
///
/// The agent may leave out or null any field; absent values read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub server_id: Option<String>,
    pub address_tunnel: Option<String>,
    pub address_tunnel_port: Option<u16>,
    pub address_public: Option<String>,
    pub address_mdns: Option<String>,
}

/// Envelope wrapping every agent response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<Vec<TunnelInfo>>,
}

impl ApiResponse {
    /// First tunnel description in `data`, if any
    pub fn first(&self) -> Option<&TunnelInfo> {
        self.data.as_ref().and_then(|data| data.first())
    }

    /// Agent-provided message, or `fallback` when there is none
    pub fn message_or(&self, fallback: &str) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Whether an address of the form `host[:port]` already carries its port
pub(crate) fn has_port(address: &str) -> bool {
    address.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tunnel_type_serialization() {
        assert_eq!(serde_json::to_value(TunnelType::Http).unwrap(), "HTTP");
        assert_eq!(serde_json::to_value(TunnelType::Tcp).unwrap(), "TCP");

        let parsed: TunnelType = serde_json::from_value(json!("UDP")).unwrap();
        assert_eq!(parsed, TunnelType::Udp);
    }

    #[test]
    fn test_tunnel_type_parsing() {
        assert_eq!("http".parse::<TunnelType>().unwrap(), TunnelType::Http);
        assert_eq!("TCP".parse::<TunnelType>().unwrap(), TunnelType::Tcp);
        assert!("quic".parse::<TunnelType>().is_err());
        assert_eq!(TunnelType::Udp.to_string(), "UDP");
    }

    #[test]
    fn test_record_payload_shape() {
        let record = TunnelRecord {
            name: "web".to_string(),
            local_address: "127.0.0.1:3000".to_string(),
            address_mdns: "web".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "");
        assert_eq!(json["tunnel_type"], "HTTP");
        assert_eq!(json["address_tunnel_port"], 0);
        assert_eq!(json["inspect"], false);
        assert!(json["options"].is_object());
        assert_eq!(json["options"]["cidr_allow"], json!([]));
        assert_eq!(json.as_object().unwrap().len(), 13);
    }

    #[test]
    fn test_envelope_tolerates_missing_and_null_fields() {
        let response: ApiResponse = serde_json::from_value(json!({
            "success": true,
            "data": [{ "id": "abc", "address_public": null, "extra": 1 }]
        }))
        .unwrap();

        let first = response.first().unwrap();
        assert_eq!(first.id.as_deref(), Some("abc"));
        assert_eq!(first.address_public, None);
        assert_eq!(first.address_mdns, None);

        let failure: ApiResponse =
            serde_json::from_value(json!({ "success": false, "data": null })).unwrap();
        assert!(failure.first().is_none());
        assert_eq!(failure.message_or("Tunnel creation failed"), "Tunnel creation failed");
    }

    #[test]
    fn test_has_port() {
        assert!(has_port("example.lokal.so:443"));
        assert!(!has_port("example.lokal.so"));
    }
}
