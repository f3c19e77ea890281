//! Lokal client library - Public API
//!
//! Asks a locally running Lokal agent to expose a local service through a
//! public or LAN (mDNS) address, and reads back what the agent assigned.
//!
//! # Quick Start
//!
//! ```ignore
//! use lokal_client::{AgentClient, TunnelType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AgentClient::new()?.set_api_token("my-token");
//!
//!     let mut tunnel = client
//!         .new_tunnel()
//!         .set_name("my-app")
//!         .set_tunnel_type(TunnelType::Http)
//!         .set_local_address("127.0.0.1:3000")
//!         .set_lan_address("my-app.local")
//!         .set_public_address("my-app.k.lokal-so.site")
//!         .mark_ignore_duplicate()
//!         .enable_startup_banner();
//!     tunnel.create().await?;
//!
//!     println!("LAN: {}", tunnel.get_lan_address()?);
//!     println!("Public: {}", tunnel.get_public_address().await?);
//!     Ok(())
//! }
//! ```
//!
//! Every response is checked against [`SERVER_MIN_VERSION`]; an agent that
//! omits its version header is rejected. The library never retries: a
//! [`LokalError::PortNotYetAssigned`] from a TCP/UDP tunnel means "ask
//! again later", and the delay is up to the caller.

pub mod banner;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod tunnel;
pub mod version;

pub use banner::{BannerAddresses, StartupBanner, TerminalBanner};
pub use client::{new_default, AgentClient};
pub use config::{BasicAuth, ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use error::{LokalError, Result};
pub use models::{ApiResponse, TunnelInfo, TunnelRecord, TunnelType};
pub use options::TunnelOptions;
pub use tunnel::Tunnel;
pub use version::{SERVER_MIN_VERSION, SERVER_VERSION_HEADER};

pub use async_trait::async_trait;
