//! Tunnel handle - configuration, creation and address resolution
//!
//! A [`Tunnel`] starts out empty, is configured with chained setters (no I/O),
//! and is submitted once with [`Tunnel::create`]. Afterwards its public
//! address may still be refined by polling the agent; see
//! [`Tunnel::get_public_address`].

use crate::client::AgentClient;
use crate::error::{LokalError, Result};
use crate::models::{
    has_port, ApiResponse, TunnelInfo, TunnelRecord, TunnelType, TUNNEL_INFO_PATH,
    TUNNEL_START_PATH,
};
use crate::options::TunnelOptions;
use tracing::{debug, info, warn};

/// Suffix used by mDNS names on the local network
pub const LAN_SUFFIX: &str = ".local";

/// Failure message the agent sends when the requested address is taken
pub const DUPLICATE_ADDRESS_SUFFIX: &str = "address is already being used";

/// A tunnel managed by the agent
///
/// Borrows the [`AgentClient`] it was created from; every network call the
/// handle makes goes through that client.
#[derive(Debug)]
pub struct Tunnel<'a> {
    client: &'a AgentClient,
    record: TunnelRecord,
}

impl<'a> Tunnel<'a> {
    pub fn new(client: &'a AgentClient) -> Self {
        Self {
            client,
            record: TunnelRecord::default(),
        }
    }

    pub fn set_local_address(mut self, local_address: impl Into<String>) -> Self {
        self.record.local_address = local_address.into();
        self
    }

    pub fn set_tunnel_type(mut self, tunnel_type: TunnelType) -> Self {
        self.record.tunnel_type = tunnel_type;
        self
    }

    pub fn set_inspection(mut self, inspect: bool) -> Self {
        self.record.inspect = inspect;
        self
    }

    /// Request a LAN (mDNS) name
    ///
    /// One trailing `.local` is stripped before storing, so `"app"` and
    /// `"app.local"` request the same name. The match is case-sensitive and
    /// only a single suffix is removed.
    pub fn set_lan_address(mut self, lan_address: impl Into<String>) -> Self {
        let lan_address = lan_address.into();
        self.record.address_mdns = match lan_address.strip_suffix(LAN_SUFFIX) {
            Some(stripped) => stripped.to_string(),
            None => lan_address,
        };
        self
    }

    /// Request a public address, either `host` or `host:port`
    pub fn set_public_address(mut self, public_address: impl Into<String>) -> Self {
        self.record.address_public = public_address.into();
        self
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.record.name = name.into();
        self
    }

    pub fn set_options(mut self, options: TunnelOptions) -> Self {
        self.record.options = options;
        self
    }

    /// Adopt an existing tunnel instead of failing when the address is taken
    pub fn mark_ignore_duplicate(mut self) -> Self {
        self.record.ignore_duplicate = true;
        self
    }

    /// Show the client's startup banner once the tunnel is created
    pub fn enable_startup_banner(mut self) -> Self {
        self.record.startup_banner = true;
        self
    }

    pub fn options_mut(&mut self) -> &mut TunnelOptions {
        &mut self.record.options
    }

    /// Submit the tunnel to the agent
    ///
    /// Issues exactly one `POST /api/tunnel/start`. On success the agent's
    /// first tunnel record is adopted. When [`Tunnel::mark_ignore_duplicate`]
    /// was set and the agent reports the address as already in use, the
    /// existing tunnel it returns is adopted instead.
    pub async fn create(&mut self) -> Result<&mut Self> {
        if self.record.address_mdns.is_empty() && self.record.address_public.is_empty() {
            return Err(LokalError::Validation(
                "Please enable either LAN address or random/custom public URL".to_string(),
            ));
        }

        debug!(
            "Starting {} tunnel for {}",
            self.record.tunnel_type, self.record.local_address
        );
        let response: ApiResponse = self.client.post(TUNNEL_START_PATH, &self.record).await?;

        if !response.success {
            let message = response.message_or("Tunnel creation failed");
            if !(self.record.ignore_duplicate && message.ends_with(DUPLICATE_ADDRESS_SUFFIX)) {
                return Err(LokalError::Validation(message));
            }
            warn!("{}; adopting the existing tunnel", message);
        }

        let first = response.first().ok_or_else(|| {
            LokalError::InvalidResponse("agent response carried no tunnel record".to_string())
        })?;
        self.adopt(first);
        info!(
            "Tunnel {} ready (public: '{}', lan: '{}')",
            self.record.id, self.record.address_public, self.record.address_mdns
        );

        if self.record.startup_banner {
            let banner = self.client.banner();
            banner.show(self).await;
        }

        Ok(self)
    }

    fn adopt(&mut self, info: &TunnelInfo) {
        self.record.id = info.id.clone().unwrap_or_default();
        self.record.address_public = info.address_public.clone().unwrap_or_default();
        self.record.address_mdns = info.address_mdns.clone().unwrap_or_default();
        if let Some(server_id) = &info.server_id {
            self.record.server_id = server_id.clone();
        }
        if let Some(address_tunnel) = &info.address_tunnel {
            self.record.address_tunnel = address_tunnel.clone();
        }
        if let Some(port) = info.address_tunnel_port {
            self.record.address_tunnel_port = port;
        }
    }

    /// LAN address with its `.local` suffix
    pub fn get_lan_address(&self) -> Result<String> {
        let mdns = &self.record.address_mdns;
        if mdns.is_empty() {
            return Err(LokalError::NotConfigured(
                "LAN address is not being set".to_string(),
            ));
        }

        if mdns.ends_with(LAN_SUFFIX) {
            Ok(mdns.clone())
        } else {
            Ok(format!("{}{}", mdns, LAN_SUFFIX))
        }
    }

    /// Public address of the tunnel
    ///
    /// Non-HTTP tunnels get their port assigned by the agent after creation.
    /// While the stored address has no port, this triggers one refresh from
    /// the agent and still fails with [`LokalError::PortNotYetAssigned`]; the
    /// refreshed address is returned by the next call.
    pub async fn get_public_address(&mut self) -> Result<String> {
        if self.record.address_public.is_empty() {
            return Err(LokalError::NotConfigured(
                "Public address is not requested by client".to_string(),
            ));
        }

        if !self.record.tunnel_type.is_http() && !has_port(&self.record.address_public) {
            self.update_public_url_port().await?;
            return Err(LokalError::PortNotYetAssigned);
        }

        Ok(self.record.address_public.clone())
    }

    /// Refresh the public address from `GET /api/tunnel/info/{id}`
    ///
    /// Only overwrites the stored address once the agent reports a port.
    pub async fn update_public_url_port(&mut self) -> Result<()> {
        let path = format!("{}/{}", TUNNEL_INFO_PATH, self.record.id);
        let response: ApiResponse = self.client.get(&path).await?;

        if !response.success {
            return Err(LokalError::Validation(
                response.message_or("Could not get tunnel info"),
            ));
        }

        let address = response
            .first()
            .and_then(|info| info.address_public.as_deref())
            .unwrap_or_default();
        if !has_port(address) {
            debug!("Tunnel {} has no assigned port yet", self.record.id);
            return Err(LokalError::PortNotYetAssigned);
        }

        debug!("Tunnel {} public address resolved to {}", self.record.id, address);
        self.record.address_public = address.to_string();
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn tunnel_type(&self) -> TunnelType {
        self.record.tunnel_type
    }

    pub fn local_address(&self) -> &str {
        &self.record.local_address
    }

    pub fn inspect(&self) -> bool {
        self.record.inspect
    }

    pub fn options(&self) -> &TunnelOptions {
        &self.record.options
    }

    pub fn server_id(&self) -> &str {
        &self.record.server_id
    }

    pub fn address_tunnel(&self) -> &str {
        &self.record.address_tunnel
    }

    pub fn address_tunnel_port(&self) -> u16 {
        self.record.address_tunnel_port
    }

    pub fn ignores_duplicate(&self) -> bool {
        self.record.ignore_duplicate
    }

    pub fn shows_startup_banner(&self) -> bool {
        self.record.startup_banner
    }

    /// The fields submitted to the agent
    pub fn record(&self) -> &TunnelRecord {
        &self.record
    }
}
