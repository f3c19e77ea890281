//! Lokal CLI - Start a tunnel through the local Lokal agent
//!
//! Asks the agent to expose a local service and waits until its public
//! address is known.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lokal_client::{
    AgentClient, BasicAuth, ClientConfig, LokalError, Tunnel, TunnelOptions, TunnelType,
    DEFAULT_BASE_URL,
};
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

/// Lokal - Expose local services through the Lokal agent
#[derive(Parser, Debug)]
#[command(name = "lokal")]
#[command(about = "Lokal - Expose local services through the Lokal agent")]
#[command(version = LONG_VERSION)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Agent REST endpoint
    #[arg(long, env = "LOKAL_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// API token sent to the agent
    #[arg(long, env = "LOKAL_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Agent credentials as username:password
    #[arg(long, env = "LOKAL_BASIC_AUTH", hide_env_values = true, global = true)]
    basic_auth: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "LOKAL_TIMEOUT", global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a tunnel for a local service
    #[command(long_about = r#"
Ask the Lokal agent to expose a local service. Request a LAN (mDNS) name,
a public address, or both.

EXAMPLES:
  # Expose a dev server on the LAN and publicly
  lokal start --local-address 127.0.0.1:3000 \
    --lan myapp --public myapp.k.lokal-so.site

  # TCP tunnel; the agent assigns the public port
  lokal start --type tcp --local-address 127.0.0.1:22 --public ssh.lokal-so.site

ENVIRONMENT VARIABLES:
  LOKAL_BASE_URL     Agent REST endpoint
  LOKAL_API_TOKEN    API token
  LOKAL_BASIC_AUTH   Agent credentials (username:password)
  LOKAL_TIMEOUT      Request timeout in seconds
    "#)]
    Start(StartArgs),
}

#[derive(Args, Debug)]
struct StartArgs {
    /// Local service to expose (e.g., 127.0.0.1:3000)
    #[arg(long)]
    local_address: String,

    /// Tunnel name
    #[arg(long, default_value = "")]
    name: String,

    /// Tunnel type: http, tcp or udp
    #[arg(long = "type", default_value = "http")]
    tunnel_type: TunnelType,

    /// LAN address; ".local" is optional
    #[arg(long)]
    lan: Option<String>,

    /// Public address, host or host:port
    #[arg(long)]
    public: Option<String>,

    /// Enable request inspection
    #[arg(long)]
    inspect: bool,

    /// Reuse an existing tunnel for the same address
    #[arg(long)]
    ignore_duplicate: bool,

    /// Do not print the startup banner
    #[arg(long)]
    no_banner: bool,

    /// Visitor credentials (username:password), repeatable
    #[arg(long = "tunnel-auth")]
    tunnel_auth: Vec<String>,

    /// CIDR allowed to reach the tunnel, repeatable
    #[arg(long)]
    allow_cidr: Vec<String>,

    /// CIDR denied from the tunnel, repeatable
    #[arg(long)]
    deny_cidr: Vec<String>,

    /// Header added to proxied requests, repeatable
    #[arg(long)]
    request_header_add: Vec<String>,

    /// Header removed from proxied requests, repeatable
    #[arg(long)]
    request_header_remove: Vec<String>,

    /// Header added to responses, repeatable
    #[arg(long)]
    response_header_add: Vec<String>,

    /// Header removed from responses, repeatable
    #[arg(long)]
    response_header_remove: Vec<String>,

    /// Header key required from visitors, repeatable
    #[arg(long)]
    header_key: Vec<String>,

    /// How many times to ask for an assigned port (0 = don't wait)
    #[arg(long, default_value = "10")]
    port_wait_attempts: u32,

    /// Seconds between port lookups
    #[arg(long, default_value = "2")]
    port_wait_interval: u64,
}

impl StartArgs {
    fn options(&self) -> TunnelOptions {
        TunnelOptions::new()
            .set_basic_auth(self.tunnel_auth.clone())
            .set_cidr_allow(self.allow_cidr.clone())
            .set_cidr_deny(self.deny_cidr.clone())
            .set_request_header_add(self.request_header_add.clone())
            .set_request_header_remove(self.request_header_remove.clone())
            .set_response_header_add(self.response_header_add.clone())
            .set_response_header_remove(self.response_header_remove.clone())
            .set_header_key(self.header_key.clone())
    }
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let basic_auth = match cli.basic_auth.as_deref() {
        Some(credentials) => Some(
            BasicAuth::parse(credentials)
                .context("--basic-auth must be in username:password form")?,
        ),
        None => None,
    };

    Ok(ClientConfig {
        base_url: cli.base_url.clone(),
        basic_auth,
        api_token: cli.api_token.clone(),
        timeout: cli.timeout.map(Duration::from_secs),
        ..Default::default()
    })
}

async fn start_tunnel(client: &AgentClient, args: StartArgs) -> Result<()> {
    let mut tunnel = client
        .new_tunnel()
        .set_name(args.name.clone())
        .set_tunnel_type(args.tunnel_type)
        .set_local_address(args.local_address.clone())
        .set_inspection(args.inspect)
        .set_options(args.options());

    if let Some(lan) = &args.lan {
        tunnel = tunnel.set_lan_address(lan.clone());
    }
    if let Some(public) = &args.public {
        tunnel = tunnel.set_public_address(public.clone());
    }
    if args.ignore_duplicate {
        tunnel = tunnel.mark_ignore_duplicate();
    }
    if !args.no_banner {
        tunnel = tunnel.enable_startup_banner();
    }

    tunnel.create().await.context("Failed to create tunnel")?;
    info!("Tunnel {} started for {}", tunnel.id(), tunnel.local_address());

    if let Ok(lan) = tunnel.get_lan_address() {
        info!("LAN address: {}", lan);
    }

    if args.public.is_some() {
        let public = wait_for_public_address(
            &mut tunnel,
            args.port_wait_attempts,
            Duration::from_secs(args.port_wait_interval),
        )
        .await?;
        info!("Public address: {}", public);
    }

    Ok(())
}

/// Poll until the agent has assigned the public port
async fn wait_for_public_address(
    tunnel: &mut Tunnel<'_>,
    max_attempts: u32,
    interval: Duration,
) -> Result<String> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        match tunnel.get_public_address().await {
            Ok(address) => return Ok(address),
            Err(LokalError::PortNotYetAssigned) if attempt <= max_attempts => {
                warn!(
                    "Public port not assigned yet, retrying in {} seconds... (attempt {} of {})",
                    interval.as_secs(),
                    attempt,
                    max_attempts
                );
                tokio::time::sleep(interval).await;
            }
            Err(e) => {
                debug!("Giving up on public address after {} attempts", attempt);
                return Err(e).context("Failed to resolve public address");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let config = client_config(&cli)?;
    debug!("Using agent at {}", config.base_url);
    let client = AgentClient::from_config(config).context("Failed to build agent client")?;

    match cli.command {
        Commands::Start(args) => start_tunnel(&client, args).await,
    }
}
