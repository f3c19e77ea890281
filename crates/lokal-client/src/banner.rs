//! Startup banner shown after a tunnel is created
//!
//! Terminal styling lives only here. The banner resolves addresses through
//! the tunnel like any other caller, but resolution failures never leave
//! this module: an address that cannot be shown is simply left out.

use crate::tunnel::Tunnel;
use crate::version::SERVER_MIN_VERSION;
use async_trait::async_trait;
use crossterm::style::{Color, Stylize};
use rand::seq::SliceRandom;
use std::io::{self, Write};
use tracing::debug;

const LOGO: &str = r"
    __       _         _
   / /  ___ | | ____ _| |  ___  ___
  / /  / _ \| |/ / _  | | / __|/ _ \
 / /__| (_) |   < (_| | |_\__ \ (_) |
 \____/\___/|_|\_\__,_|_(_)___/\___/ ";

const LOGO_COLORS: [Color; 5] = [
    Color::Magenta,
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Red,
];

/// Hook run by [`Tunnel::create`] when the startup banner is enabled
///
/// Implementations get the freshly created tunnel and cannot fail the
/// creation that triggered them.
#[async_trait]
pub trait StartupBanner: Send + Sync {
    async fn show(&self, tunnel: &mut Tunnel<'_>);
}

/// Addresses a banner can display, resolved ahead of rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerAddresses {
    pub public: Option<String>,
    pub lan: Option<String>,
}

impl BannerAddresses {
    /// Resolve whatever the tunnel can report right now
    pub async fn resolve(tunnel: &mut Tunnel<'_>) -> Self {
        let public = match tunnel.get_public_address().await {
            Ok(address) => Some(address),
            Err(e) => {
                debug!("Public address not shown in banner: {}", e);
                None
            }
        };
        let lan = tunnel.get_lan_address().ok();

        Self { public, lan }
    }
}

/// Prints the Lokal logo and the tunnel's addresses to stdout
#[derive(Debug, Clone)]
pub struct TerminalBanner {
    colored: bool,
}

impl TerminalBanner {
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Banner without ANSI styling
    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn render_to<W: Write>(&self, out: &mut W, addresses: &BannerAddresses) -> io::Result<()> {
        if self.colored {
            let color = LOGO_COLORS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(Color::Cyan);
            writeln!(out, "{}", LOGO.with(color).bold())?;
        } else {
            writeln!(out, "{}", LOGO)?;
        }
        writeln!(out)?;

        self.line(out, Color::Red, "Minimum Lokal Client\t", SERVER_MIN_VERSION)?;
        if let Some(public) = &addresses.public {
            let value = format!("https://{}", public);
            self.line(out, Color::Cyan, "Public Address\t\t", &value)?;
        }
        if let Some(lan) = &addresses.lan {
            let value = format!("https://{}", lan);
            self.line(out, Color::Green, "LAN Address\t\t", &value)?;
        }
        writeln!(out)
    }

    fn line<W: Write>(&self, out: &mut W, color: Color, label: &str, value: &str) -> io::Result<()> {
        if self.colored {
            writeln!(out, "{}{}", label.with(color), value)
        } else {
            writeln!(out, "{}{}", label, value)
        }
    }
}

impl Default for TerminalBanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StartupBanner for TerminalBanner {
    async fn show(&self, tunnel: &mut Tunnel<'_>) {
        let addresses = BannerAddresses::resolve(tunnel).await;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = self.render_to(&mut out, &addresses) {
            debug!("Failed to write startup banner: {}", e);
        }
    }
}
