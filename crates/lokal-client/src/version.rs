//! Server version compatibility check
//!
//! Every response from the agent must carry a version header. A missing header
//! or a version below [`SERVER_MIN_VERSION`] fails the request before its body
//! is looked at.

use crate::error::{LokalError, Result};
use semver::Version;
use tracing::warn;

/// Oldest agent release this client can talk to
pub const SERVER_MIN_VERSION: &str = "0.6.0";

/// Response header carrying the agent's version
pub const SERVER_VERSION_HEADER: &str = "Lokal-Server-Version";

/// Parse an advertised version
///
/// Accepts full semantic versions as well as the shorter `0.6` / `v0.6.1`
/// forms; missing minor and patch components count as zero.
pub fn parse_server_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    let mut parts = trimmed.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(part) => part.parse().ok()?,
        None => 0,
    };
    let patch = match parts.next() {
        Some(part) => part.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    Some(Version::new(major, minor, patch))
}

fn minimum_version() -> Version {
    // SERVER_MIN_VERSION is a literal full semver
    Version::new(0, 6, 0)
}

/// Check the value of [`SERVER_VERSION_HEADER`] against the minimum
pub fn check_server_version(advertised: Option<&str>) -> Result<Version> {
    let Some(raw) = advertised else {
        warn!("Agent response carried no {} header", SERVER_VERSION_HEADER);
        return Err(LokalError::IncompatibleServer(
            "Your local client might be outdated, please update".to_string(),
        ));
    };

    let version = parse_server_version(raw).ok_or_else(|| {
        LokalError::IncompatibleServer(format!("Unrecognized server version '{}'", raw))
    })?;

    if version < minimum_version() {
        warn!(
            "Agent version {} is below the supported minimum {}",
            version, SERVER_MIN_VERSION
        );
        return Err(LokalError::IncompatibleServer(format!(
            "Your local client is outdated, please update to minimum version {}",
            SERVER_MIN_VERSION
        )));
    }

    Ok(version)
}
