//! Property lookup against the metadata service
//!
//! A property is any path below the versioned API root, such as
//! `meta-data/public-ipv4` or `user-data`. Problems are reported in-band:
//! a rejected path or a missing transport yields a fixed diagnostic string,
//! and a failed request yields whatever the transport printed (usually
//! nothing). A missing property and an unreachable service look the same.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::host::Host;
use crate::transport::Transport;

/// Link-local address of the instance metadata service
pub const METADATA_BASE_URL: &str = "http://169.254.169.254";

/// Returned for property paths outside the allow-list
pub const INVALID_PROPERTY: &str = "Invalid character in property";

/// Returned when no transport is available
pub const NO_HTTP_CLIENT: &str = "No http client available on the node";

static PROPERTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_/-]+$").expect("valid property pattern"));

/// A property path that passed the allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath(String);

impl PropertyPath {
    /// Accept word characters, `/` and `-` only
    ///
    /// Dots are not allowed, so `..` segments cannot appear.
    pub fn parse(path: &str) -> Option<Self> {
        PROPERTY_RE
            .is_match(path)
            .then(|| PropertyPath(path.to_string()))
    }

    /// The validated path text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<base>/<version>/<path>`
pub fn metadata_url(base_url: &str, version: &str, path: &PropertyPath) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        version,
        path.as_str()
    )
}

/// Body of a raw HTTP response printed by PowerShell
///
/// Everything up to and including the first blank line is headers. Without
/// a blank line there is no body.
pub fn extract_body(raw: &str) -> String {
    raw.trim()
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default()
}

/// Fetch one property through `transport`
pub async fn fetch<H: Host + ?Sized>(
    host: &H,
    transport: &Transport,
    base_url: &str,
    version: &str,
    timeout_seconds: u64,
    property: &str,
) -> String {
    let Some(path) = PropertyPath::parse(property) else {
        debug!("Rejected property path {:?}", property);
        return INVALID_PROPERTY.to_string();
    };

    let url = metadata_url(base_url, version, &path);
    let Some(invocation) = transport.invocation(&url, timeout_seconds) else {
        return NO_HTTP_CLIENT.to_string();
    };

    debug!("Fetching {} via {}", url, transport.name());
    let output = host.run(&invocation).await;
    if !output.is_success() {
        debug!(
            "{} for {} exited with {:?}: {}",
            transport.name(),
            path,
            output.exit_code,
            output.stderr.trim()
        );
    }

    match transport {
        Transport::PowerShell => extract_body(&output.stdout),
        _ => output.stdout,
    }
}
