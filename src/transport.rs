//! Retrieval mechanisms for the metadata service
//!
//! A transport is chosen once per resource by probing the host and then
//! used for every fetch. Each variant only carries what it needs to build
//! its command line.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::SkipReason;
use crate::config::ResourceConfig;
use crate::host::{Host, Invocation, OsFamily};

/// How metadata is fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Transport {
    /// External curl binary
    Curl { program: String },
    /// External wget binary
    Wget { program: String },
    /// `Invoke-WebRequest` through Windows PowerShell
    PowerShell,
    /// Nothing usable; every fetch yields a diagnostic string
    None,
}

impl Transport {
    /// Probe the host and pick a transport
    ///
    /// Windows always uses PowerShell without probing. Elsewhere curl wins
    /// over wget, and the host is probed at most twice.
    pub async fn select<H: Host + ?Sized>(
        config: &ResourceConfig,
        host: &H,
    ) -> Result<Self, SkipReason> {
        if host.os_family() == OsFamily::Windows {
            info!("Using PowerShell");
            return Ok(Transport::PowerShell);
        }

        if host.command_exists(&config.curl_path).await {
            info!("Using curl at {}", config.curl_path);
            return Ok(Transport::Curl {
                program: config.curl_path.clone(),
            });
        }
        debug!("curl not available at {}", config.curl_path);

        if host.command_exists(&config.wget_path).await {
            info!("Using wget at {}", config.wget_path);
            return Ok(Transport::Wget {
                program: config.wget_path.clone(),
            });
        }
        debug!("wget not available at {}", config.wget_path);

        warn!("No http client found on {} host", host.os_family());
        Err(SkipReason::NoHttpClient)
    }

    /// Short name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            Transport::Curl { .. } => "curl",
            Transport::Wget { .. } => "wget",
            Transport::PowerShell => "powershell",
            Transport::None => "none",
        }
    }

    /// Command that fetches `url`, or `None` when there is no transport
    pub fn invocation(&self, url: &str, timeout_seconds: u64) -> Option<Invocation> {
        let timeout = timeout_seconds.to_string();
        match self {
            Transport::Curl { program } => Some(Invocation::new(
                program.as_str(),
                ["--silent", "--fail", "--connect-timeout", timeout.as_str(), url],
            )),
            Transport::Wget { program } => Some(Invocation::new(
                program.as_str(),
                [
                    "--quiet",
                    "--connect-timeout",
                    timeout.as_str(),
                    "--output-document",
                    "-",
                    url,
                ],
            )),
            // RawContent keeps user-data verbatim; the headers are cut off afterwards
            Transport::PowerShell => Some(Invocation::new(
                "powershell",
                [
                    "-NoProfile".to_string(),
                    "-NonInteractive".to_string(),
                    "-Command".to_string(),
                    format!(
                        "(Invoke-WebRequest -Uri '{}' -TimeoutSec {} -UseBasicParsing).RawContent",
                        url, timeout
                    ),
                ],
            )),
            Transport::None => None,
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Curl { program } | Transport::Wget { program } => {
                write!(f, "{} ({})", self.name(), program)
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}
