//! The local machine

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{CommandOutput, Host, Invocation, OsFamily};

/// Host backed by the machine this process runs on
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHost;

impl LocalHost {
    pub fn new() -> Self {
        Self
    }

    /// Candidate files for a program name, in lookup order
    fn candidates(program: &str) -> Vec<PathBuf> {
        if program.contains('/') || program.contains('\\') {
            return vec![PathBuf::from(program)];
        }

        let Some(path_var) = std::env::var_os("PATH") else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for dir in std::env::split_paths(&path_var) {
            candidates.push(dir.join(program));
            if cfg!(windows) && Path::new(program).extension().is_none() {
                candidates.push(dir.join(format!("{}.exe", program)));
            }
        }
        candidates
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    metadata.is_file()
}

#[async_trait]
impl Host for LocalHost {
    fn os_family(&self) -> OsFamily {
        if cfg!(windows) {
            OsFamily::Windows
        } else if cfg!(unix) {
            OsFamily::Unix
        } else {
            OsFamily::Other
        }
    }

    async fn command_exists(&self, program: &str) -> bool {
        for candidate in Self::candidates(program) {
            if let Ok(metadata) = tokio::fs::metadata(&candidate).await
                && is_executable(&metadata)
            {
                debug!("Found {} at {}", program, candidate.display());
                return true;
            }
        }
        debug!("{} not found", program);
        false
    }

    async fn run(&self, invocation: &Invocation) -> CommandOutput {
        debug!("Running: {}", invocation);
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                if !output.status.success() {
                    debug!(
                        "{} exited with status {}",
                        invocation.program,
                        output.status.code().unwrap_or(-1)
                    );
                }
                CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code(),
                }
            }
            Err(e) => {
                warn!("Failed to start {}: {}", invocation.program, e);
                CommandOutput::default()
            }
        }
    }
}
