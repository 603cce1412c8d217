//! Mock host for testing
//!
//! Provides a scripted host that can be used in unit and integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{CommandOutput, Host, Invocation, OsFamily};

/// Mock host for testing
///
/// Responses are keyed by metadata URL. An invocation matches a response
/// when one of its arguments is the URL, or contains it in single quotes
/// (the PowerShell form). Unmatched invocations produce empty output with a
/// failing exit code, like `curl --fail` against a missing path.
///
/// Clones share the record of probes and invocations.
///
/// # Example
/// ```
/// use ec2_instance_check::host::mock::MockHost;
/// use ec2_instance_check::host::OsFamily;
///
/// let host = MockHost::new()
///     .with_os_family(OsFamily::Unix)
///     .with_command("curl")
///     .with_response("http://169.254.169.254/latest/meta-data/", "ami-id\nhostname");
/// ```
#[derive(Debug, Clone)]
pub struct MockHost {
    os_family: OsFamily,
    commands: HashSet<String>,
    responses: HashMap<String, String>,
    probes: Arc<Mutex<Vec<String>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl MockHost {
    /// Create a Unix host with no programs installed
    pub fn new() -> Self {
        Self {
            os_family: OsFamily::Unix,
            commands: HashSet::new(),
            responses: HashMap::new(),
            probes: Arc::default(),
            invocations: Arc::default(),
        }
    }

    /// Set the operating system family
    pub fn with_os_family(mut self, os_family: OsFamily) -> Self {
        self.os_family = os_family;
        self
    }

    /// Mark a program (bare name or path) as installed
    pub fn with_command(mut self, program: &str) -> Self {
        self.commands.insert(program.to_string());
        self
    }

    /// Set the standard output returned for requests to `url`
    pub fn with_response(mut self, url: &str, stdout: &str) -> Self {
        self.responses.insert(url.to_string(), stdout.to_string());
        self
    }

    /// Programs probed so far, in order
    pub fn probes(&self) -> Vec<String> {
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Commands run so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn response_for(&self, invocation: &Invocation) -> Option<&String> {
        self.responses.iter().find_map(|(url, stdout)| {
            let quoted = format!("'{}'", url);
            invocation
                .args
                .iter()
                .any(|arg| arg == url || arg.contains(&quoted))
                .then_some(stdout)
        })
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for MockHost {
    fn os_family(&self) -> OsFamily {
        self.os_family
    }

    async fn command_exists(&self, program: &str) -> bool {
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(program.to_string());
        self.commands.contains(program)
    }

    async fn run(&self, invocation: &Invocation) -> CommandOutput {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());

        match self.response_for(invocation) {
            Some(stdout) => CommandOutput::success(stdout.as_str()),
            None => CommandOutput {
                exit_code: Some(22),
                ..CommandOutput::default()
            },
        }
    }
}
