//! Access to the machine the checks run on
//!
//! The resource never spawns processes or inspects `PATH` itself; it goes
//! through a [`Host`]. [`LocalHost`] is the real machine, [`mock::MockHost`]
//! a scripted stand-in for tests.

pub mod local;
pub mod mock;

use std::fmt;

use async_trait::async_trait;

pub use local::LocalHost;

/// Operating system family of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Linux and other Unix-like systems
    Unix,
    /// Windows, where PowerShell is always present
    Windows,
    /// Anything else
    Other,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Unix => write!(f, "unix"),
            OsFamily::Windows => write!(f, "windows"),
            OsFamily::Other => write!(f, "other"),
        }
    }
}

/// An external command: a program and its arguments, never run through a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of an [`Invocation`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the process could not be started or was killed
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Output of a command that exited successfully
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// The machine a metadata resource runs on
#[async_trait]
pub trait Host: Send + Sync {
    /// Operating system family
    fn os_family(&self) -> OsFamily;

    /// Whether `program` (a bare name or a path) resolves to an executable
    async fn command_exists(&self, program: &str) -> bool;

    /// Run a command to completion and capture its output
    ///
    /// Never fails: a command that cannot be started yields empty output
    /// with no exit code.
    async fn run(&self, invocation: &Invocation) -> CommandOutput;
}
