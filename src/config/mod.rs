//! Resource options and their validation
//!
//! Options arrive as a loosely typed mapping (from a profile, a YAML file or
//! the command line) and are turned into a fully populated [`ResourceConfig`]
//! or a [`SkipReason`]. Every string that later ends up on a command line
//! goes through an allow-list here.

pub mod loader;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::SkipReason;

pub use loader::ConfigLoader;

/// Metadata API version used when none is configured
pub const DEFAULT_VERSION: &str = "latest";

/// Connect timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 2;

/// Executable looked up on `PATH` for the curl transport
pub const DEFAULT_CURL: &str = "curl";

/// Executable looked up on `PATH` for the wget transport
pub const DEFAULT_WGET: &str = "wget";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(latest|[0-9.-]+)$").expect("valid version pattern"));

static TIMEOUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid timeout pattern"));

static EXECUTABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\\/. :-]+$").expect("valid executable pattern")
});

/// Validated options for a metadata resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceConfig {
    /// API version segment of the metadata URL ("latest" or e.g. "2016-06-30")
    pub version: String,
    /// Connect timeout handed to the transport
    pub timeout_seconds: u64,
    /// curl executable, bare name or path
    pub curl_path: String,
    /// wget executable, bare name or path
    pub wget_path: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            curl_path: DEFAULT_CURL.to_string(),
            wget_path: DEFAULT_WGET.to_string(),
        }
    }
}

impl ResourceConfig {
    /// Validate raw options and fill in defaults
    ///
    /// `None` means no options were given at all. Otherwise the value must
    /// be a mapping; keys other than `version`, `timeout`, `curl_path` and
    /// `wget_path` are ignored and `null` values count as absent. Checks run
    /// in that order and stop at the first failure.
    pub fn validate(options: Option<&Value>) -> Result<Self, SkipReason> {
        let map = match options {
            None => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(SkipReason::UnsupportedOptions(other.to_string())),
        };

        let mut config = Self::default();

        if let Some(version) = option(map, "version") {
            let version = render(version);
            if !VERSION_RE.is_match(&version) {
                return Err(SkipReason::InvalidVersion);
            }
            config.version = version;
        }

        if let Some(timeout) = option(map, "timeout") {
            config.timeout_seconds = parse_timeout(timeout)?;
        }

        if let Some(curl) = option(map, "curl_path") {
            config.curl_path = executable(curl).ok_or(SkipReason::InvalidCurlPath)?;
        }

        if let Some(wget) = option(map, "wget_path") {
            config.wget_path = executable(wget).ok_or(SkipReason::InvalidWgetPath)?;
        }

        debug!(
            "Resolved options: version={} timeout={}s curl={} wget={}",
            config.version, config.timeout_seconds, config.curl_path, config.wget_path
        );
        Ok(config)
    }
}

fn option<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

/// Text form of a scalar option, so `2016` and `"2016"` validate alike
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_timeout(value: &Value) -> Result<u64, SkipReason> {
    let text = render(value);
    if !TIMEOUT_RE.is_match(&text) {
        return Err(SkipReason::TimeoutNotNumeric);
    }
    // Digits only, so the one way parsing fails is overflow
    Ok(text.parse().unwrap_or(u64::MAX))
}

fn executable(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|path| EXECUTABLE_RE.is_match(path))
        .map(str::to_string)
}
