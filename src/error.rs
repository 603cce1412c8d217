//! Error types for ec2-instance-check

use thiserror::Error;

/// Why a metadata resource cannot be used
///
/// A skip is terminal but not fatal: the caller reports the check as
/// inapplicable and carries on with the rest of the run. The `Display` text
/// is the reason string shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error(
        "Unsupported parameter {0}. Must be a mapping, for example: {{\"curl_path\": \"/usr/bin/curl\"}}"
    )]
    UnsupportedOptions(String),

    #[error("Invalid character in version")]
    InvalidVersion,

    #[error("timeout is not numeric")]
    TimeoutNotNumeric,

    #[error("Invalid character in curl_path")]
    InvalidCurlPath,

    #[error("Invalid character in wget_path")]
    InvalidWgetPath,

    #[error("'curl' or 'wget' are required on the instance for the resource to work.")]
    NoHttpClient,
}

/// Errors raised while gathering options, before the resource exists
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
