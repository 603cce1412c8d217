//! ec2-instance-check library
//!
//! Exposes the EC2 instance metadata service to compliance checks.
//!
//! A [`MetadataResource`] is built from a loosely typed options mapping. It
//! validates the options, picks a way to reach the metadata service (curl,
//! wget or PowerShell) and then answers property lookups such as
//! `meta-data/public-ipv4` or `user-data` with their raw text.
//!
//! # Design Principles
//!
//! - **Skip, don't fail**: bad options or a host without an http client mark
//!   the resource as skipped with a reason instead of returning an error
//! - **Values, not errors**: lookups always return text, so problems show up
//!   as failing assertions
//! - **No shell**: every command is spawned directly with allow-listed
//!   arguments

pub mod config;
pub mod fetch;
pub mod host;
pub mod resource;
pub mod transport;

mod error;

pub use config::ResourceConfig;
pub use error::{MetadataError, SkipReason};
pub use resource::MetadataResource;
pub use transport::Transport;
