//! The metadata resource
//!
//! Ties option validation, transport selection and property lookup
//! together. All of the decision making happens in construction; after that
//! a resource is either ready (options plus a transport) or skipped (a
//! reason), and never changes.

use serde_json::Value;
use tracing::{debug, warn};

use crate::SkipReason;
use crate::config::ResourceConfig;
use crate::fetch::{self, METADATA_BASE_URL};
use crate::host::{Host, LocalHost};
use crate::transport::Transport;

/// Marker line in the `meta-data/` listing of a real instance
const IDENTITY_KEY: &str = "ami-id";

static NO_TRANSPORT: Transport = Transport::None;

#[derive(Debug, Clone)]
enum State {
    Ready {
        config: ResourceConfig,
        transport: Transport,
    },
    Skipped(SkipReason),
}

/// Instance metadata exposed for assertions
///
/// # Example
/// ```no_run
/// use ec2_instance_check::MetadataResource;
///
/// # async fn demo() {
/// let instance = MetadataResource::new(None).await;
/// if let Some(reason) = instance.skip_reason() {
///     println!("skipped: {}", reason);
/// } else if instance.exists().await {
///     let user_data = instance.get("user-data").await;
///     assert!(!user_data.to_lowercase().contains("password"));
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct MetadataResource<H = LocalHost> {
    host: H,
    base_url: String,
    state: State,
}

impl MetadataResource<LocalHost> {
    /// Build a resource on the local machine
    pub async fn new(options: Option<&Value>) -> Self {
        Self::with_host(options, LocalHost::new()).await
    }
}

impl<H: Host> MetadataResource<H> {
    /// Build a resource on `host`
    ///
    /// Validation runs first; the host is only probed when the options are
    /// valid.
    pub async fn with_host(options: Option<&Value>, host: H) -> Self {
        let state = match Self::resolve(options, &host).await {
            Ok((config, transport)) => {
                debug!("Metadata resource ready using {}", transport);
                State::Ready { config, transport }
            }
            Err(reason) => {
                warn!("Skipping metadata resource: {}", reason);
                State::Skipped(reason)
            }
        };

        Self {
            host,
            base_url: METADATA_BASE_URL.to_string(),
            state,
        }
    }

    async fn resolve(
        options: Option<&Value>,
        host: &H,
    ) -> Result<(ResourceConfig, Transport), SkipReason> {
        let config = ResourceConfig::validate(options)?;
        let transport = Transport::select(&config, host).await?;
        Ok((config, transport))
    }

    /// Point the resource at another metadata service address
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.state, State::Skipped(_))
    }

    /// Why the resource cannot be used, if it cannot
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.state {
            State::Skipped(reason) => Some(reason),
            State::Ready { .. } => None,
        }
    }

    /// Validated options, `None` when skipped
    pub fn config(&self) -> Option<&ResourceConfig> {
        match &self.state {
            State::Ready { config, .. } => Some(config),
            State::Skipped(_) => None,
        }
    }

    /// Selected transport; [`Transport::None`] when skipped
    pub fn transport(&self) -> &Transport {
        match &self.state {
            State::Ready { transport, .. } => transport,
            State::Skipped(_) => &NO_TRANSPORT,
        }
    }

    /// Whether this machine is an instance with a reachable metadata service
    ///
    /// True when the `meta-data/` listing has a line that is exactly `ami-id`.
    pub async fn exists(&self) -> bool {
        self.get("meta-data/")
            .await
            .lines()
            .any(|line| line == IDENTITY_KEY)
    }

    /// Raw value of a metadata property
    ///
    /// Never fails. Invalid paths return [`fetch::INVALID_PROPERTY`], a
    /// skipped resource returns [`fetch::NO_HTTP_CLIENT`], and a missing
    /// property or failed request returns the transport's output, normally
    /// empty.
    pub async fn get(&self, property: &str) -> String {
        let (version, timeout) = match &self.state {
            State::Ready { config, .. } => (config.version.as_str(), config.timeout_seconds),
            State::Skipped(_) => ("", 0),
        };

        fetch::fetch(
            &self.host,
            self.transport(),
            &self.base_url,
            version,
            timeout,
            property,
        )
        .await
    }
}
