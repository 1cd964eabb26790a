//! # Data Source Client
//!
//! Maps the three logical sources to their fixed paths and fetches each one as
//! a `RawFetchResult`. A single attempt is made per call; failures are returned
//! as values so the orchestrator can settle all sources independently.

use std::fmt;

use async_trait::async_trait;
use lib_common::retrieve::{ApiClient, ApiClientOptions, FetchError};
use serde_json::Value;

/// One of the three polled endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Agent/guardian counts, `{ "ready": n }`.
    Guardians,
    /// Platinum availability, `{ "available_agents": n }`.
    Platinum,
    /// Per-state insurance availability, `[{ "state", "ready", "error"? }]`.
    DhInsurance,
}

impl Endpoint {
    /// All sources, in the order they are fetched and rendered.
    pub const ALL: [Endpoint; 3] = [Endpoint::Guardians, Endpoint::Platinum, Endpoint::DhInsurance];

    /// Path relative to the configured base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Guardians => "api/guardians",
            Endpoint::Platinum => "api/platinum",
            Endpoint::DhInsurance => "api/dh-insurance",
        }
    }

    /// Display name used in logs and toasts.
    pub fn label(self) -> &'static str {
        match self {
            Endpoint::Guardians => "GUARDIANS",
            Endpoint::Platinum => "PLATINUM",
            Endpoint::DhInsurance => "DH Insurance",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one endpoint call: the parsed JSON body or the reason it failed.
pub type RawFetchResult = Result<Value, FetchError>;

/// Anything that can produce a `RawFetchResult` for an endpoint.
///
/// The trait is object-safe so the orchestrator can hold an
/// `Arc<dyn DataSource>` and tests can substitute canned responses.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches and parses the JSON behind `endpoint`. Never panics on bad input.
    async fn fetch_json(&self, endpoint: Endpoint) -> RawFetchResult;
}

/// `DataSource` backed by real HTTP requests.
pub struct HttpDataSource {
    client: ApiClient,
}

impl HttpDataSource {
    /// Builds a client rooted at `base_url`.
    pub fn new(base_url: &str, options: ApiClientOptions) -> Result<Self, FetchError> {
        Ok(Self {
            client: ApiClient::new(base_url, options)?,
        })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_json(&self, endpoint: Endpoint) -> RawFetchResult {
        let result = self.client.get_json::<Value>(endpoint.path()).await;
        if let Err(e) = &result {
            log::debug!("GET {} failed: {}", endpoint.path(), e);
        }
        result
    }
}
