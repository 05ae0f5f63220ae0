use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::LookupError;
use crate::whois::{WhoisClient, WhoisResponse};

/// What a successful lookup learned about a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LookupOutcome {
    Available,
    Registered {
        /// Raw status lines, informational URLs included.
        statuses: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        registrar: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires: Option<DateTime<Utc>>,
    },
}

impl LookupOutcome {
    pub fn registered(statuses: Vec<String>) -> Self {
        LookupOutcome::Registered {
            statuses,
            registrar: None,
            expires: None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, LookupOutcome::Available)
    }
}

impl From<WhoisResponse> for LookupOutcome {
    fn from(response: WhoisResponse) -> Self {
        if response.status.is_empty() {
            return LookupOutcome::Available;
        }
        LookupOutcome::Registered {
            statuses: response.status,
            registrar: response.registrar,
            expires: response.expiration_date,
        }
    }
}

/// Resolves the registration status of one domain.
#[async_trait]
pub trait DomainLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<LookupOutcome, LookupError>;
}

/// [`DomainLookup`] backed by plain WHOIS.
#[derive(Debug, Clone, Default)]
pub struct WhoisLookup {
    client: WhoisClient,
    server: Option<String>,
}

impl WhoisLookup {
    pub fn new(client: WhoisClient) -> Self {
        Self {
            client,
            server: None,
        }
    }

    /// Ask this server for every domain instead of the TLD's registry.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }
}

#[async_trait]
impl DomainLookup for WhoisLookup {
    #[instrument(skip(self))]
    async fn lookup(&self, domain: &str) -> Result<LookupOutcome, LookupError> {
        let response = match &self.server {
            Some(server) => self.client.lookup_with_server(domain, server).await?,
            None => self.client.lookup(domain).await?,
        };

        if response.status.is_empty() && response.is_available() {
            debug!(server = %response.whois_server, "Registry reports no record");
            return Err(LookupError::NotFound);
        }

        Ok(response.into())
    }
}
