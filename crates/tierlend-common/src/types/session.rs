//! Wallet session and provider seams
//!
//! Wallet state is passed explicitly as a [`WalletSession`] value. Providers
//! are resolved once at connect time behind the [`WalletProvider`] trait; the
//! engine never inspects ambient wallet objects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SessionError;
use crate::types::tier::ReputationScore;

/// Wallet provider family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    /// Browser-injected EIP-1193 provider (MetaMask and compatibles)
    Injected,
    /// Graphite network wallet, which also exposes reputation
    Graphite,
    /// Read-only session, no signing capability
    ReadOnly,
}

/// Connected wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Provider family, fixed for the lifetime of the provider
    fn family(&self) -> ProviderFamily;

    /// Accounts the user has authorised, primary first
    async fn accounts(&self) -> Result<Vec<String>, SessionError>;
}

/// Source of borrower reputation scores
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Reputation for an address, clamped into range
    async fn reputation(&self, address: &str) -> Result<ReputationScore, SessionError>;
}

/// Explicit wallet connection state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    /// Primary account, if connected
    pub address: Option<String>,

    pub family: ProviderFamily,
}

impl WalletSession {
    /// Disconnected session
    pub fn disconnected(family: ProviderFamily) -> Self {
        Self {
            address: None,
            family,
        }
    }

    /// Connected session for a known address
    pub fn connected(address: impl Into<String>, family: ProviderFamily) -> Self {
        Self {
            address: Some(address.into()),
            family,
        }
    }

    /// Resolve a session from a provider
    pub async fn connect(provider: &dyn WalletProvider) -> Result<Self, SessionError> {
        let accounts = provider.accounts().await?;
        let address = accounts.into_iter().next().ok_or(SessionError::NotConnected)?;
        Ok(Self::connected(address, provider.family()))
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Connected address or `NotConnected`
    pub fn require_address(&self) -> Result<&str, SessionError> {
        self.address.as_deref().ok_or(SessionError::NotConnected)
    }
}

/// Fixed reputation scores, for demos and tests
#[derive(Debug, Clone, Default)]
pub struct StaticReputation {
    scores: HashMap<String, i64>,
    default_score: i64,
}

impl StaticReputation {
    pub fn new(default_score: i64) -> Self {
        Self {
            scores: HashMap::new(),
            default_score,
        }
    }

    /// Set the raw (untrusted) score for an address
    pub fn with_score(mut self, address: impl Into<String>, raw: i64) -> Self {
        self.scores.insert(address.into().to_lowercase(), raw);
        self
    }
}

#[async_trait]
impl ReputationSource for StaticReputation {
    async fn reputation(&self, address: &str) -> Result<ReputationScore, SessionError> {
        let raw = self
            .scores
            .get(&address.to_lowercase())
            .copied()
            .unwrap_or(self.default_score);
        Ok(ReputationScore::new(raw))
    }
}
