// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! Read contracts of the external power-source providers.
//!
//! The aggregator never owns historical state itself; it reads it from these
//! collaborators. A failed read is reported as-is: no retry, no fallback to
//! zero.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{BlockNumber, Power};

/// Failure of a single provider read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider call reverted: {0}")]
    Reverted(String),

    #[error("provider call exhausted its execution budget")]
    BudgetExhausted,

    #[error("provider returned malformed data: {0}")]
    MalformedReturn(String),
}

/// Token-like provider with historical balance checkpointing.
#[async_trait]
pub trait CheckpointedBalanceSource: Send + Sync {
    /// Current balance of `holder`.
    async fn balance_of(&self, holder: &str) -> Result<Power, ProviderError>;

    /// Balance of `holder` as of checkpoint `at`.
    async fn balance_of_at(&self, holder: &str, at: BlockNumber) -> Result<Power, ProviderError>;

    /// Current total supply.
    async fn total_supply(&self) -> Result<Power, ProviderError>;

    /// Total supply as of checkpoint `at`.
    async fn total_supply_at(&self, at: BlockNumber) -> Result<Power, ProviderError>;
}

/// Staking provider reporting staked amounts per account.
#[async_trait]
pub trait StakeSource: Send + Sync {
    /// Current total staked for `staker`.
    async fn total_staked_for(&self, staker: &str) -> Result<Power, ProviderError>;

    /// Total staked for `staker` as of checkpoint `at`.
    async fn total_staked_for_at(
        &self,
        staker: &str,
        at: BlockNumber,
    ) -> Result<Power, ProviderError>;

    /// Current total staked across all accounts.
    async fn total_staked(&self) -> Result<Power, ProviderError>;

    /// Total staked across all accounts as of checkpoint `at`.
    async fn total_staked_at(&self, at: BlockNumber) -> Result<Power, ProviderError>;
}

/// Resolves registered addresses to live provider connections.
///
/// Resolution doubles as the interface check performed at registration: an
/// address that resolves to `None` for the declared kind either hosts no
/// provider at all or hosts one with a different read surface.
pub trait ProviderDirectory: Send + Sync {
    /// Connection to a checkpointed-balance provider at `address`, if one
    /// with that interface exists there.
    fn checkpointed_token(&self, address: &str) -> Option<Arc<dyn CheckpointedBalanceSource>>;

    /// Connection to a staking provider at `address`, if one with that
    /// interface exists there.
    fn staking(&self, address: &str) -> Option<Arc<dyn StakeSource>>;
}

/// Per-account checkpoint history shared by the mock providers.
///
/// A query at checkpoint `c` returns the value recorded at the greatest
/// ordinal less than or equal to `c`, zero if none.
#[derive(Debug, Default)]
struct CheckpointHistory {
    per_account: HashMap<String, BTreeMap<BlockNumber, Power>>,
}

impl CheckpointHistory {
    fn record(&mut self, account: &str, at: BlockNumber, value: Power) {
        self.per_account
            .entry(account.to_string())
            .or_default()
            .insert(at, value);
    }

    fn value_at(&self, account: &str, at: BlockNumber) -> Power {
        self.per_account
            .get(account)
            .and_then(|series| series.range(..=at).next_back())
            .map(|(_, value)| *value)
            .unwrap_or(0)
    }

    fn value_latest(&self, account: &str) -> Power {
        self.per_account
            .get(account)
            .and_then(|series| series.values().next_back())
            .copied()
            .unwrap_or(0)
    }

    fn total_at(&self, at: BlockNumber) -> Power {
        self.per_account
            .keys()
            .map(|account| self.value_at(account, at))
            .sum()
    }

    fn total_latest(&self) -> Power {
        self.per_account
            .keys()
            .map(|account| self.value_latest(account))
            .sum()
    }
}

#[derive(Debug, Default)]
struct MockSourceState {
    history: CheckpointHistory,
    account_reads_disabled: bool,
    total_reads_disabled: bool,
}

impl MockSourceState {
    fn account_value(&self, account: &str, at: Option<BlockNumber>) -> Result<Power, ProviderError> {
        if self.account_reads_disabled {
            return Err(ProviderError::Reverted("account read disabled".to_string()));
        }
        Ok(match at {
            Some(at) => self.history.value_at(account, at),
            None => self.history.value_latest(account),
        })
    }

    fn total_value(&self, at: Option<BlockNumber>) -> Result<Power, ProviderError> {
        if self.total_reads_disabled {
            return Err(ProviderError::Reverted("total read disabled".to_string()));
        }
        Ok(match at {
            Some(at) => self.history.total_at(at),
            None => self.history.total_latest(),
        })
    }
}

/// In-memory checkpointed token for tests and local wiring.
///
/// Individual read families can be switched off to simulate a provider whose
/// views revert.
#[derive(Debug, Default)]
pub struct MockCheckpointedToken {
    state: RwLock<MockSourceState>,
}

impl MockCheckpointedToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `holder`'s balance as of checkpoint `at`.
    pub fn set_balance_at(&self, holder: &str, at: BlockNumber, value: Power) {
        self.state.write().history.record(holder, at, value);
    }

    /// Make every balance read revert from now on.
    pub fn disable_balance_reads(&self) {
        self.state.write().account_reads_disabled = true;
    }

    /// Make every total-supply read revert from now on.
    pub fn disable_total_reads(&self) {
        self.state.write().total_reads_disabled = true;
    }
}

#[async_trait]
impl CheckpointedBalanceSource for MockCheckpointedToken {
    async fn balance_of(&self, holder: &str) -> Result<Power, ProviderError> {
        self.state.read().account_value(holder, None)
    }

    async fn balance_of_at(&self, holder: &str, at: BlockNumber) -> Result<Power, ProviderError> {
        self.state.read().account_value(holder, Some(at))
    }

    async fn total_supply(&self) -> Result<Power, ProviderError> {
        self.state.read().total_value(None)
    }

    async fn total_supply_at(&self, at: BlockNumber) -> Result<Power, ProviderError> {
        self.state.read().total_value(Some(at))
    }
}

/// In-memory staking ledger for tests and local wiring.
#[derive(Debug, Default)]
pub struct MockStakingLedger {
    state: RwLock<MockSourceState>,
}

impl MockStakingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `staker`'s staked amount as of checkpoint `at`.
    pub fn set_stake_at(&self, staker: &str, at: BlockNumber, value: Power) {
        self.state.write().history.record(staker, at, value);
    }

    /// Make every per-staker read revert from now on.
    pub fn disable_stake_reads(&self) {
        self.state.write().account_reads_disabled = true;
    }

    /// Make every total-staked read revert from now on.
    pub fn disable_total_reads(&self) {
        self.state.write().total_reads_disabled = true;
    }
}

#[async_trait]
impl StakeSource for MockStakingLedger {
    async fn total_staked_for(&self, staker: &str) -> Result<Power, ProviderError> {
        self.state.read().account_value(staker, None)
    }

    async fn total_staked_for_at(
        &self,
        staker: &str,
        at: BlockNumber,
    ) -> Result<Power, ProviderError> {
        self.state.read().account_value(staker, Some(at))
    }

    async fn total_staked(&self) -> Result<Power, ProviderError> {
        self.state.read().total_value(None)
    }

    async fn total_staked_at(&self, at: BlockNumber) -> Result<Power, ProviderError> {
        self.state.read().total_value(Some(at))
    }
}

/// Directory with explicitly wired provider connections.
#[derive(Default)]
pub struct StaticProviderDirectory {
    tokens: RwLock<HashMap<String, Arc<dyn CheckpointedBalanceSource>>>,
    staking: RwLock<HashMap<String, Arc<dyn StakeSource>>>,
}

impl StaticProviderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire a checkpointed-balance provider at `address`.
    pub fn register_token(&self, address: &str, source: Arc<dyn CheckpointedBalanceSource>) {
        self.tokens.write().insert(address.to_string(), source);
    }

    /// Wire a staking provider at `address`.
    pub fn register_staking(&self, address: &str, source: Arc<dyn StakeSource>) {
        self.staking.write().insert(address.to_string(), source);
    }
}

impl ProviderDirectory for StaticProviderDirectory {
    fn checkpointed_token(&self, address: &str) -> Option<Arc<dyn CheckpointedBalanceSource>> {
        self.tokens.read().get(address).cloned()
    }

    fn staking(&self, address: &str) -> Option<Arc<dyn StakeSource>> {
        self.staking.read().get(address).cloned()
    }
}
