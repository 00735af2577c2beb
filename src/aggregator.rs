// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! The power aggregator: registry administration, weighted aggregation and
//! the forwarding gate.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::acl::{PermissionOracle, Role};
use crate::adapter::SourceAdapter;
use crate::events::{AggregatorEvent, AggregatorEventKind, EventSink};
use crate::provider::{ProviderDirectory, ProviderError};
use crate::registry::{PowerSource, RegistryError, SourceRegistry};
use crate::script::{ExecutionError, ScriptExecutor};
use crate::types::{
    BlockNumber, Checkpoint, Power, PowerSourceDetails, SourceKind, TokenInfo, Weight,
};

/// Failures surfaced by the aggregator's entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("aggregator is not initialized")]
    NotInitialized,

    #[error("aggregator is already initialized")]
    AlreadyInitialized,

    #[error("{who} lacks the {role} capability")]
    NotPermitted { who: String, role: Role },

    #[error("power source {address} is invalid: {reason}")]
    PowerSourceInvalid { address: String, reason: String },

    #[error("source call to {address} failed")]
    SourceCallFailed {
        address: String,
        #[source]
        source: ProviderError,
    },

    #[error("weighted power sum overflowed")]
    ArithmeticOverflow,

    #[error("{account} holds no voting power to forward with")]
    CanNotForward { account: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

#[derive(Debug, Default)]
struct AggregatorState {
    token: Option<TokenInfo>,
    registry: SourceRegistry,
}

impl AggregatorState {
    fn ensure_initialized(&self) -> Result<(), AggregatorError> {
        if self.token.is_none() {
            return Err(AggregatorError::NotInitialized);
        }
        Ok(())
    }
}

/// Aggregates weighted voting power over registered sources and gates
/// forwarded execution on it.
///
/// Administrative mutations take the write lock; every query holds the read
/// lock across its whole provider fan-out and never observes a partially
/// applied mutation.
pub struct PowerAggregator {
    permissions: Arc<dyn PermissionOracle>,
    directory: Arc<dyn ProviderDirectory>,
    executor: Arc<dyn ScriptExecutor>,
    events: Arc<dyn EventSink>,
    state: RwLock<AggregatorState>,
}

impl PowerAggregator {
    /// Create an uninitialized aggregator wired to its collaborators.
    pub fn new(
        permissions: Arc<dyn PermissionOracle>,
        directory: Arc<dyn ProviderDirectory>,
        executor: Arc<dyn ScriptExecutor>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            permissions,
            directory,
            executor,
            events,
            state: RwLock::new(AggregatorState::default()),
        }
    }

    /// One-shot initialization of the aggregated-token metadata.
    pub async fn initialize(
        &self,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Result<(), AggregatorError> {
        let mut state = self.state.write().await;
        if state.token.is_some() {
            return Err(AggregatorError::AlreadyInitialized);
        }
        state.token = Some(TokenInfo::new(name, symbol, decimals));
        info!(name, symbol, decimals, "power aggregator initialized");
        Ok(())
    }

    /// Whether `initialize` has completed.
    pub async fn has_initialized(&self) -> bool {
        self.state.read().await.token.is_some()
    }

    /// Metadata captured at initialization.
    pub async fn token_info(&self) -> Result<TokenInfo, AggregatorError> {
        let state = self.state.read().await;
        state.token.clone().ok_or(AggregatorError::NotInitialized)
    }

    pub async fn name(&self) -> Result<String, AggregatorError> {
        Ok(self.token_info().await?.name)
    }

    pub async fn symbol(&self) -> Result<String, AggregatorError> {
        Ok(self.token_info().await?.symbol)
    }

    pub async fn decimals(&self) -> Result<u8, AggregatorError> {
        Ok(self.token_info().await?.decimals)
    }

    /// Register a new power source.
    ///
    /// Bookkeeping checks run first (kind, weight, duplicate, bound); only
    /// then is the address resolved and dry-run against its declared read
    /// surface.
    pub async fn add_power_source(
        &self,
        caller: &str,
        address: &str,
        kind: SourceKind,
        weight: Weight,
    ) -> Result<(), AggregatorError> {
        self.require_role(caller, Role::AddPowerSource).await?;
        let mut state = self.state.write().await;
        state.ensure_initialized()?;
        state.registry.check_addition(address, kind, weight)?;

        let adapter = SourceAdapter::bind(self.directory.as_ref(), address, kind).ok_or_else(
            || AggregatorError::PowerSourceInvalid {
                address: address.to_string(),
                reason: format!("no provider with the {kind} interface at this address"),
            },
        )?;
        adapter
            .health_check()
            .await
            .map_err(|err| AggregatorError::PowerSourceInvalid {
                address: address.to_string(),
                reason: err.to_string(),
            })?;

        state
            .registry
            .insert(PowerSource::new(address, weight, adapter))?;
        info!(address, %kind, weight, "power source added");
        self.emit(AggregatorEventKind::SourceAdded {
            address: address.to_string(),
            source_type: kind,
            weight,
        });
        Ok(())
    }

    /// Change a registered source's weight.
    pub async fn change_source_weight(
        &self,
        caller: &str,
        address: &str,
        new_weight: Weight,
    ) -> Result<(), AggregatorError> {
        self.require_role(caller, Role::ManageWeights).await?;
        let mut state = self.state.write().await;
        state.ensure_initialized()?;
        let old_weight = state.registry.change_weight(address, new_weight)?;
        info!(address, old_weight, new_weight, "power source weight changed");
        self.emit(AggregatorEventKind::WeightChanged {
            address: address.to_string(),
            old_weight,
            new_weight,
        });
        Ok(())
    }

    /// Exclude a source from aggregation until it is explicitly re-enabled.
    pub async fn disable_source(&self, caller: &str, address: &str) -> Result<(), AggregatorError> {
        self.require_role(caller, Role::ManagePowerSource).await?;
        let mut state = self.state.write().await;
        state.ensure_initialized()?;
        state.registry.disable(address)?;
        info!(address, "power source disabled");
        self.emit(AggregatorEventKind::SourceDisabled {
            address: address.to_string(),
        });
        Ok(())
    }

    /// Re-include a previously disabled source.
    pub async fn enable_source(&self, caller: &str, address: &str) -> Result<(), AggregatorError> {
        self.require_role(caller, Role::ManagePowerSource).await?;
        let mut state = self.state.write().await;
        state.ensure_initialized()?;
        state.registry.enable(address)?;
        info!(address, "power source enabled");
        self.emit(AggregatorEventKind::SourceEnabled {
            address: address.to_string(),
        });
        Ok(())
    }

    /// Number of registered sources, enabled and disabled combined.
    pub async fn get_power_sources_length(&self) -> Result<usize, AggregatorError> {
        let state = self.state.read().await;
        state.ensure_initialized()?;
        Ok(state.registry.len())
    }

    /// Address of the source at `index` in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub async fn power_source_at(&self, index: usize) -> Result<String, AggregatorError> {
        let state = self.state.read().await;
        state.ensure_initialized()?;
        Ok(state.registry.address_at(index).to_string())
    }

    /// Details for the source at `address`.
    pub async fn get_power_source_details(
        &self,
        address: &str,
    ) -> Result<PowerSourceDetails, AggregatorError> {
        let state = self.state.read().await;
        state.ensure_initialized()?;
        Ok(state.registry.details(address)?)
    }

    /// `account`'s current aggregated power.
    pub async fn balance_of(&self, account: &str) -> Result<Power, AggregatorError> {
        self.aggregate(Some(account), Checkpoint::Latest).await
    }

    /// `account`'s aggregated power as of checkpoint `at`.
    pub async fn balance_of_at(
        &self,
        account: &str,
        at: BlockNumber,
    ) -> Result<Power, AggregatorError> {
        self.aggregate(Some(account), Checkpoint::At(at)).await
    }

    /// Current aggregated total power.
    pub async fn total_supply(&self) -> Result<Power, AggregatorError> {
        self.aggregate(None, Checkpoint::Latest).await
    }

    /// Aggregated total power as of checkpoint `at`.
    pub async fn total_supply_at(&self, at: BlockNumber) -> Result<Power, AggregatorError> {
        self.aggregate(None, Checkpoint::At(at)).await
    }

    /// The aggregator always offers the forwarding surface.
    pub fn is_forwarder(&self) -> bool {
        true
    }

    /// Capability probe: whether `account` could forward right now.
    ///
    /// Never fails: any internal failure (uninitialized state, a broken
    /// source, overflow) reads as "cannot forward". `forward` deliberately
    /// does not share this masking.
    pub async fn can_forward(&self, account: &str, _how: &[u8]) -> bool {
        self.balance_of(account)
            .await
            .map(|power| power > 0)
            .unwrap_or(false)
    }

    /// Execute an action script on behalf of `caller`.
    ///
    /// Re-checks current power; a zero-power caller fails `CanNotForward`,
    /// a failing aggregation propagates as-is, and executor failures pass
    /// through unchanged.
    pub async fn forward(&self, caller: &str, script: &[u8]) -> Result<(), AggregatorError> {
        let power = self.balance_of(caller).await?;
        if power == 0 {
            warn!(caller, "forward rejected: no voting power");
            return Err(AggregatorError::CanNotForward {
                account: caller.to_string(),
            });
        }
        info!(caller, power, "forwarding action script");
        self.executor.run(caller, script).await?;
        Ok(())
    }

    /// Weighted fold over the currently enabled sources, in insertion order.
    ///
    /// Inclusion is governed by the enabled flag as of this call, including
    /// for historical checkpoints. The fold short-circuits: the first failing
    /// source read aborts the whole query, and every term uses checked
    /// arithmetic.
    async fn aggregate(
        &self,
        account: Option<&str>,
        at: Checkpoint,
    ) -> Result<Power, AggregatorError> {
        let state = self.state.read().await;
        state.ensure_initialized()?;

        let mut total: Power = 0;
        for source in state.registry.enabled_sources() {
            let value = match account {
                Some(account) => source.adapter.balance(account, at).await,
                None => source.adapter.total(at).await,
            }
            .map_err(|err| {
                warn!(address = %source.address, %err, %at, "source read failed during aggregation");
                AggregatorError::SourceCallFailed {
                    address: source.address.clone(),
                    source: err,
                }
            })?;

            let weighted = source
                .weight
                .checked_mul(value)
                .ok_or(AggregatorError::ArithmeticOverflow)?;
            total = total
                .checked_add(weighted)
                .ok_or(AggregatorError::ArithmeticOverflow)?;
        }
        Ok(total)
    }

    async fn require_role(&self, who: &str, role: Role) -> Result<(), AggregatorError> {
        if self.permissions.can_perform(who, role).await {
            return Ok(());
        }
        warn!(who, %role, "administrative call rejected");
        Err(AggregatorError::NotPermitted {
            who: who.to_string(),
            role,
        })
    }

    fn emit(&self, kind: AggregatorEventKind) {
        self.events.record(AggregatorEvent::new(kind));
    }
}
