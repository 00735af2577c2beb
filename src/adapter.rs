// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! Uniform read facade over the two provider kinds.
//!
//! The adapter is a tagged variant, not open-ended dispatch: only two kinds
//! exist, and a new kind requires an explicit extension of `SourceKind` and
//! of the match arms below.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::provider::{
    CheckpointedBalanceSource, ProviderDirectory, ProviderError, StakeSource,
};
use crate::types::{Checkpoint, Power, SourceKind};

/// Account used for the registration-time dry-run read.
const HEALTH_CHECK_ACCOUNT: &str = "0x0000000000000000000000000000000000000000";

enum SourceBinding {
    Checkpointed(Arc<dyn CheckpointedBalanceSource>),
    Stake(Arc<dyn StakeSource>),
}

impl Clone for SourceBinding {
    fn clone(&self) -> Self {
        match self {
            SourceBinding::Checkpointed(source) => SourceBinding::Checkpointed(source.clone()),
            SourceBinding::Stake(source) => SourceBinding::Stake(source.clone()),
        }
    }
}

/// Read facade over one bound provider connection.
#[derive(Clone)]
pub struct SourceAdapter {
    binding: SourceBinding,
}

impl SourceAdapter {
    /// Resolve `address` against the directory for the declared `kind`.
    ///
    /// Returns `None` when no provider with the declared interface exists at
    /// the address, covering both "not a contract" and "wrong interface for
    /// the declared kind". `SourceKind::Invalid` never binds.
    pub fn bind(
        directory: &dyn ProviderDirectory,
        address: &str,
        kind: SourceKind,
    ) -> Option<Self> {
        let binding = match kind {
            SourceKind::Invalid => return None,
            SourceKind::CheckpointedBalance => {
                SourceBinding::Checkpointed(directory.checkpointed_token(address)?)
            }
            SourceKind::Stake => SourceBinding::Stake(directory.staking(address)?),
        };
        Some(Self { binding })
    }

    /// Declared kind of the bound provider.
    pub fn kind(&self) -> SourceKind {
        match &self.binding {
            SourceBinding::Checkpointed(_) => SourceKind::CheckpointedBalance,
            SourceBinding::Stake(_) => SourceKind::Stake,
        }
    }

    /// Registration-time dry run of the minimal read surface.
    ///
    /// Exercises both required reads at `Latest`; a provider that cannot
    /// serve them is rejected before it ever enters the registry.
    pub async fn health_check(&self) -> Result<(), ProviderError> {
        let probe = self.balance(HEALTH_CHECK_ACCOUNT, Checkpoint::Latest).await;
        if let Err(err) = &probe {
            debug!(%err, "source health check failed on account read");
        }
        probe?;
        let probe = self.total(Checkpoint::Latest).await;
        if let Err(err) = &probe {
            debug!(%err, "source health check failed on total read");
        }
        probe?;
        Ok(())
    }

    /// `account`'s raw value in this source as of `at`.
    pub async fn balance(&self, account: &str, at: Checkpoint) -> Result<Power, ProviderError> {
        match (&self.binding, at) {
            (SourceBinding::Checkpointed(source), Checkpoint::Latest) => {
                source.balance_of(account).await
            }
            (SourceBinding::Checkpointed(source), Checkpoint::At(block)) => {
                source.balance_of_at(account, block).await
            }
            (SourceBinding::Stake(source), Checkpoint::Latest) => {
                source.total_staked_for(account).await
            }
            (SourceBinding::Stake(source), Checkpoint::At(block)) => {
                source.total_staked_for_at(account, block).await
            }
        }
    }

    /// The source's raw total as of `at`.
    pub async fn total(&self, at: Checkpoint) -> Result<Power, ProviderError> {
        match (&self.binding, at) {
            (SourceBinding::Checkpointed(source), Checkpoint::Latest) => {
                source.total_supply().await
            }
            (SourceBinding::Checkpointed(source), Checkpoint::At(block)) => {
                source.total_supply_at(block).await
            }
            (SourceBinding::Stake(source), Checkpoint::Latest) => source.total_staked().await,
            (SourceBinding::Stake(source), Checkpoint::At(block)) => {
                source.total_staked_at(block).await
            }
        }
    }
}

impl fmt::Debug for SourceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("kind", &self.kind())
            .finish()
    }
}
