// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! Core value types shared across the aggregator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed-width unsigned amount of voting power.
///
/// Weights, raw provider balances and aggregated sums all use this single
/// width; the weighted-sum pipeline never truncates or changes width.
pub type Power = u128;

/// Positive multiplier applied to a source's raw value before summing.
pub type Weight = u128;

/// Monotonically increasing checkpoint ordinal (e.g. a block height).
pub type BlockNumber = u64;

/// Maximum number of registered power sources, enabled and disabled combined.
pub const MAX_SOURCES: usize = 20;

/// Kind of external power source backing a registry entry.
///
/// The set is closed on purpose: adding a new provider kind is an explicit,
/// auditable extension of this enum and of the adapter dispatch, not an open
/// trait registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Sentinel for an unrecognized kind; never admitted to the registry.
    Invalid,
    /// Token-like provider with historical balance checkpointing.
    CheckpointedBalance,
    /// Staking provider reporting staked amounts per account.
    Stake,
}

impl SourceKind {
    /// Stable numeric code used on external surfaces.
    pub fn code(&self) -> u8 {
        match self {
            SourceKind::Invalid => 0,
            SourceKind::CheckpointedBalance => 1,
            SourceKind::Stake => 2,
        }
    }

    /// Map a numeric code back to a kind; unknown codes fold to `Invalid`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => SourceKind::CheckpointedBalance,
            2 => SourceKind::Stake,
            _ => SourceKind::Invalid,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Invalid => write!(f, "invalid"),
            SourceKind::CheckpointedBalance => write!(f, "checkpointed_balance"),
            SourceKind::Stake => write!(f, "stake"),
        }
    }
}

/// Point in history at which balances are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Checkpoint {
    /// The provider's most recent state.
    Latest,
    /// State as of a specific checkpoint ordinal.
    At(BlockNumber),
}

impl From<BlockNumber> for Checkpoint {
    fn from(block: BlockNumber) -> Self {
        Checkpoint::At(block)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::Latest => write!(f, "latest"),
            Checkpoint::At(block) => write!(f, "{}", block),
        }
    }
}

/// Read-model for a registered power source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSourceDetails {
    /// Declared provider kind.
    pub source_type: SourceKind,
    /// Whether the source currently participates in aggregation.
    pub enabled: bool,
    /// Multiplier applied to the source's raw values.
    pub weight: Weight,
}

/// ERC20-style metadata captured when the aggregator is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Human-readable name of the aggregated power token.
    pub name: String,
    /// Short symbol.
    pub symbol: String,
    /// Display decimals.
    pub decimals: u8,
}

impl TokenInfo {
    /// Create new token metadata.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}
