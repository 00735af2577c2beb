// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! Bounded, append-only registry of power sources.
//!
//! Entries are never removed: historical queries must remain answerable
//! against a source's address after it is disabled. "Deletion" is only ever
//! the enabled flag. Insertion order is preserved and drives deterministic
//! iteration during aggregation.

use std::collections::HashMap;

use thiserror::Error;

use crate::adapter::SourceAdapter;
use crate::types::{PowerSourceDetails, SourceKind, Weight, MAX_SOURCES};

/// Bookkeeping failures of the source registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no power source registered at {0}")]
    NoPowerSource(String),

    #[error("power source {0} has already been added")]
    PowerSourceAlreadyAdded(String),

    #[error("registry is limited to {} power sources", MAX_SOURCES)]
    TooManyPowerSources,

    #[error("power source weight must be non-zero")]
    ZeroWeight,

    #[error("new weight equals the current weight")]
    SameWeight,

    #[error("power source {0} is not enabled")]
    SourceNotEnabled(String),

    #[error("power source {0} is not disabled")]
    SourceNotDisabled(String),

    #[error("power source type is not recognized")]
    PowerSourceTypeInvalid,
}

/// One registered power source.
#[derive(Debug, Clone)]
pub struct PowerSource {
    /// Provider address; unique within the registry.
    pub address: String,
    /// Declared provider kind; immutable after creation.
    pub kind: SourceKind,
    /// Multiplier applied to the source's raw values.
    pub weight: Weight,
    /// Whether the source participates in aggregation.
    pub enabled: bool,
    /// Bound read facade for the provider.
    pub adapter: SourceAdapter,
}

impl PowerSource {
    /// Create a new entry; sources start out enabled.
    pub fn new(address: impl Into<String>, weight: Weight, adapter: SourceAdapter) -> Self {
        Self {
            address: address.into(),
            kind: adapter.kind(),
            weight,
            enabled: true,
            adapter,
        }
    }

    /// Read-model of this entry.
    pub fn details(&self) -> PowerSourceDetails {
        PowerSourceDetails {
            source_type: self.kind,
            enabled: self.enabled,
            weight: self.weight,
        }
    }
}

/// Insertion-ordered source list plus an address index for O(1) lookups.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<PowerSource>,
    index: HashMap<String, usize>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a prospective addition without mutating anything.
    ///
    /// Check order matches the admission sequence: kind, weight, duplicate,
    /// bound. Callers run this before paying for the external dry-run.
    pub fn check_addition(
        &self,
        address: &str,
        kind: SourceKind,
        weight: Weight,
    ) -> Result<(), RegistryError> {
        if kind == SourceKind::Invalid {
            return Err(RegistryError::PowerSourceTypeInvalid);
        }
        if weight == 0 {
            return Err(RegistryError::ZeroWeight);
        }
        if self.index.contains_key(address) {
            return Err(RegistryError::PowerSourceAlreadyAdded(address.to_string()));
        }
        if self.sources.len() >= MAX_SOURCES {
            return Err(RegistryError::TooManyPowerSources);
        }
        Ok(())
    }

    /// Append a new source.
    pub fn insert(&mut self, source: PowerSource) -> Result<(), RegistryError> {
        self.check_addition(&source.address, source.kind, source.weight)?;
        self.index.insert(source.address.clone(), self.sources.len());
        self.sources.push(source);
        Ok(())
    }

    /// Change a source's weight, returning the previous weight.
    ///
    /// No-op changes are rejected, not silently accepted.
    pub fn change_weight(
        &mut self,
        address: &str,
        new_weight: Weight,
    ) -> Result<Weight, RegistryError> {
        if new_weight == 0 {
            return Err(RegistryError::ZeroWeight);
        }
        let source = self.entry_mut(address)?;
        if source.weight == new_weight {
            return Err(RegistryError::SameWeight);
        }
        let old_weight = source.weight;
        source.weight = new_weight;
        Ok(old_weight)
    }

    /// Exclude a source from future-computed aggregation.
    pub fn disable(&mut self, address: &str) -> Result<(), RegistryError> {
        let source = self.entry_mut(address)?;
        if !source.enabled {
            return Err(RegistryError::SourceNotEnabled(address.to_string()));
        }
        source.enabled = false;
        Ok(())
    }

    /// Re-include a previously disabled source.
    pub fn enable(&mut self, address: &str) -> Result<(), RegistryError> {
        let source = self.entry_mut(address)?;
        if source.enabled {
            return Err(RegistryError::SourceNotDisabled(address.to_string()));
        }
        source.enabled = true;
        Ok(())
    }

    /// Entry at `address`, if registered.
    pub fn get(&self, address: &str) -> Option<&PowerSource> {
        self.index.get(address).map(|slot| &self.sources[*slot])
    }

    /// Read-model for the source at `address`.
    pub fn details(&self, address: &str) -> Result<PowerSourceDetails, RegistryError> {
        self.get(address)
            .map(PowerSource::details)
            .ok_or_else(|| RegistryError::NoPowerSource(address.to_string()))
    }

    /// Number of registered sources, enabled and disabled combined.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Address of the source at `index` in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn address_at(&self, index: usize) -> &str {
        &self.sources[index].address
    }

    /// All sources in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PowerSource> {
        self.sources.iter()
    }

    /// Currently enabled sources in insertion order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &PowerSource> {
        self.sources.iter().filter(|source| source.enabled)
    }

    fn entry_mut(&mut self, address: &str) -> Result<&mut PowerSource, RegistryError> {
        match self.index.get(address) {
            Some(slot) => Ok(&mut self.sources[*slot]),
            None => Err(RegistryError::NoPowerSource(address.to_string())),
        }
    }
}
