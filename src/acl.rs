// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! Capability gate for the administrative surface.
//!
//! The actual permission system lives in the hosting framework; the
//! aggregator only asks a yes/no question per call. Authorization failures
//! short-circuit every other validation.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Administrative capabilities, one per gated entry point group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May register new power sources.
    AddPowerSource,
    /// May enable and disable registered sources.
    ManagePowerSource,
    /// May change source weights.
    ManageWeights,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::AddPowerSource => write!(f, "add_power_source"),
            Role::ManagePowerSource => write!(f, "manage_power_source"),
            Role::ManageWeights => write!(f, "manage_weights"),
        }
    }
}

/// Boolean capability check supplied by the hosting framework.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// Whether `who` holds `role`.
    async fn can_perform(&self, who: &str, role: Role) -> bool;
}

/// Grant-table oracle for tests and static deployments.
#[derive(Debug, Default)]
pub struct StaticPermissions {
    grants: RwLock<HashMap<Role, HashSet<String>>>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `role` to `who`.
    pub fn grant(&self, who: &str, role: Role) {
        self.grants
            .write()
            .entry(role)
            .or_default()
            .insert(who.to_string());
    }

    /// Grant all three roles to `who`.
    pub fn grant_all(&self, who: &str) {
        for role in [Role::AddPowerSource, Role::ManagePowerSource, Role::ManageWeights] {
            self.grant(who, role);
        }
    }

    /// Revoke `role` from `who`.
    pub fn revoke(&self, who: &str, role: Role) {
        if let Some(holders) = self.grants.write().get_mut(&role) {
            holders.remove(who);
        }
    }
}

#[async_trait]
impl PermissionOracle for StaticPermissions {
    async fn can_perform(&self, who: &str, role: Role) -> bool {
        self.grants
            .read()
            .get(&role)
            .map(|holders| holders.contains(who))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grants_are_per_role() {
        let permissions = StaticPermissions::new();
        permissions.grant("root", Role::AddPowerSource);

        assert!(permissions.can_perform("root", Role::AddPowerSource).await);
        assert!(!permissions.can_perform("root", Role::ManageWeights).await);
        assert!(!permissions.can_perform("someone", Role::AddPowerSource).await);
    }

    #[tokio::test]
    async fn revoke_removes_a_single_grant() {
        let permissions = StaticPermissions::new();
        permissions.grant_all("root");
        permissions.revoke("root", Role::ManagePowerSource);

        assert!(permissions.can_perform("root", Role::AddPowerSource).await);
        assert!(!permissions.can_perform("root", Role::ManagePowerSource).await);
    }
}
