// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

//! Voting-power aggregation core for the Agora governance protocol.
//!
//! The aggregator combines balances from independently-governed power
//! sources (checkpointed token balances or staked amounts) into a single
//! weighted, time-queryable power ledger, and gates forwarded execution of
//! action scripts on an account holding non-zero aggregate power.

pub mod acl;
pub mod adapter;
pub mod aggregator;
pub mod events;
pub mod provider;
pub mod registry;
pub mod script;
pub mod types;

// Re-export common types
pub use acl::{PermissionOracle, Role, StaticPermissions};
pub use adapter::SourceAdapter;
pub use aggregator::{AggregatorError, PowerAggregator};
pub use events::{
    AggregatorEvent, AggregatorEventKind, EventSink, MemoryEventSink, TracingEventSink,
};
pub use provider::{
    CheckpointedBalanceSource, MockCheckpointedToken, MockStakingLedger, ProviderDirectory,
    ProviderError, StakeSource, StaticProviderDirectory,
};
pub use registry::{PowerSource, RegistryError, SourceRegistry};
pub use script::{
    decode_call_script, encode_call_script, CountingScriptTarget, ExecutionError,
    LocalScriptRunner, ScriptAction, ScriptExecutor, ScriptTarget, CALL_SCRIPT_VERSION,
};
pub use types::{
    BlockNumber, Checkpoint, Power, PowerSourceDetails, SourceKind, TokenInfo, Weight,
    MAX_SOURCES,
};

use std::sync::Arc;

/// Create an aggregator that reports events through `tracing`.
pub fn create_power_aggregator(
    permissions: Arc<dyn PermissionOracle>,
    directory: Arc<dyn ProviderDirectory>,
    executor: Arc<dyn ScriptExecutor>,
) -> Arc<PowerAggregator> {
    create_power_aggregator_with_events(
        permissions,
        directory,
        executor,
        Arc::new(TracingEventSink::new()),
    )
}

/// Create an aggregator with a custom event sink.
pub fn create_power_aggregator_with_events(
    permissions: Arc<dyn PermissionOracle>,
    directory: Arc<dyn ProviderDirectory>,
    executor: Arc<dyn ScriptExecutor>,
    events: Arc<dyn EventSink>,
) -> Arc<PowerAggregator> {
    Arc::new(PowerAggregator::new(permissions, directory, executor, events))
}
