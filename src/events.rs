// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! Observable administrative events.
//!
//! Every successful registry mutation emits exactly one event; queries emit
//! nothing.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::types::{SourceKind, Weight};

/// Payload of an administrative event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregatorEventKind {
    /// A power source was registered.
    SourceAdded {
        address: String,
        source_type: SourceKind,
        weight: Weight,
    },
    /// A source's weight changed.
    WeightChanged {
        address: String,
        old_weight: Weight,
        new_weight: Weight,
    },
    /// A source was excluded from aggregation.
    SourceDisabled { address: String },
    /// A previously disabled source was re-included.
    SourceEnabled { address: String },
}

/// One emitted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorEvent {
    /// Unique event id.
    pub id: Uuid,
    /// When the event was emitted.
    pub at: DateTime<Utc>,
    /// What happened.
    pub kind: AggregatorEventKind,
}

impl AggregatorEvent {
    /// Wrap a payload with a fresh id and timestamp.
    pub fn new(kind: AggregatorEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            kind,
        }
    }
}

/// Destination for emitted events.
pub trait EventSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: AggregatorEvent);
}

/// Sink that logs events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingEventSink {
    fn record(&self, event: AggregatorEvent) {
        match &event.kind {
            AggregatorEventKind::SourceAdded {
                address,
                source_type,
                weight,
            } => info!(%address, %source_type, weight, "power source added"),
            AggregatorEventKind::WeightChanged {
                address,
                old_weight,
                new_weight,
            } => info!(%address, old_weight, new_weight, "power source weight changed"),
            AggregatorEventKind::SourceDisabled { address } => {
                info!(%address, "power source disabled")
            }
            AggregatorEventKind::SourceEnabled { address } => {
                info!(%address, "power source enabled")
            }
        }
    }
}

/// Sink that retains events in memory so callers can assert on them.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: RwLock<Vec<AggregatorEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<AggregatorEvent> {
        self.events.read().clone()
    }

    /// Payloads only, in emission order.
    pub fn kinds(&self) -> Vec<AggregatorEventKind> {
        self.events.read().iter().map(|e| e.kind.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: AggregatorEvent) {
        self.events.write().push(event);
    }
}
