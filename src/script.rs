// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Agora Protocol Foundation

//! Action scripts and the executor collaborator.
//!
//! A call script is a versioned, ordered sequence of `{target, payload}`
//! actions. The aggregator treats the encoded script as opaque bytes; only
//! the executor interprets it, running actions in order and propagating the
//! first failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Wire version of the call-script encoding.
pub const CALL_SCRIPT_VERSION: u32 = 1;

/// One scripted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptAction {
    /// Address of the call target.
    pub target: String,
    /// Opaque calldata for the target.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CallScript {
    version: u32,
    actions: Vec<ScriptAction>,
}

/// Failures raised while interpreting or running a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("invalid call or selector: {0}")]
    InvalidCallOrSelector(String),

    #[error("call to {target} failed: {reason}")]
    CallFailed { target: String, reason: String },
}

/// Encode actions into an opaque call script.
pub fn encode_call_script(actions: &[ScriptAction]) -> Vec<u8> {
    let script = CallScript {
        version: CALL_SCRIPT_VERSION,
        actions: actions.to_vec(),
    };
    serde_json::to_vec(&script).unwrap()
}

/// Decode an opaque call script back into its actions.
pub fn decode_call_script(raw: &[u8]) -> Result<Vec<ScriptAction>, ExecutionError> {
    let script: CallScript = serde_json::from_slice(raw)
        .map_err(|err| ExecutionError::InvalidCallOrSelector(err.to_string()))?;
    if script.version != CALL_SCRIPT_VERSION {
        return Err(ExecutionError::InvalidCallOrSelector(format!(
            "unsupported call script version {}",
            script.version
        )));
    }
    Ok(script.actions)
}

/// Runs an approved action script on behalf of a sender.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Execute `script` for `sender`, stopping at the first failure.
    async fn run(&self, sender: &str, script: &[u8]) -> Result<(), ExecutionError>;
}

/// One callable endpoint a script action can address.
#[async_trait]
pub trait ScriptTarget: Send + Sync {
    /// Handle one scripted call.
    async fn call(&self, sender: &str, payload: &[u8]) -> Result<(), String>;
}

/// In-process executor dispatching to registered targets.
#[derive(Default)]
pub struct LocalScriptRunner {
    targets: RwLock<HashMap<String, Arc<dyn ScriptTarget>>>,
}

impl LocalScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `target` addressable from scripts under `address`.
    pub fn register_target(&self, address: &str, target: Arc<dyn ScriptTarget>) {
        self.targets.write().insert(address.to_string(), target);
    }
}

#[async_trait]
impl ScriptExecutor for LocalScriptRunner {
    async fn run(&self, sender: &str, script: &[u8]) -> Result<(), ExecutionError> {
        let actions = decode_call_script(script)?;
        for action in actions {
            let target = self.targets.read().get(&action.target).cloned();
            let target = target.ok_or_else(|| {
                ExecutionError::InvalidCallOrSelector(format!(
                    "no callable target at {}",
                    action.target
                ))
            })?;
            debug!(sender, target = %action.target, "dispatching scripted call");
            target
                .call(sender, &action.payload)
                .await
                .map_err(|reason| ExecutionError::CallFailed {
                    target: action.target.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}

/// Script target that counts its executions.
#[derive(Debug, Default)]
pub struct CountingScriptTarget {
    executions: AtomicU64,
}

impl CountingScriptTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many calls this target has received.
    pub fn count(&self) -> u64 {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptTarget for CountingScriptTarget {
    async fn call(&self, _sender: &str, _payload: &[u8]) -> Result<(), String> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
