//! The polymorphic action handler contract.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use webdeck_core::{Action, PushEvent, RenderModel};

/// Shared per-handler configuration table.
///
/// Handlers receive a clone at registration time; it is the one sanctioned
/// path back toward the registry and is limited to config introspection.
/// All accessors deal in independent deep copies; internal state is never
/// aliased out.
#[derive(Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl ConfigHandle {
    /// Seed an (empty) config slot for a newly registered handler.
    pub(crate) fn insert(&self, name: &str) {
        let mut table = self.inner.write().unwrap_or_else(|e| e.into_inner());
        table
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }

    /// Deep copy of the named handler's config. Unknown names yield `None`
    /// rather than an error, since config handlers probe arbitrary names.
    pub fn get(&self, name: &str) -> Option<Value> {
        let table = self.inner.read().unwrap_or_else(|e| e.into_inner());
        table.get(name).cloned()
    }

    /// Replace the named handler's config with a deep copy of `config`.
    /// Returns false (and changes nothing) for unknown names.
    pub fn set(&self, name: &str, config: Value) -> bool {
        let mut table = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match table.get_mut(name) {
            Some(slot) => {
                *slot = config;
                true
            }
            None => false,
        }
    }
}

/// One pluggable command policy: recognizes a sentinel syntax, shapes the
/// request, merges completion events and describes how results render.
///
/// The trait bound is the capability check: a variant that misses a method
/// does not compile, so there are no runtime "not implemented" stubs.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Stable unique identifier; the registry enforces uniqueness.
    fn name(&self) -> &str;

    /// Try to extract a request from raw input text.
    ///
    /// Pure: no side effects, and malformed-but-plausible input yields
    /// `None`, never an error.
    fn recognize(&self, text: &str) -> Option<Value>;

    /// Describe how to display the action. Must treat a missing response
    /// (pending) distinctly from a present-but-error response.
    fn build_render_model(&self, action: &Action) -> RenderModel;

    /// Merge a channel event into the action.
    ///
    /// The default is the standard merge: whole response completes, chunks
    /// merge replace-at-position, the terminal event completes. Must stay
    /// idempotent-safe under duplicate delivery. Implementations may only
    /// touch response and completion state, never identity fields.
    async fn on_completed(&self, action: &mut Action, event: &PushEvent) -> Result<()> {
        action.apply_event(event);
        Ok(())
    }

    /// Registration hook. The handle is for config introspection only.
    fn on_registered(&self, _configs: ConfigHandle) {}

    /// Handlers able to satisfy a request without the remote execution
    /// boundary return the finished render model here; the session then
    /// skips submission entirely.
    async fn try_resolve_local(&self, _request: &Value) -> Option<RenderModel> {
        None
    }
}
