//! Handler registry and command recognition.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use webdeck_core::ConsoleError;

use crate::handler::{ActionHandler, ConfigHandle};

/// Maps handler name to handler instance and owns the per-handler config
/// table. Handlers are shared; the registry never owns actions.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn ActionHandler>>,
    by_name: HashMap<String, usize>,
    configs: ConfigHandle,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Duplicate names are a programming error and fail
    /// registry construction. As a side effect the handler's registration
    /// hook runs, handing it the config-introspection handle.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) -> Result<(), ConsoleError> {
        let name = handler.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ConsoleError::DuplicateHandler(name));
        }
        self.configs.insert(&name);
        handler.on_registered(self.configs.clone());
        self.by_name.insert(name, self.handlers.len());
        self.handlers.push(handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.by_name.get(name).map(|&i| self.handlers[i].clone())
    }

    /// Handlers in registration order.
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn ActionHandler>> {
        self.handlers.iter()
    }

    /// Deep copy of a handler's config; `None` for unknown names.
    pub fn get_config(&self, name: &str) -> Option<Value> {
        self.configs.get(name)
    }

    /// Replace a handler's config. Silently ignored for unknown names.
    pub fn set_config(&self, name: &str, config: Value) -> bool {
        self.configs.set(name, config)
    }

    /// Ask each handler, in registration order, whether it recognizes the
    /// text. First match wins; at most one handler should match any given
    /// sentinel, and when several do the earliest-registered one is the
    /// documented tie-break. Unrecognized text yields `None`, no error.
    pub fn recognize(&self, text: &str) -> Option<(Arc<dyn ActionHandler>, Value)> {
        for handler in &self.handlers {
            if let Some(request) = handler.recognize(text) {
                debug!(handler = handler.name(), "command recognized");
                return Some((handler.clone(), request));
            }
        }
        debug!("no handler recognized the command");
        None
    }
}
