//! `%config%`: inspect and update handler configurations.
//!
//! Syntax:
//! ```text
//! %config% get <handler name>
//!
//! %config% set <handler name>
//! <configuration body, JSON>
//! ```
//!
//! `get` is resolved entirely client-side from the registry's current
//! config, with no server round-trip. `set` is persisted through the
//! configuration endpoint first and applied locally only on success.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use webdeck_api::ApiClient;
use webdeck_core::{Action, RenderModel};

use crate::handler::{ActionHandler, ConfigHandle};
use crate::sentinel::split_sentinel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ConfigVerb {
    Get,
    Set,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigRequest {
    #[serde(rename = "type")]
    kind: String,
    client_id: String,
    action: ConfigVerb,
    action_handler_name: String,
    content: Option<String>,
}

pub struct ConfigActionHandler {
    client_id: String,
    api: Arc<ApiClient>,
    configs: OnceLock<ConfigHandle>,
}

impl ConfigActionHandler {
    pub fn new(client_id: impl Into<String>, api: Arc<ApiClient>) -> Self {
        Self {
            client_id: client_id.into(),
            api,
            configs: OnceLock::new(),
        }
    }

    fn configs(&self) -> Option<&ConfigHandle> {
        self.configs.get()
    }

    fn resolve_get(&self, handler_name: &str) -> RenderModel {
        let Some(configs) = self.configs() else {
            return RenderModel::Error("config handler is not registered".into());
        };
        match configs.get(handler_name) {
            Some(config) => match serde_json::to_string_pretty(&config) {
                Ok(text) => RenderModel::PlainText(text),
                Err(err) => RenderModel::Error(format!("cannot format config: {err}")),
            },
            None => RenderModel::Error(format!(
                "config for \"{handler_name}\" does not exist"
            )),
        }
    }

    async fn resolve_set(&self, handler_name: &str, content: Option<&str>) -> RenderModel {
        let Some(configs) = self.configs() else {
            return RenderModel::Error("config handler is not registered".into());
        };
        let Some(content) = content else {
            return RenderModel::Error("config content is required".into());
        };
        let parsed: Value = match serde_json::from_str(content) {
            Ok(parsed) => parsed,
            Err(_) => return RenderModel::Error("config should be a JSON document".into()),
        };

        match self
            .api
            .update_config(handler_name, &self.client_id, &parsed)
            .await
        {
            Ok(applied) => {
                // Applied locally only after the server accepted it. Unknown
                // local names are a silent no-op, matching get/set probing.
                configs.set(handler_name, applied.clone());
                match serde_json::to_string_pretty(&applied) {
                    Ok(text) => RenderModel::PlainText(text),
                    Err(err) => RenderModel::Error(format!("cannot format config: {err}")),
                }
            }
            Err(err) => {
                debug!(handler_name, "config update rejected: {err}");
                RenderModel::Error(format!("failed to update configuration: {err}"))
            }
        }
    }
}

#[async_trait]
impl ActionHandler for ConfigActionHandler {
    fn name(&self) -> &str {
        "config"
    }

    fn recognize(&self, text: &str) -> Option<Value> {
        let line = split_sentinel(text)?;
        if line.tag != "config" {
            return None;
        }

        let mut args = line.args.split_whitespace();
        let verb = match args.next()? {
            "get" => ConfigVerb::Get,
            "set" => ConfigVerb::Set,
            _ => return None,
        };
        let handler_name = args.next()?;
        if args.next().is_some() {
            return None;
        }

        let content = match verb {
            ConfigVerb::Get => None,
            ConfigVerb::Set => Some(line.body),
        };
        serde_json::to_value(ConfigRequest {
            kind: "config".into(),
            client_id: self.client_id.clone(),
            action: verb,
            action_handler_name: handler_name.to_string(),
            content,
        })
        .ok()
    }

    fn build_render_model(&self, action: &Action) -> RenderModel {
        // Config actions resolve locally; stored ones only appear when
        // seeded from server history, with the historical response shape.
        let Some(response) = &action.response else {
            return RenderModel::Pending;
        };
        if response["succeeded"].as_bool() == Some(true) {
            RenderModel::PlainText(
                response["content"].as_str().unwrap_or_default().to_string(),
            )
        } else {
            RenderModel::Error(
                response["error_message"]
                    .as_str()
                    .unwrap_or("configuration request failed")
                    .to_string(),
            )
        }
    }

    fn on_registered(&self, configs: ConfigHandle) {
        let _ = self.configs.set(configs);
    }

    async fn try_resolve_local(&self, request: &Value) -> Option<RenderModel> {
        let request: ConfigRequest = serde_json::from_value(request.clone()).ok()?;
        if request.kind != "config" {
            return None;
        }
        Some(match request.action {
            ConfigVerb::Get => self.resolve_get(&request.action_handler_name),
            ConfigVerb::Set => {
                self.resolve_set(&request.action_handler_name, request.content.as_deref())
                    .await
            }
        })
    }
}
