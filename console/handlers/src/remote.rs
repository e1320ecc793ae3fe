//! `%pyspark%` / `%bash%` / `%system%`: commands executed on a remote
//! interactive compute session.
//!
//! The target server id comes from this handler's own config; the remote
//! side re-parses the sentinel, so the request carries the full raw text.

use std::sync::OnceLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use webdeck_core::{Action, RenderModel};

use crate::handler::{ActionHandler, ConfigHandle};
use crate::sentinel::split_sentinel;

const TAGS: [&str; 3] = ["pyspark", "bash", "system"];

#[derive(Debug, Serialize, Deserialize)]
struct RemoteSessionRequest {
    #[serde(rename = "type")]
    kind: String,
    client_id: String,
    server_id: String,
    command_text: String,
}

pub struct RemoteSessionActionHandler {
    client_id: String,
    configs: OnceLock<ConfigHandle>,
}

impl RemoteSessionActionHandler {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            configs: OnceLock::new(),
        }
    }

    fn server_id(&self) -> String {
        self.configs
            .get()
            .and_then(|configs| configs.get(self.name()))
            .and_then(|config| {
                config
                    .get("server_id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ActionHandler for RemoteSessionActionHandler {
    fn name(&self) -> &str {
        "pyspark"
    }

    fn recognize(&self, text: &str) -> Option<Value> {
        let line = split_sentinel(text)?;
        if !TAGS.contains(&line.tag) || !line.args.is_empty() {
            return None;
        }
        serde_json::to_value(RemoteSessionRequest {
            kind: "spark-cli".into(),
            client_id: self.client_id.clone(),
            server_id: self.server_id(),
            command_text: text.to_string(),
        })
        .ok()
    }

    fn build_render_model(&self, action: &Action) -> RenderModel {
        let Some(response) = &action.response else {
            return RenderModel::Pending;
        };
        match response["cli_package"]["reply_message"].as_str() {
            Some(reply) => RenderModel::PlainText(reply.to_string()),
            None => RenderModel::Error("malformed remote session response".into()),
        }
    }

    fn on_registered(&self, configs: ConfigHandle) {
        let _ = self.configs.set(configs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HandlerRegistry;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    fn registered_handler() -> (HandlerRegistry, Arc<dyn ActionHandler>) {
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(RemoteSessionActionHandler::new("client-1")))
            .unwrap();
        let handler = registry.get("pyspark").unwrap();
        (registry, handler)
    }

    #[test]
    fn test_request_carries_server_id_from_own_config() {
        let (registry, handler) = registered_handler();
        registry.set_config("pyspark", json!({"server_id": "s9"}));

        let request = handler.recognize("%pyspark%\nprint(1)").unwrap();
        assert_eq!(request["type"], "spark-cli");
        assert_eq!(request["server_id"], "s9");
        // The remote side re-parses the sentinel from the full text.
        assert_eq!(request["command_text"], "%pyspark%\nprint(1)");
    }

    #[test]
    fn test_missing_server_id_defaults_to_empty() {
        let (_registry, handler) = registered_handler();
        let request = handler.recognize("%bash%\nls").unwrap();
        assert_eq!(request["server_id"], "");
    }

    #[test]
    fn test_recognizes_all_session_tags_without_args() {
        let (_registry, handler) = registered_handler();
        assert!(handler.recognize("%pyspark%\nx").is_some());
        assert!(handler.recognize("%bash%\nx").is_some());
        assert!(handler.recognize("%system%\nx").is_some());
        assert!(handler.recognize("%pyspark% now\nx").is_none());
        assert!(handler.recognize("%mermaid%\nx").is_none());
    }

    #[test]
    fn test_render_reply_message_as_plain_text() {
        let (_registry, handler) = registered_handler();
        let action = Action {
            id: 3,
            handler_name: "pyspark".into(),
            is_completed: true,
            created_at: Utc::now(),
            completed_at: None,
            request: json!({"type": "spark-cli"}),
            title: "question".into(),
            raw_text: "%bash%\nls".into(),
            response: Some(json!({
                "type": "spark-cli",
                "cli_package": {"reply_message": "file-a\nfile-b"}
            })),
            response_chunks: Vec::new(),
        };
        assert_eq!(
            handler.build_render_model(&action),
            RenderModel::PlainText("file-a\nfile-b".into())
        );
    }

    #[test]
    fn test_render_distinguishes_pending_from_malformed() {
        let (_registry, handler) = registered_handler();
        let mut action = Action {
            id: 3,
            handler_name: "pyspark".into(),
            is_completed: false,
            created_at: Utc::now(),
            completed_at: None,
            request: json!({"type": "spark-cli"}),
            title: "question".into(),
            raw_text: "%bash%\nls".into(),
            response: None,
            response_chunks: Vec::new(),
        };
        assert_eq!(handler.build_render_model(&action), RenderModel::Pending);

        action.response = Some(json!({"garbage": true}));
        assert!(matches!(
            handler.build_render_model(&action),
            RenderModel::Error(_)
        ));
    }
}
