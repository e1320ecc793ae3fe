//! `%mermaid%` / `%html%` / `%markdown%`: display-only markup actions.
//!
//! The body is echoed back by the server and rendered by type: HTML is
//! embedded verbatim (trusted), mermaid goes to an external diagram
//! renderer, markdown to an external markdown renderer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use webdeck_core::{Action, RenderModel};

use crate::handler::ActionHandler;
use crate::sentinel::split_sentinel;

const TAGS: [&str; 3] = ["mermaid", "html", "markdown"];

/// Mime carried by chunk-shaped completions of diagram actions.
pub const MERMAID_MIME: &str = "application/x-webdeck-mermaid";

#[derive(Debug, Serialize, Deserialize)]
struct MarkupRequest {
    #[serde(rename = "type")]
    kind: String,
    client_id: String,
    command_text: String,
}

pub struct MarkupActionHandler {
    client_id: String,
}

impl MarkupActionHandler {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    fn render_typed(kind: &str, content: &str) -> RenderModel {
        match kind {
            "html" => RenderModel::Html(content.to_string()),
            "markdown" => RenderModel::Markdown(content.to_string()),
            "mermaid" => RenderModel::Diagram(content.to_string()),
            other => RenderModel::Error(format!("unknown markup type \"{other}\"")),
        }
    }
}

#[async_trait]
impl ActionHandler for MarkupActionHandler {
    fn name(&self) -> &str {
        "mermaid"
    }

    fn recognize(&self, text: &str) -> Option<Value> {
        let line = split_sentinel(text)?;
        if !TAGS.contains(&line.tag) || !line.args.is_empty() {
            return None;
        }
        serde_json::to_value(MarkupRequest {
            kind: line.tag.to_string(),
            client_id: self.client_id.clone(),
            command_text: line.body,
        })
        .ok()
    }

    fn build_render_model(&self, action: &Action) -> RenderModel {
        // Completions arrive either as one typed chunk or as a whole
        // response `{type, content}` (older records).
        if let Some(chunk) = action.response_chunks.first() {
            let content = chunk.text_content.as_deref().unwrap_or_default();
            return match chunk.mime.as_str() {
                "text/html" => RenderModel::Html(content.to_string()),
                "text/markdown" => RenderModel::Markdown(content.to_string()),
                MERMAID_MIME => RenderModel::Diagram(content.to_string()),
                other => RenderModel::Error(format!("unknown markup chunk \"{other}\"")),
            };
        }
        match &action.response {
            None => RenderModel::Pending,
            Some(response) => {
                match (response["type"].as_str(), response["content"].as_str()) {
                    (Some(kind), Some(content)) => Self::render_typed(kind, content),
                    _ => RenderModel::Error("malformed markup response".into()),
                }
            }
        }
    }
}
