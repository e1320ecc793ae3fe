//! `%openai%` / `%python%`: streaming assistant actions.
//!
//! The sentinel line may carry a trailing argument string. Completions
//! arrive as an ordered sequence of typed chunks rendered by mime; a chunk
//! with an unrecognized mime degrades to a per-chunk error view instead of
//! aborting the whole render.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use webdeck_core::{Action, ChunkView, RenderModel, ResponseChunk};

use crate::handler::ActionHandler;
use crate::sentinel::split_sentinel;

const TAGS: [&str; 2] = ["openai", "python"];

#[derive(Debug, Serialize, Deserialize)]
struct AssistantRequest {
    #[serde(rename = "type")]
    kind: String,
    client_id: String,
    command_text: String,
    args: String,
}

pub struct AssistantActionHandler {
    client_id: String,
}

impl AssistantActionHandler {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    fn view_for(chunk: &ResponseChunk) -> ChunkView {
        let content = chunk.text_content.clone().unwrap_or_default();
        match chunk.mime.as_str() {
            "text/html" => ChunkView::Html(content),
            "image/png" => ChunkView::Image(content),
            "text/json" => match serde_json::from_str(&content) {
                Ok(value) => ChunkView::Json(value),
                Err(err) => ChunkView::PlainText(format!("invalid JSON chunk: {err}")),
            },
            "text/markdown" => ChunkView::Markdown(content),
            "text/plain" => ChunkView::PlainText(content),
            other => ChunkView::Unsupported {
                mime: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl ActionHandler for AssistantActionHandler {
    fn name(&self) -> &str {
        "openai"
    }

    fn recognize(&self, text: &str) -> Option<Value> {
        let line = split_sentinel(text)?;
        if !TAGS.contains(&line.tag) {
            return None;
        }
        serde_json::to_value(AssistantRequest {
            kind: line.tag.to_string(),
            client_id: self.client_id.clone(),
            command_text: line.body,
            args: line.args.to_string(),
        })
        .ok()
    }

    fn build_render_model(&self, action: &Action) -> RenderModel {
        if !action.response_chunks.is_empty() {
            return RenderModel::Chunks(
                action.response_chunks.iter().map(Self::view_for).collect(),
            );
        }
        match &action.response {
            None => RenderModel::Pending,
            // Whole-response completions from older records carry a single
            // message string.
            Some(response) => match response["message"].as_str() {
                Some(message) => RenderModel::PlainText(message.to_string()),
                None => RenderModel::Error("malformed assistant response".into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn chunk(order: i64, mime: &str, content: &str) -> ResponseChunk {
        ResponseChunk {
            action_id: 7,
            order,
            mime: mime.into(),
            text_content: Some(content.into()),
        }
    }

    fn action_with_chunks(chunks: Vec<ResponseChunk>) -> Action {
        Action {
            id: 7,
            handler_name: "openai".into(),
            is_completed: false,
            created_at: Utc::now(),
            completed_at: None,
            request: json!({"type": "openai"}),
            title: "question".into(),
            raw_text: "%openai%\nhello".into(),
            response: None,
            response_chunks: chunks,
        }
    }

    #[test]
    fn test_recognize_with_optional_args() {
        let handler = AssistantActionHandler::new("client-1");

        let bare = handler.recognize("%openai%\nsummarize this").unwrap();
        assert_eq!(bare["type"], "openai");
        assert_eq!(bare["args"], "");
        assert_eq!(bare["command_text"], "summarize this");

        let with_args = handler.recognize("%python% --fresh\nprint(1)").unwrap();
        assert_eq!(with_args["type"], "python");
        assert_eq!(with_args["args"], "--fresh");
    }

    #[test]
    fn test_recognize_rejects_other_sentinels() {
        let handler = AssistantActionHandler::new("client-1");
        assert!(handler.recognize("%bash%\nls").is_none());
        assert!(handler.recognize("no sentinel").is_none());
    }

    #[test]
    fn test_chunks_render_by_mime() {
        let handler = AssistantActionHandler::new("client-1");
        let action = action_with_chunks(vec![
            chunk(0, "text/markdown", "## head"),
            chunk(1, "text/json", "{\"k\": 1}"),
            chunk(2, "text/plain", "raw"),
            chunk(3, "text/html", "<b>x</b>"),
        ]);
        let render = handler.build_render_model(&action);
        assert_eq!(
            render,
            RenderModel::Chunks(vec![
                ChunkView::Markdown("## head".into()),
                ChunkView::Json(json!({"k": 1})),
                ChunkView::PlainText("raw".into()),
                ChunkView::Html("<b>x</b>".into()),
            ])
        );
    }

    #[test]
    fn test_unknown_mime_degrades_per_chunk() {
        let handler = AssistantActionHandler::new("client-1");
        let action = action_with_chunks(vec![
            chunk(0, "text/plain", "before"),
            chunk(1, "application/x-unknown", "???"),
            chunk(2, "text/plain", "after"),
        ]);
        match handler.build_render_model(&action) {
            RenderModel::Chunks(views) => {
                assert_eq!(views[0], ChunkView::PlainText("before".into()));
                assert_eq!(
                    views[1],
                    ChunkView::Unsupported {
                        mime: "application/x-unknown".into()
                    }
                );
                assert_eq!(views[2], ChunkView::PlainText("after".into()));
            }
            other => panic!("expected chunk views, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_chunk_is_recoverable() {
        let handler = AssistantActionHandler::new("client-1");
        let action = action_with_chunks(vec![chunk(0, "text/json", "{broken")]);
        match handler.build_render_model(&action) {
            RenderModel::Chunks(views) => {
                assert!(matches!(&views[0], ChunkView::PlainText(msg) if msg.contains("JSON")));
            }
            other => panic!("expected chunk views, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_and_legacy_whole_response() {
        let handler = AssistantActionHandler::new("client-1");
        let mut action = action_with_chunks(Vec::new());
        assert_eq!(handler.build_render_model(&action), RenderModel::Pending);

        action.response = Some(json!({"message": "short answer"}));
        assert_eq!(
            handler.build_render_model(&action),
            RenderModel::PlainText("short answer".into())
        );
    }
}
