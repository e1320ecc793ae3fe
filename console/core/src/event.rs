use serde::Deserialize;
use serde_json::Value;

use crate::action::ResponseChunk;
use crate::error::ConsoleError;

/// An asynchronous completion event delivered over the notification channel,
/// keyed by action id.
///
/// Two wire shapes exist: tagged frames (`action-response-chunk`,
/// `action-completed`) and the untagged whole-response frame
/// `{action_id, response}`.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// Whole-response completion for non-streaming handlers.
    Response { action_id: i64, response: Value },
    /// Incremental chunk delivery for streaming handlers.
    Chunk(ResponseChunk),
    /// Terminal event closing a chunk stream.
    Completed { action_id: i64 },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum TaggedFrame {
    ActionResponseChunk {
        action_id: i64,
        order: i64,
        mime: String,
        #[serde(default)]
        text_content: Option<String>,
    },
    ActionCompleted {
        action_id: i64,
    },
}

#[derive(Deserialize)]
struct WholeResponseFrame {
    action_id: i64,
    response: Value,
}

impl PushEvent {
    /// The action this event belongs to.
    pub fn action_id(&self) -> i64 {
        match self {
            PushEvent::Response { action_id, .. } => *action_id,
            PushEvent::Chunk(chunk) => chunk.action_id,
            PushEvent::Completed { action_id } => *action_id,
        }
    }

    /// Parse one inbound channel frame.
    ///
    /// Tagged shapes are tried first; a frame without a recognized tag falls
    /// back to the whole-response shape. Anything else is a malformed frame,
    /// reported to the caller so it can be logged without dropping the
    /// connection.
    pub fn parse(frame: &str) -> Result<PushEvent, ConsoleError> {
        if let Ok(tagged) = serde_json::from_str::<TaggedFrame>(frame) {
            return Ok(match tagged {
                TaggedFrame::ActionResponseChunk {
                    action_id,
                    order,
                    mime,
                    text_content,
                } => PushEvent::Chunk(ResponseChunk {
                    action_id,
                    order,
                    mime,
                    text_content,
                }),
                TaggedFrame::ActionCompleted { action_id } => {
                    PushEvent::Completed { action_id }
                }
            });
        }
        match serde_json::from_str::<WholeResponseFrame>(frame) {
            Ok(whole) => Ok(PushEvent::Response {
                action_id: whole.action_id,
                response: whole.response,
            }),
            Err(err) => Err(ConsoleError::MalformedFrame(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_whole_response_frame() {
        let frame = json!({"action_id": 12, "response": {"message": "hi"}}).to_string();
        let event = PushEvent::parse(&frame).unwrap();
        assert_eq!(
            event,
            PushEvent::Response {
                action_id: 12,
                response: json!({"message": "hi"}),
            }
        );
        assert_eq!(event.action_id(), 12);
    }

    #[test]
    fn test_parse_chunk_frame() {
        let frame = json!({
            "type": "action-response-chunk",
            "action_id": 7,
            "order": 3,
            "mime": "text/markdown",
            "text_content": "## hello"
        })
        .to_string();
        let event = PushEvent::parse(&frame).unwrap();
        match event {
            PushEvent::Chunk(chunk) => {
                assert_eq!(chunk.action_id, 7);
                assert_eq!(chunk.order, 3);
                assert_eq!(chunk.mime, "text/markdown");
                assert_eq!(chunk.text_content.as_deref(), Some("## hello"));
            }
            other => panic!("expected chunk event, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_completed_frame() {
        let frame = json!({"type": "action-completed", "action_id": 9}).to_string();
        let event = PushEvent::parse(&frame).unwrap();
        assert_eq!(event, PushEvent::Completed { action_id: 9 });
    }

    #[test]
    fn test_parse_rejects_malformed_frames() {
        assert!(PushEvent::parse("not json").is_err());
        assert!(PushEvent::parse("{\"type\": \"unknown-event\"}").is_err());
        assert!(PushEvent::parse("{\"response\": {}}").is_err());
    }

    #[test]
    fn test_chunk_without_text_content_parses() {
        let frame = json!({
            "type": "action-response-chunk",
            "action_id": 1,
            "order": 0,
            "mime": "image/png"
        })
        .to_string();
        let event = PushEvent::parse(&frame).unwrap();
        match event {
            PushEvent::Chunk(chunk) => assert!(chunk.text_content.is_none()),
            other => panic!("expected chunk event, got {other:?}"),
        }
    }
}
