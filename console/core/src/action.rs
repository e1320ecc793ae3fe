use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::PushEvent;

/// One ordered fragment of a streaming response.
///
/// Chunks for a given action form a totally ordered sequence by `order`.
/// The `(action_id, order)` pair is unique per action; redelivery of an
/// already-seen `order` replaces the chunk at that position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChunk {
    pub action_id: i64,
    pub order: i64,
    pub mime: String,
    #[serde(default)]
    pub text_content: Option<String>,
}

/// One submitted command and its evolving result.
///
/// The `id` is assigned by the server at submission time; actions are never
/// created client-side with a synthetic id. `raw_text`, `request` and
/// `handler_name` are immutable once the action exists. Completion logic may
/// only touch `response`, `response_chunks`, `is_completed` and
/// `completed_at`, and only through [`Action::apply_event`] or a handler's
/// `on_completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,
    pub handler_name: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub request: Value,
    pub title: String,
    pub raw_text: String,
    /// Whole response for non-streaming handlers. Absent while pending.
    #[serde(default)]
    pub response: Option<Value>,
    /// Ordered chunk sequence for streaming handlers.
    #[serde(default)]
    pub response_chunks: Vec<ResponseChunk>,
}

impl Action {
    /// An action is pending until any response data or a terminal event
    /// arrives for it.
    pub fn is_pending(&self) -> bool {
        self.response.is_none() && self.response_chunks.is_empty() && !self.is_completed
    }

    /// Merge one chunk, keeping the sequence sorted ascending by `order`.
    ///
    /// An incoming chunk whose `order` is already present replaces the chunk
    /// at that position; all other chunks keep their relative order. This
    /// makes duplicate delivery and out-of-order arrival safe.
    pub fn merge_chunk(&mut self, chunk: ResponseChunk) {
        match self
            .response_chunks
            .binary_search_by_key(&chunk.order, |c| c.order)
        {
            Ok(i) => self.response_chunks[i] = chunk,
            Err(i) => self.response_chunks.insert(i, chunk),
        }
    }

    /// Mark the action completed. Monotonic: a completed action never goes
    /// back to pending, and the original completion time is kept.
    pub fn mark_completed(&mut self) {
        if !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(Utc::now());
        }
    }

    /// Standard completion merge shared by every handler variant: a whole
    /// response completes the action, a chunk is merged in place, a terminal
    /// event completes without touching response data.
    pub fn apply_event(&mut self, event: &PushEvent) {
        match event {
            PushEvent::Response { response, .. } => {
                self.response = Some(response.clone());
                self.mark_completed();
            }
            PushEvent::Chunk(chunk) => self.merge_chunk(chunk.clone()),
            PushEvent::Completed { .. } => self.mark_completed(),
        }
    }
}
