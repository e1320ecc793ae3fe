use serde::{Deserialize, Serialize};

use crate::action::Action;

fn default_visible() -> bool {
    true
}

/// An action as it appears inside one thread: the action itself plus the
/// thread-scoped display state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadAction {
    pub id: i64,
    pub thread_id: i64,
    pub display_order: i64,
    #[serde(default = "default_visible")]
    pub show_question: bool,
    #[serde(default = "default_visible")]
    pub show_answer: bool,
    pub action: Action,
}

/// A persisted, ordered sequence of actions. Owned by the server; the
/// console consumes it to seed the local action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub thread_actions: Vec<ThreadAction>,
}
