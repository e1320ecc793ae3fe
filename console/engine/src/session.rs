//! One console session: recognition, submission, and the event loop that
//! keeps the action log consistent.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use webdeck_api::{ApiClient, NewAction};
use webdeck_core::{ConsoleError, PushEvent, RenderModel, Thread};
use webdeck_handlers::HandlerRegistry;
use webdeck_store::ActionLifecycleStore;

/// What happened to a submitted line of input.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Submitted to the server; a pending entry with this action id was
    /// appended to the log.
    Submitted(i64),
    /// Resolved client-side by the recognizing handler; nothing was
    /// appended or submitted.
    Local(RenderModel),
}

pub struct ConsoleSession {
    client_id: String,
    thread_id: i64,
    registry: Arc<HandlerRegistry>,
    api: Arc<ApiClient>,
    store: ActionLifecycleStore,
}

impl ConsoleSession {
    pub fn new(
        client_id: String,
        thread_id: i64,
        registry: HandlerRegistry,
        api: Arc<ApiClient>,
    ) -> Self {
        Self {
            client_id,
            thread_id,
            registry: Arc::new(registry),
            api,
            store: ActionLifecycleStore::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn thread_id(&self) -> i64 {
        self.thread_id
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ActionLifecycleStore {
        &self.store
    }

    /// Mutable store access, e.g. to install the change listener.
    pub fn store_mut(&mut self) -> &mut ActionLifecycleStore {
        &mut self.store
    }

    /// Fetch the thread and seed the local action log with its entries.
    /// Returns the thread metadata (title, description).
    pub async fn load_thread(&mut self) -> Result<Thread, ConsoleError> {
        let mut thread = self.api.get_thread(self.thread_id).await?;
        let entries = std::mem::take(&mut thread.thread_actions);
        info!(thread_id = self.thread_id, entries = entries.len(), "thread loaded");
        self.store.replace_all(entries).await;
        Ok(thread)
    }

    /// Handle one line of user input.
    ///
    /// Unrecognized text is an error with no state change; the input stays
    /// with the caller for editing. A failed submission appends nothing.
    pub async fn submit(&mut self, text: &str) -> Result<SubmitOutcome, ConsoleError> {
        let Some((handler, request)) = self.registry.recognize(text) else {
            return Err(ConsoleError::UnrecognizedCommand);
        };

        if let Some(render) = handler.try_resolve_local(&request).await {
            debug!(handler = handler.name(), "command resolved client-side");
            return Ok(SubmitOutcome::Local(render));
        }

        let entry = self
            .api
            .create_action(
                self.thread_id,
                &NewAction {
                    request: &request,
                    title: "question",
                    raw_text: text,
                },
            )
            .await?;
        let action_id = entry.action.id;
        info!(action_id, handler = handler.name(), "action submitted");
        self.store.append(entry).await;
        Ok(SubmitOutcome::Submitted(action_id))
    }

    /// Merge one channel event into the matching action.
    ///
    /// The merge is delegated to the handler named by the action; an action
    /// whose handler is no longer registered gets the standard merge. An
    /// event for an absent action id (e.g. one removed from this view) is a
    /// no-op, not an error.
    pub async fn apply_event(&mut self, event: PushEvent) {
        let action_id = event.action_id();
        let registry = Arc::clone(&self.registry);
        self.store
            .update_matching_async(
                |entry| entry.action.id == action_id,
                |mut entry| {
                    let registry = Arc::clone(&registry);
                    let event = event.clone();
                    async move {
                        match registry.get(&entry.action.handler_name) {
                            Some(handler) => {
                                handler.on_completed(&mut entry.action, &event).await?
                            }
                            None => {
                                warn!(
                                    handler = %entry.action.handler_name,
                                    "event for unregistered handler, applying standard merge"
                                );
                                entry.action.apply_event(&event);
                            }
                        }
                        Ok(entry)
                    }
                },
            )
            .await;
    }

    /// Drain the channel's event queue. One consumer: events for the same
    /// action id are applied in delivery order.
    pub async fn pump(&mut self, mut events: mpsc::Receiver<PushEvent>) {
        while let Some(event) = events.recv().await {
            self.apply_event(event).await;
        }
        debug!("event queue closed");
    }

    /// Describe how an entry should be displayed. An entry referencing a
    /// handler this client never registered renders a placeholder instead of
    /// failing the whole collection.
    pub fn render(&self, action_id: i64) -> Option<RenderModel> {
        let entry = self.store.get(action_id)?;
        Some(match self.registry.get(&entry.action.handler_name) {
            Some(handler) => handler.build_render_model(&entry.action),
            None => RenderModel::Error(format!(
                "action handler \"{}\" is unavailable",
                entry.action.handler_name
            )),
        })
    }

    /// Detach an action from this view. Server-side execution continues and
    /// late events for the id become no-ops.
    pub async fn remove_action(&mut self, action_id: i64) -> Result<(), ConsoleError> {
        self.api.remove_action(self.thread_id, action_id).await?;
        self.store.remove(|e| e.action.id == action_id).await;
        Ok(())
    }

    /// Rename an action, server first, then the one local entry.
    pub async fn set_action_title(
        &mut self,
        action_id: i64,
        title: &str,
    ) -> Result<(), ConsoleError> {
        self.api.update_action_title(action_id, title).await?;
        self.store
            .update_matching(
                |e| e.action.id == action_id,
                |e| e.action.title = title.to_string(),
            )
            .await;
        Ok(())
    }

    pub async fn set_show_question(
        &mut self,
        action_id: i64,
        show_question: bool,
    ) -> Result<(), ConsoleError> {
        self.api
            .update_show_question(self.thread_id, action_id, show_question)
            .await?;
        self.store
            .update_matching(
                |e| e.action.id == action_id,
                |e| e.show_question = show_question,
            )
            .await;
        Ok(())
    }

    pub async fn set_show_answer(
        &mut self,
        action_id: i64,
        show_answer: bool,
    ) -> Result<(), ConsoleError> {
        self.api
            .update_show_answer(self.thread_id, action_id, show_answer)
            .await?;
        self.store
            .update_matching(
                |e| e.action.id == action_id,
                |e| e.show_answer = show_answer,
            )
            .await;
        Ok(())
    }
}
