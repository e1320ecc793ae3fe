//! Ordered collection of the actions shown in one console session.
//!
//! The store exclusively owns the mutable entry list. Observers learn about
//! changes through a single async callback fired after every mutating
//! operation; the callback carries no payload, observers re-read the full
//! collection (full-refresh, not a diff protocol).

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use webdeck_core::ThreadAction;

/// Async change callback. Invoked once per mutating operation.
pub type ChangeListener = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
pub struct ActionLifecycleStore {
    entries: Vec<ThreadAction>,
    on_change: Option<ChangeListener>,
}

impl ActionLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the change callback. At most one observer; a later call
    /// replaces the earlier one.
    pub fn set_on_change(&mut self, listener: ChangeListener) {
        self.on_change = Some(listener);
    }

    /// Current collection, in display order.
    pub fn entries(&self) -> &[ThreadAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, action_id: i64) -> Option<&ThreadAction> {
        self.entries.iter().find(|e| e.action.id == action_id)
    }

    /// Append a freshly submitted entry at the end. Entries enter this view
    /// with both visibility flags on.
    pub async fn append(&mut self, mut entry: ThreadAction) {
        entry.show_question = true;
        entry.show_answer = true;
        self.entries.push(entry);
        self.notify().await;
    }

    /// Apply `mutate` to every entry satisfying `predicate`. Entries that
    /// fail the predicate are never touched; ordering is preserved.
    pub async fn update_matching<P, M>(&mut self, predicate: P, mut mutate: M)
    where
        P: Fn(&ThreadAction) -> bool,
        M: FnMut(&mut ThreadAction),
    {
        for entry in self.entries.iter_mut().filter(|e| predicate(e)) {
            mutate(entry);
        }
        self.notify().await;
    }

    /// Async form of [`update_matching`](Self::update_matching).
    ///
    /// Each matching entry is handed to `mutate` by value and written back on
    /// success. A mutator error leaves that entry unchanged and never aborts
    /// the scan: processing one action must not disturb the others.
    pub async fn update_matching_async<P, M, Fut>(&mut self, predicate: P, mut mutate: M)
    where
        P: Fn(&ThreadAction) -> bool,
        M: FnMut(ThreadAction) -> Fut,
        Fut: Future<Output = anyhow::Result<ThreadAction>>,
    {
        for i in 0..self.entries.len() {
            if !predicate(&self.entries[i]) {
                continue;
            }
            let action_id = self.entries[i].action.id;
            match mutate(self.entries[i].clone()).await {
                Ok(updated) => self.entries[i] = updated,
                Err(err) => warn!(action_id, "action update failed: {err:#}"),
            }
        }
        self.notify().await;
    }

    /// Drop every entry satisfying `predicate`. Removing an absent entry is a
    /// no-op, so removal is idempotent.
    pub async fn remove<P>(&mut self, predicate: P)
    where
        P: Fn(&ThreadAction) -> bool,
    {
        self.entries.retain(|e| !predicate(e));
        self.notify().await;
    }

    /// Replace the whole collection, e.g. when (re)loading a thread.
    pub async fn replace_all(&mut self, entries: Vec<ThreadAction>) {
        self.entries = entries;
        self.notify().await;
    }

    async fn notify(&self) {
        if let Some(listener) = &self.on_change {
            listener().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use serde_json::json;
    use webdeck_core::Action;

    fn entry(action_id: i64) -> ThreadAction {
        ThreadAction {
            id: action_id,
            thread_id: 1,
            display_order: action_id,
            show_question: false,
            show_answer: false,
            action: Action {
                id: action_id,
                handler_name: "mermaid".into(),
                is_completed: false,
                created_at: Utc::now(),
                completed_at: None,
                request: json!({"type": "mermaid"}),
                title: "question".into(),
                raw_text: "%mermaid%\ngraph TD; A-->B".into(),
                response: None,
                response_chunks: Vec::new(),
            },
        }
    }

    fn counting_listener() -> (ChangeListener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let listener: ChangeListener = Arc::new(move || -> BoxFuture<'static, ()> {
            seen.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        });
        (listener, count)
    }

    #[tokio::test]
    async fn test_append_defaults_visibility_and_notifies() {
        let (listener, count) = counting_listener();
        let mut store = ActionLifecycleStore::new();
        store.set_on_change(listener);

        store.append(entry(1)).await;

        assert_eq!(store.len(), 1);
        assert!(store.entries()[0].show_question);
        assert!(store.entries()[0].show_answer);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_matching_leaves_other_entries_untouched() {
        let mut store = ActionLifecycleStore::new();
        store.append(entry(1)).await;
        store.append(entry(2)).await;
        let untouched_before = store.entries()[1].clone();

        store
            .update_matching(
                |e| e.action.id == 1,
                |e| e.action.title = "renamed".into(),
            )
            .await;

        assert_eq!(store.entries()[0].action.title, "renamed");
        assert_eq!(store.entries()[1], untouched_before);
    }

    #[tokio::test]
    async fn test_update_matching_async_isolates_failures() {
        let mut store = ActionLifecycleStore::new();
        store.append(entry(1)).await;
        store.append(entry(2)).await;

        store
            .update_matching_async(
                |_| true,
                |mut e| async move {
                    if e.action.id == 1 {
                        anyhow::bail!("broken handler");
                    }
                    e.action.title = "updated".into();
                    Ok(e)
                },
            )
            .await;

        // The failing entry is untouched, the other one is still processed.
        assert_eq!(store.entries()[0].action.title, "question");
        assert_eq!(store.entries()[1].action.title, "updated");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let mut store = ActionLifecycleStore::new();
        store.append(entry(1)).await;
        store.append(entry(2)).await;

        store.remove(|e| e.action.id == 1).await;
        let after_first: Vec<i64> = store.entries().iter().map(|e| e.action.id).collect();
        store.remove(|e| e.action.id == 1).await;
        let after_second: Vec<i64> = store.entries().iter().map(|e| e.action.id).collect();

        assert_eq!(after_first, vec![2]);
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_every_mutation_notifies_once() {
        let (listener, count) = counting_listener();
        let mut store = ActionLifecycleStore::new();
        store.set_on_change(listener);

        store.append(entry(1)).await;
        store.update_matching(|_| false, |_| {}).await;
        store.remove(|e| e.action.id == 99).await;
        store.replace_all(vec![entry(3)]).await;

        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(store.entries()[0].action.id, 3);
    }

    #[tokio::test]
    async fn test_replace_all_preserves_given_order() {
        let mut store = ActionLifecycleStore::new();
        store.replace_all(vec![entry(5), entry(3), entry(9)]).await;
        let ids: Vec<i64> = store.entries().iter().map(|e| e.action.id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }
}
