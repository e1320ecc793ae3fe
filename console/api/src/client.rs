//! REST binding to the remote execution boundary.
//!
//! The console never executes commands itself: recognized requests are
//! POSTed here and results come back asynchronously over the notification
//! channel. Thread and configuration maintenance calls live here as well.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use webdeck_core::{ConsoleError, Thread, ThreadAction};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {status}")]
    Status { status: u16 },
}

impl From<ApiError> for ConsoleError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status } => ConsoleError::ApiStatus { status },
            ApiError::Transport(err) => ConsoleError::ApiTransport(err.to_string()),
        }
    }
}

/// Submission payload for a recognized command.
#[derive(Debug, Clone, Serialize)]
pub struct NewAction<'a> {
    pub request: &'a Value,
    pub title: &'a str,
    pub raw_text: &'a str,
}

pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(resp: &reqwest::Response) -> Result<(), ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
            })
        }
    }

    /// Submit a recognized command for execution.
    ///
    /// The server assigns the action id and returns the thread-scoped entry;
    /// on failure no local entry exists anywhere.
    pub async fn create_action(
        &self,
        thread_id: i64,
        new_action: &NewAction<'_>,
    ) -> Result<ThreadAction, ApiError> {
        debug!(thread_id, "submitting action");
        let resp = self
            .http
            .post(self.url(&format!("/apis/threads/{thread_id}/actions")))
            .json(new_action)
            .send()
            .await?;
        Self::check_status(&resp)?;
        Ok(resp.json().await?)
    }

    /// Persist a handler configuration. 2xx responses carry the applied
    /// configuration back as `{"configuration": <json>}`.
    pub async fn update_config(
        &self,
        handler_name: &str,
        client_id: &str,
        config: &Value,
    ) -> Result<Value, ApiError> {
        #[derive(Deserialize)]
        struct ConfigBody {
            configuration: Value,
        }

        debug!(handler_name, "updating handler configuration");
        let resp = self
            .http
            .post(self.url(&format!("/configurations/{handler_name}/{client_id}")))
            .json(config)
            .send()
            .await?;
        Self::check_status(&resp)?;
        let body: ConfigBody = resp.json().await?;
        Ok(body.configuration)
    }

    /// Fetch a thread with its ordered actions.
    pub async fn get_thread(&self, thread_id: i64) -> Result<Thread, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/apis/threads/{thread_id}")))
            .send()
            .await?;
        Self::check_status(&resp)?;
        Ok(resp.json().await?)
    }

    /// Detach an action from a thread. The action itself is not deleted and
    /// its server-side execution is not stopped.
    pub async fn remove_action(&self, thread_id: i64, action_id: i64) -> Result<(), ApiError> {
        let resp = self
            .http
            .delete(self.url(&format!("/apis/threads/{thread_id}/actions/{action_id}")))
            .send()
            .await?;
        Self::check_status(&resp)
    }

    /// Rename an action.
    pub async fn update_action_title(
        &self,
        action_id: i64,
        title: &str,
    ) -> Result<(), ApiError> {
        let resp = self
            .http
            .patch(self.url(&format!("/apis/actions/{action_id}")))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;
        Self::check_status(&resp)
    }

    /// Toggle question visibility for a thread entry.
    pub async fn update_show_question(
        &self,
        thread_id: i64,
        action_id: i64,
        show_question: bool,
    ) -> Result<(), ApiError> {
        self.patch_thread_action(
            thread_id,
            action_id,
            serde_json::json!({ "show_question": show_question }),
        )
        .await
    }

    /// Toggle answer visibility for a thread entry.
    pub async fn update_show_answer(
        &self,
        thread_id: i64,
        action_id: i64,
        show_answer: bool,
    ) -> Result<(), ApiError> {
        self.patch_thread_action(
            thread_id,
            action_id,
            serde_json::json!({ "show_answer": show_answer }),
        )
        .await
    }

    async fn patch_thread_action(
        &self,
        thread_id: i64,
        action_id: i64,
        body: Value,
    ) -> Result<(), ApiError> {
        let resp = self
            .http
            .patch(self.url(&format!("/apis/threads/{thread_id}/actions/{action_id}")))
            .json(&body)
            .send()
            .await?;
        Self::check_status(&resp)
    }
}
