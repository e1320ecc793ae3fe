//! Persistent duplex channel delivering action completion events.
//!
//! The channel is an explicitly owned instance with an explicit lifecycle:
//! construct, `run`, signal shutdown. It never owns actions; it only parses
//! inbound frames into [`PushEvent`]s and forwards them, in arrival order, to
//! the session's event queue.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use webdeck_core::{ConsoleError, PushEvent};

const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Connection lifecycle states.
///
/// A transport error is logged but does not by itself leave `Open`; only a
/// close (or end of stream) transitions back to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
}

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub ws_url: String,
    pub client_id: String,
    /// Present when the channel is scoped to one thread.
    pub thread_id: Option<i64>,
    pub reconnect_delay: Duration,
}

impl ChannelConfig {
    pub fn new(ws_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            client_id: client_id.into(),
            thread_id: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_thread_id(mut self, thread_id: i64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }
}

pub struct NotificationChannel {
    config: ChannelConfig,
    state_tx: watch::Sender<ChannelState>,
}

impl NotificationChannel {
    pub fn new(config: ChannelConfig) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        Self { config, state_tx }
    }

    pub fn state(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions, e.g. to surface connectivity in the UI.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    fn handshake_frame(&self) -> String {
        let mut frame = serde_json::json!({ "client_id": self.config.client_id });
        if let Some(thread_id) = self.config.thread_id {
            frame["thread_id"] = thread_id.into();
        }
        frame.to_string()
    }

    /// Connect once and pump frames until the server closes the connection.
    ///
    /// The identity handshake is always the first outbound frame after the
    /// socket opens. Inbound `"ping"` frames are liveness probes and are
    /// discarded without parsing; malformed frames are logged and skipped
    /// without dropping the connection.
    pub async fn connect_once(
        &self,
        events: &mpsc::Sender<PushEvent>,
    ) -> Result<(), ConsoleError> {
        self.state_tx.send_replace(ChannelState::Connecting);
        let (mut ws, _) = match connect_async(self.config.ws_url.as_str()).await {
            Ok(conn) => conn,
            Err(err) => {
                self.state_tx.send_replace(ChannelState::Disconnected);
                return Err(ConsoleError::ChannelClosed(err.to_string()));
            }
        };

        if let Err(err) = ws.send(Message::Text(self.handshake_frame().into())).await {
            self.state_tx.send_replace(ChannelState::Disconnected);
            return Err(ConsoleError::ChannelClosed(err.to_string()));
        }
        self.state_tx.send_replace(ChannelState::Open);
        info!(client_id = %self.config.client_id, "notification channel open");

        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if text.as_str() == "ping" {
                        debug!("ping from server, ignored");
                        continue;
                    }
                    match PushEvent::parse(text.as_str()) {
                        Ok(event) => {
                            if events.send(event).await.is_err() {
                                // Receiver gone: the session is shutting down.
                                break;
                            }
                        }
                        Err(err) => warn!("dropping malformed frame: {err}"),
                    }
                }
                Ok(Message::Close(reason)) => {
                    info!(?reason, "server closed the notification channel");
                    break;
                }
                // Binary, ping and pong frames are not part of the protocol.
                Ok(_) => {}
                Err(err) => error!("websocket transport error: {err}"),
            }
        }

        self.state_tx.send_replace(ChannelState::Disconnected);
        Ok(())
    }

    /// Reconnect loop. On every (re)open the identity handshake is resent;
    /// outstanding pending actions are not replayed.
    pub async fn run(
        &self,
        events: mpsc::Sender<PushEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                result = self.connect_once(&events) => {
                    if let Err(err) = result {
                        warn!("notification channel connect failed: {err}");
                    }
                }
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
        }
        self.state_tx.send_replace(ChannelState::Disconnected);
    }
}
