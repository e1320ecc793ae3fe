pub mod config;
pub mod session;

pub use config::ConsoleConfig;
pub use session::{ConsoleSession, SubmitOutcome};

use std::sync::Arc;

use webdeck_api::ApiClient;
use webdeck_channel::{ChannelConfig, NotificationChannel};
use webdeck_core::ConsoleError;
use webdeck_handlers::build_default_registry;

/// Build a ready-to-run session plus its notification channel from a config.
///
/// The channel is returned separately so the caller owns its lifecycle
/// (spawn `run`, signal shutdown); there is deliberately no ambient global
/// channel object.
pub fn build_session(
    config: &ConsoleConfig,
    thread_id: i64,
) -> Result<(ConsoleSession, NotificationChannel), ConsoleError> {
    let api = Arc::new(ApiClient::new(&config.api_base_url));
    let registry = build_default_registry(&config.client_id, api.clone())?;
    for (name, handler_config) in &config.handler_configs {
        // Unknown names are ignored, same as any other config probe.
        registry.set_config(name, handler_config.clone());
    }

    let channel = NotificationChannel::new(
        ChannelConfig::new(&config.ws_url, &config.client_id).with_thread_id(thread_id),
    );
    let session = ConsoleSession::new(config.client_id.clone(), thread_id, registry, api);
    Ok((session, channel))
}
