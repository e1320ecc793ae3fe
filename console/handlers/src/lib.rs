pub mod assistant;
pub mod config;
pub mod handler;
pub mod markup;
pub mod registry;
pub mod remote;
pub mod sentinel;

use std::sync::Arc;

pub use assistant::AssistantActionHandler;
pub use config::ConfigActionHandler;
pub use handler::{ActionHandler, ConfigHandle};
pub use markup::MarkupActionHandler;
pub use registry::HandlerRegistry;
pub use remote::RemoteSessionActionHandler;
pub use sentinel::{split_sentinel, SentinelLine};

use webdeck_api::ApiClient;
use webdeck_core::ConsoleError;

/// Build a registry pre-wired with all built-in handlers.
///
/// Registration order is the recognition order; it is part of the public
/// contract (earliest registered wins on overlapping sentinels).
pub fn build_default_registry(
    client_id: &str,
    api: Arc<ApiClient>,
) -> Result<HandlerRegistry, ConsoleError> {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(ConfigActionHandler::new(client_id, api)))?;
    registry.register(Arc::new(MarkupActionHandler::new(client_id)))?;
    registry.register(Arc::new(RemoteSessionActionHandler::new(client_id)))?;
    registry.register(Arc::new(AssistantActionHandler::new(client_id)))?;
    Ok(registry)
}
