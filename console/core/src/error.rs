use thiserror::Error;

/// Top-level error type for the Webdeck console runtime.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("action handler \"{0}\" is already registered")]
    DuplicateHandler(String),

    #[error("no action handler recognized the command")]
    UnrecognizedCommand,

    #[error("action handler \"{0}\" is not registered")]
    UnknownHandler(String),

    #[error("server rejected the request with status {status}")]
    ApiStatus { status: u16 },

    #[error("server request failed: {0}")]
    ApiTransport(String),

    #[error("notification channel closed: {0}")]
    ChannelClosed(String),

    #[error("malformed push frame: {0}")]
    MalformedFrame(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
