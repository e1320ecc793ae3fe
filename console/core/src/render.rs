use serde_json::Value;

/// How an action should be displayed.
///
/// Not concrete UI, but a description the presentation layer maps onto
/// widgets.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderModel {
    /// The action has no response yet.
    Pending,
    PlainText(String),
    /// Trusted HTML fragment, embedded verbatim by the presentation layer.
    Html(String),
    Markdown(String),
    /// Diagram source handed to an external diagram renderer.
    Diagram(String),
    /// Ordered, typed fragments of a streaming response.
    Chunks(Vec<ChunkView>),
    Error(String),
}

/// One typed fragment of a streaming response, keyed by the chunk's mime.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkView {
    Html(String),
    Json(Value),
    Markdown(String),
    PlainText(String),
    /// Inline image markup; the wire carries it as an HTML fragment.
    Image(String),
    /// A chunk no renderer claims. Recoverable: surrounding chunks still
    /// render.
    Unsupported { mime: String },
}
