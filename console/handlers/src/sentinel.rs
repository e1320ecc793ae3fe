//! Sentinel-line parsing for the command surface.
//!
//! The first line of an input is `%<tag>%[ <args>]`; the remaining lines form
//! the command body.

/// The decomposed first line plus the command body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelLine<'a> {
    /// Bare tag, without the surrounding `%` markers.
    pub tag: &'a str,
    /// Trailing arguments on the sentinel line. Empty when absent.
    pub args: &'a str,
    /// Remaining lines, joined back together.
    pub body: String,
}

/// Split input text into sentinel line and body.
///
/// Returns `None` when the first line does not start with a `%tag%` token.
pub fn split_sentinel(text: &str) -> Option<SentinelLine<'_>> {
    let mut lines = text.split('\n');
    let first = lines.next()?.trim();

    let (token, args) = match first.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (first, ""),
    };

    let tag = token
        .strip_prefix('%')
        .and_then(|t| t.strip_suffix('%'))
        .filter(|t| !t.is_empty())?;

    Some(SentinelLine {
        tag,
        args,
        body: lines.collect::<Vec<_>>().join("\n"),
    })
}
