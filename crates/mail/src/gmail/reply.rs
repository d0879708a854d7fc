//! Reply composition and raw-message encoding
//!
//! Builds the wire-ready payload Gmail expects for `messages.send`:
//! an RFC 822-style raw message, base64url encoded with padding
//! stripped. Also extracts the routing headers a reply is addressed
//! with. Pure functions, no network or mutable state.

use base64::prelude::*;

use super::api::{GmailMessage, GmailThread};

/// A structured reply before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPayload {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Routing headers taken from the first message of a thread
///
/// Replies are addressed using the original sender and subject of the
/// thread's first message, not the most recent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHeaderView {
    pub from: String,
    pub subject: String,
}

/// Produce the raw RFC 822-style text for a reply
pub fn format_raw(payload: &ReplyPayload) -> String {
    format!(
        "To: {}\r\nSubject: {}\r\n\r\n{}",
        payload.to, payload.subject, payload.body
    )
}

/// Encode a reply into Gmail's `raw` transport frame.
///
/// Standard base64 made URL-safe: `+` becomes `-`, `/` becomes `_`,
/// and trailing `=` padding is stripped.
pub fn encode_raw(payload: &ReplyPayload) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(format_raw(payload))
}

/// Decode a `raw` transport frame back to text.
///
/// Gmail pads inconsistently, so both padded and unpadded input decode.
pub fn decode_raw(raw: &str) -> Option<String> {
    let decoders = [&BASE64_URL_SAFE_NO_PAD, &BASE64_URL_SAFE];
    for decoder in decoders {
        if let Ok(decoded) = decoder.decode(raw)
            && let Ok(s) = String::from_utf8(decoded)
        {
            return Some(s);
        }
    }
    None
}

/// Extract the `From` and `Subject` headers a reply is addressed with.
///
/// Takes the thread's first message as the representative. Returns
/// `None` when the thread has no messages or either header is missing
/// or empty; the caller skips that message rather than replying blind.
pub fn reply_fields(thread: &GmailThread) -> Option<ThreadHeaderView> {
    let first = thread.messages.first()?;
    let from = extract_header(first, "From")?;
    let subject = extract_header(first, "Subject")?;
    Some(ThreadHeaderView { from, subject })
}

/// Extract a non-empty header value by name, case-insensitively
fn extract_header(message: &GmailMessage, name: &str) -> Option<String> {
    message
        .payload
        .as_ref()?
        .headers
        .as_ref()?
        .iter()
        .find_map(|h| {
            if h.name.eq_ignore_ascii_case(name) && !h.value.is_empty() {
                Some(h.value.clone())
            } else {
                None
            }
        })
}
