//! Message identifier and receipt handle generation

use base64::Engine;
use uuid::Uuid;

/// Generate a message identifier, assigned once at send time
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Mint a receipt handle for one delivery of `message_id`.
///
/// Handles are opaque to callers. The message id is folded in so a handle can be
/// traced back to its message in logs, and a fresh UUID makes every delivery distinct.
pub fn new_receipt_handle(message_id: &str) -> String {
    let raw = format!("{}:{}", message_id, Uuid::new_v4().simple());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Recover the message id embedded in a receipt handle, if it is one of ours
pub fn message_id_of(receipt_handle: &str) -> Option<String> {
    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(receipt_handle)
        .ok()?;
    let raw = String::from_utf8(raw).ok()?;
    raw.rsplit_once(':').map(|(id, _)| id.to_string())
}
