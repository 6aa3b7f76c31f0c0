//! MD5 digests for message bodies and attributes

use md5::{Digest, Md5};
use std::collections::HashMap;

/// Lowercase hex MD5 of `data`
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

pub fn md5_of_body(body: &str) -> String {
    md5_hex(body.as_bytes())
}

/// Digest of a message's attributes.
///
/// Keys are sorted before hashing so the result does not depend on map iteration
/// order; each pair contributes `key` followed by `value`.
pub fn md5_of_attributes(attributes: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();

    let mut hasher = Md5::new();
    for key in keys {
        hasher.update(key.as_bytes());
        hasher.update(attributes[key].as_bytes());
    }
    hex::encode(hasher.finalize())
}
