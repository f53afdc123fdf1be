//! Body digests for stored responses.

use sha2::{Digest, Sha256};

/// SHA-256 of a response body, hex encoded.
///
/// Stored beside every entry so a served body can be checked against what
/// was written.
pub fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}
