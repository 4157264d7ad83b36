//! SHA3-256 hex digests shared by every pin and id computation.
use sha3::{Digest, Sha3_256};

/// Hashes `data` with SHA3-256 and renders the digest as lowercase hex.
pub fn sha3_hex(data: impl AsRef<[u8]>) -> String {
    let digest = Sha3_256::digest(data.as_ref());
    hex::encode(digest)
}

/// Hashes the concatenation of several hex digests (or any strings) in order.
pub fn sha3_hex_concat<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}
