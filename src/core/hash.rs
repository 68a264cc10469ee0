//! core::hash
//!
//! Content-addressable hashing compatible with Git blob objects.
//!
//! A blob id is the SHA-1 of `"blob <len>\0"` followed by the raw bytes, so a
//! locally computed hash can be compared directly against the blob id the
//! remote reports for the same path.

use sha1::{Digest, Sha1};

use super::types::Oid;

/// Compute the Git blob id for `content`.
///
/// ```
/// use ghup::core::hash::blob_hash;
///
/// // `git hash-object` of an empty file
/// assert_eq!(blob_hash(b"").as_str(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
/// ```
pub fn blob_hash(content: &[u8]) -> Oid {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    Oid::from_digest(&hasher.finalize())
}
