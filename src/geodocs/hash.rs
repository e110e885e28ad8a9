//! Document identifiers.
//!
//! An identifier is the MD5 digest of the content followed by a freshly drawn
//! random salt, rendered as 32 lowercase hex characters. It is not a content
//! address: saving the same bytes twice yields two identifiers. With 128-bit
//! digests the birthday bound puts a collision at roughly 2^64 documents; save
//! still checks the store and retries, so a collision never replaces a record.

use md5::{Digest, Md5};

pub trait HashGenerator: Send + Sync {
    /// Produce a new 32-character hex identifier for `content`.
    fn generate(&self, content: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SaltedMd5;

impl HashGenerator for SaltedMd5 {
    fn generate(&self, content: &str) -> String {
        let salt: u128 = rand::random();
        let mut hasher = Md5::new();
        hasher.update(content.as_bytes());
        hasher.update(salt.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}
