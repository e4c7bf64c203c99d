//! Per-direction key material handed in by the key-exchange collaborator.

use secrecy::SecretBox;

/// The cipher IV, cipher key and HMAC key negotiated for one direction of
/// traffic (client-to-server or server-to-client).
///
/// Key exchange itself — Diffie-Hellman, the transcript hash, the key
/// derivation function — lives outside this crate; a [`crate::kex::KexExchange`]
/// collaborator computes these bytes and hands them here once a `NEWKEYS`
/// message lands.
#[derive(Debug)]
pub struct Keys {
    /// Cipher _initialization vector_.
    pub iv: SecretBox<Vec<u8>>,

    /// Cipher _key_.
    pub key: SecretBox<Vec<u8>>,

    /// HMAC _key_.
    pub hmac: SecretBox<Vec<u8>>,
}

impl Keys {
    /// Wrap already-derived key material as zeroizing secrets.
    pub fn new(iv: Vec<u8>, key: Vec<u8>, hmac: Vec<u8>) -> Self {
        Self {
            iv: SecretBox::new(Box::new(iv)),
            key: SecretBox::new(Box::new(key)),
            hmac: SecretBox::new(Box::new(hmac)),
        }
    }
}

impl Default for Keys {
    /// Empty key material, as used before the first `NEWKEYS`: ciphers and
    /// HMACs negotiated as `none` don't need any.
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }
}
