//! Encryption-at-rest for operator market credentials.
//!
//! The reference implementation uses Fernet (AES-128-CBC + HMAC-SHA256).
//! This rewrite satisfies the same round-trip law with AES-128-GCM: a
//! random 96-bit nonce per encryption, nonce prefixed to ciphertext,
//! base64-encoded for storage in a text column.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;

use crate::Error;

const NONCE_LEN: usize = 12;

fn derive_key(master_key: &str) -> [u8; 16] {
    // Fold the configured master key into a 128-bit key via a simple
    // non-cryptographic mix; callers are expected to supply a
    // high-entropy master key (base64, >=16 bytes) directly.
    let bytes = master_key.as_bytes();
    let mut key = [0u8; 16];
    for (i, b) in bytes.iter().enumerate() {
        key[i % 16] ^= b;
    }
    key
}

/// Encrypt `plain` for storage. Distinct calls with the same input and key
/// produce different ciphertext (random nonce per call).
pub fn encrypt(master_key: &str, plain: &str) -> Result<String, Error> {
    let key = derive_key(master_key);
    let cipher = Aes128Gcm::new_from_slice(&key).map_err(|e| Error::Crypto(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plain.as_bytes())
        .map_err(|e| Error::Crypto(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(out))
}

/// Decrypt a value produced by [`encrypt`]. Fails if the ciphertext is
/// malformed or was encrypted under a different key.
pub fn decrypt(master_key: &str, cipher_b64: &str) -> Result<String, Error> {
    let key = derive_key(master_key);
    let cipher = Aes128Gcm::new_from_slice(&key).map_err(|e| Error::Crypto(e.to_string()))?;

    let raw = BASE64
        .decode(cipher_b64)
        .map_err(|e| Error::Crypto(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(Error::Crypto("ciphertext too short".into()));
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plain = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| Error::Crypto(e.to_string()))?;
    String::from_utf8(plain).map_err(|e| Error::Crypto(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = "test-master-key-0123456789abcdef";
        let plain = "kalshi-api-key-secret";
        let cipher = encrypt(key, plain).unwrap();
        assert_eq!(decrypt(key, &cipher).unwrap(), plain);
    }

    #[test]
    fn distinct_encryptions_differ() {
        let key = "test-master-key-0123456789abcdef";
        let a = encrypt(key, "same-plaintext").unwrap();
        let b = encrypt(key, "same-plaintext").unwrap();
        assert_ne!(a, b, "nonce should randomize ciphertext");
    }

    #[test]
    fn wrong_key_fails() {
        let cipher = encrypt("key-one-0123456789abcdef", "secret").unwrap();
        assert!(decrypt("key-two-0123456789abcdef", &cipher).is_err());
    }

    #[test]
    fn ciphertext_differs_from_plaintext_bytes() {
        let key = "test-master-key-0123456789abcdef";
        let plain = "plaintext-value";
        let cipher = encrypt(key, plain).unwrap();
        assert_ne!(cipher.as_bytes(), plain.as_bytes());
    }
}
