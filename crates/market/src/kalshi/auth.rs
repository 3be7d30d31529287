//! RSA-PSS authentication for the Kalshi API.
//!
//! Signature format: `RSA-PSS(SHA256, timestamp + method + path)` -> base64.
//! `path` must not include query parameters.

use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::{BlindedSigningKey, Signature};
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;

use common::Error;

#[derive(Clone)]
pub struct KalshiAuth {
    pub api_key: String,
    signing_key: BlindedSigningKey<Sha256>,
}

impl std::fmt::Debug for KalshiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiAuth")
            .field("api_key", &self.api_key)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl KalshiAuth {
    /// `pem_string` may contain literal `\n` escapes instead of real
    /// newlines; both forms are normalised before parsing.
    pub fn new(api_key: &str, pem_string: &str) -> Result<Self, Error> {
        let pem = pem_string.replace("\\n", "\n");
        let pem = pem.trim();

        let private_key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .map_err(|e| Error::Auth(format!("failed to parse RSA private key: {e}")))?;

        let signing_key = BlindedSigningKey::<Sha256>::new(private_key);

        Ok(Self {
            api_key: api_key.to_string(),
            signing_key,
        })
    }

    /// Returns `(timestamp_ms_string, base64_signature)`.
    pub fn sign_request(&self, method: &str, path: &str) -> (String, String) {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let path_clean = path.split('?').next().unwrap_or(path);
        let message = format!("{timestamp}{method}{path_clean}");

        let mut rng = rand::thread_rng();
        let signature: Signature = self.signing_key.sign_with_rng(&mut rng, message.as_bytes());
        let sig_b64 = base64::engine::general_purpose::STANDARD.encode(signature.to_bytes());

        (timestamp, sig_b64)
    }

    pub fn headers(&self, method: &str, path: &str) -> reqwest::header::HeaderMap {
        let (timestamp, signature) = self.sign_request(method, path);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("KALSHI-ACCESS-KEY", self.api_key.parse().expect("invalid api key header"));
        headers.insert("KALSHI-ACCESS-TIMESTAMP", timestamp.parse().expect("invalid timestamp header"));
        headers.insert("KALSHI-ACCESS-SIGNATURE", signature.parse().expect("invalid signature header"));
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_with_a_256_byte_rsa_2048_signature() {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("keygen");
        let pem = rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(&private_key, rsa::pkcs1::LineEnding::LF)
            .expect("pem encode");
        let auth = KalshiAuth::new("test-key-id", pem.as_ref()).expect("auth init");

        let (ts, sig) = auth.sign_request("GET", "/trade-api/v2/portfolio/balance?foo=bar");
        assert!(ts.parse::<i64>().is_ok());

        let decoded = base64::engine::general_purpose::STANDARD.decode(&sig).expect("valid base64");
        assert_eq!(decoded.len(), 256);
    }

    #[test]
    fn strips_query_params_before_signing() {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("keygen");
        let pem = rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(&private_key, rsa::pkcs1::LineEnding::LF)
            .expect("pem encode");
        let auth = KalshiAuth::new("test-key-id", pem.as_ref()).expect("auth init");

        let (_, sig1) = auth.sign_request("GET", "/trade-api/v2/portfolio/orders");
        let (_, sig2) = auth.sign_request("GET", "/trade-api/v2/portfolio/orders?limit=5");
        let d1 = base64::engine::general_purpose::STANDARD.decode(&sig1).unwrap();
        let d2 = base64::engine::general_purpose::STANDARD.decode(&sig2).unwrap();
        assert_eq!(d1.len(), 256);
        assert_eq!(d2.len(), 256);
    }
}
