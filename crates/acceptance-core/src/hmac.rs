use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body`, sent as `X-Receipt-Signature` on
/// outbound receipt webhooks.
pub fn sign_payload(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex signature produced by [`sign_payload`]. Comparison is constant-time.
pub fn verify_payload(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    // Undecodable signatures are checked against zeros so they take the same path.
    let expected = hex::decode(signature).unwrap_or_else(|_| vec![0u8; 32]);
    mac.verify_slice(&expected).is_ok()
}

/// Derive a purpose-specific key so one configured secret never signs two kinds of message.
pub fn derive_key(secret: &[u8], purpose: &str) -> Vec<u8> {
    sign_payload(secret, purpose.as_bytes()).into_bytes()
}
