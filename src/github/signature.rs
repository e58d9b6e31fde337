use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the `X-Hub-Signature-256` header against the raw request body.
///
/// Any malformed header (missing `sha256=` prefix, bad hex, wrong length)
/// is a verification failure, never an error. The digest comparison is
/// constant-time via `Mac::verify_slice`.
pub fn verify_signature(signature: &str, body: &[u8], secret: &str) -> bool {
    let hex_digest = match signature.strip_prefix("sha256=") {
        Some(s) => s,
        None => return false,
    };

    let expected = match hex::decode(hex_digest) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
