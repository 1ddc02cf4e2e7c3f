use cookie::Key;
use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const HKDF_SALT: &[u8] = b"resetflow-v1";
const HKDF_INFO: &[u8] = b"session-cookie-key";

/// Derive the 64-byte cookie signing key from the configured session secret.
pub fn derive_session_key(secret: &str) -> Key {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
    let mut okm = [0u8; 64];
    hk.expand(HKDF_INFO, &mut okm)
        .expect("64 bytes is a valid HKDF-SHA256 output length");
    Key::from(&okm[..])
}

/// Generate a six-digit one-time code, zero padded.
pub fn generate_code() -> String {
    let n: u32 = rand::random_range(0..1_000_000);
    format!("{n:06}")
}

pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time comparison of two code hashes.
pub fn hashes_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
