//! Meta webhook signature verification.
//!
//! Meta signs every webhook POST with `X-Hub-Signature-256`, an HMAC-SHA256
//! of the raw request body keyed by the app secret, prefixed with `sha256=`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("signature header is not a sha256 digest")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
}

pub fn verify_meta_signature(
    app_secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let hex_digest = header.strip_prefix("sha256=").ok_or(SignatureError::Malformed)?;
    let expected = decode_hex(hex_digest).ok_or(SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|_| SignatureError::Malformed)?;
    mac.update(body);
    // Constant-time comparison happens inside the mac.
    mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
}

fn decode_hex(raw: &str) -> Option<Vec<u8>> {
    if raw.len() % 2 != 0 {
        return None;
    }
    (0..raw.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(&raw[index..index + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use super::{verify_meta_signature, SignatureError};

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let digest = mac.finalize().into_bytes();
        let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        format!("sha256={hex}")
    }

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"entry":[]}"#;
        let header = sign("shhh", body);
        assert_eq!(verify_meta_signature("shhh", body, Some(&header)), Ok(()));
    }

    #[test]
    fn wrong_secret_is_a_mismatch() {
        let body = br#"{"entry":[]}"#;
        let header = sign("other-secret", body);
        assert_eq!(
            verify_meta_signature("shhh", body, Some(&header)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn tampered_body_is_a_mismatch() {
        let header = sign("shhh", br#"{"entry":[]}"#);
        assert_eq!(
            verify_meta_signature("shhh", br#"{"entry":[{}]}"#, Some(&header)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn missing_or_malformed_headers_are_rejected() {
        assert_eq!(verify_meta_signature("shhh", b"x", None), Err(SignatureError::Missing));
        assert_eq!(
            verify_meta_signature("shhh", b"x", Some("md5=abcd")),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_meta_signature("shhh", b"x", Some("sha256=zz")),
            Err(SignatureError::Malformed)
        );
    }
}
