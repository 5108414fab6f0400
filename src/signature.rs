//! Webhook signature verification.
//!
//! The hosting service signs each delivery with HMAC-SHA1 over the raw
//! request body and puts `sha1=<hex>` in the `X-Hub-Signature` header.
//! Verification happens before anything else looks at the body.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_PREFIX: &str = "sha1=";

/// Verifies a webhook signature header against the shared secret and the
/// raw body. Fails closed: a missing or empty header, or an empty body,
/// never validates.
///
/// Comparison is constant-time via the HMAC library, so a forged header
/// learns nothing from timing.
pub fn verify_signature(signature_header: Option<&str>, secret: &str, body: &[u8]) -> bool {
    let header = match signature_header {
        Some(h) if !h.is_empty() => h,
        _ => return false,
    };
    if body.is_empty() {
        return false;
    }

    // Headers arrive as "sha1=<hex>"; bare hex is tolerated as well.
    let hex_sig = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);
    let expected = match hex::decode(hex_sig) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Computes the signature header value for a body, `sha1=<hex>`.
///
/// This is the sender's side of the handshake; the relay itself only needs
/// it in tests.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_validates() {
        let secret = "hunter2";
        let body = b"{\"zen\":\"Design for failure.\"}";
        let header = sign(secret, body);
        assert!(verify_signature(Some(&header), secret, body));
    }

    #[test]
    fn bare_hex_without_prefix_validates() {
        let secret = "hunter2";
        let body = b"payload bytes";
        let header = sign(secret, body);
        let bare = header.strip_prefix("sha1=").unwrap();
        assert!(verify_signature(Some(bare), secret, body));
    }

    #[test]
    fn tampered_body_fails() {
        let secret = "hunter2";
        let header = sign(secret, b"original");
        assert!(!verify_signature(Some(&header), secret, b"originax"));
    }

    #[test]
    fn wrong_secret_fails() {
        let header = sign("hunter2", b"body");
        assert!(!verify_signature(Some(&header), "hunter3", b"body"));
    }

    #[test]
    fn missing_header_fails_closed() {
        assert!(!verify_signature(None, "secret", b"body"));
        assert!(!verify_signature(Some(""), "secret", b"body"));
    }

    #[test]
    fn empty_body_fails_closed() {
        let header = sign("secret", b"");
        assert!(!verify_signature(Some(&header), "secret", b""));
    }

    #[test]
    fn garbage_header_fails() {
        assert!(!verify_signature(Some("sha1=zzzz"), "secret", b"body"));
        assert!(!verify_signature(Some("not hex at all"), "secret", b"body"));
    }
}
