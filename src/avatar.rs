//! Gravatar-style avatar URLs for commit authors.
//!
//! Push payloads only carry the author's email, so the trigger image is
//! derived from it: same email, same URL.

use sha2::{Digest, Sha256};

const AVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

/// Builds the avatar URL for an email address. The address is trimmed and
/// lowercased before hashing, matching the gravatar convention.
/// `force_default` appends `f=y` so the service always serves its
/// generated fallback image.
pub fn avatar_url(email: &str, force_default: bool) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    let mut url = format!("{}{}", AVATAR_BASE, hex::encode(digest));
    if force_default {
        url.push_str("?f=y");
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_email_same_url() {
        assert_eq!(avatar_url("dev@example.com", false), avatar_url("dev@example.com", false));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(
            avatar_url("  Dev@Example.COM ", false),
            avatar_url("dev@example.com", false)
        );
    }

    #[test]
    fn force_default_appends_flag() {
        let plain = avatar_url("dev@example.com", false);
        let forced = avatar_url("dev@example.com", true);
        assert_eq!(forced, format!("{plain}?f=y"));
    }

    #[test]
    fn different_emails_differ() {
        assert_ne!(avatar_url("a@example.com", false), avatar_url("b@example.com", false));
    }
}
