//! Input sanitization and password hashing.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use gig_models::StoredPassword;

/// Maximum description length.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Maximum title length.
pub const MAX_TITLE_LENGTH: usize = 500;

type HmacSha256 = Hmac<Sha256>;

/// Sanitize a user-provided string for safe logging and storage.
///
/// Control characters other than newline and tab are dropped.
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_TEXT_LENGTH)
        .collect()
}

/// Sanitize a title for safe storage.
pub fn sanitize_title(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        trimmed.chars().take(MAX_TITLE_LENGTH).collect()
    } else {
        trimmed.to_string()
    }
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> StoredPassword {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = STANDARD_NO_PAD.encode(keyed_digest(&salt, password).finalize().into_bytes());
    StoredPassword { salt, digest }
}

/// Constant-time check of a password against its stored digest.
pub fn verify_password(password: &str, stored: &StoredPassword) -> bool {
    let Ok(expected) = STANDARD_NO_PAD.decode(&stored.digest) else {
        return false;
    };
    keyed_digest(&stored.salt, password)
        .verify_slice(&expected)
        .is_ok()
}

fn keyed_digest(salt: &str, password: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(salt.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    mac
}

/// Redact an email for logs: keep the first character and the domain.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}
