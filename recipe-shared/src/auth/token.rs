/// Login token key utilities
///
/// A token key is 40 lowercase hex characters (20 random bytes). Clients
/// present it as `Authorization: Token <key>`; the database only ever sees
/// its SHA-256 digest.
///
/// # Example
///
/// ```
/// use recipe_shared::auth::token::{generate_key, hash_key, is_well_formed};
///
/// let (key, hash) = generate_key();
/// assert_eq!(key.len(), 40);
/// assert!(is_well_formed(&key));
/// assert_eq!(hash, hash_key(&key));
/// ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per key
const KEY_BYTES: usize = 20;

/// Length of the hex-encoded key
pub const KEY_LENGTH: usize = KEY_BYTES * 2;

/// Scheme keyword expected in the `Authorization` header
pub const AUTH_SCHEME: &str = "Token";

/// Generates a fresh key and its storage hash
///
/// Returns `(plaintext_key, sha256_hex)`.
pub fn generate_key() -> (String, String) {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let key = hex::encode(bytes);
    let hash = hash_key(&key);

    (key, hash)
}

/// Hex-encoded SHA-256 of a key (64 characters)
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cheap shape check done before touching the database
pub fn is_well_formed(key: &str) -> bool {
    key.len() == KEY_LENGTH && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Extracts the key from an `Authorization` header value
///
/// The scheme keyword is matched case-insensitively. Returns `None` for any
/// other scheme or when the key is missing or has extra parts.
///
/// # Example
///
/// ```
/// use recipe_shared::auth::token::parse_authorization;
///
/// assert_eq!(parse_authorization("Token abc"), Some("abc"));
/// assert_eq!(parse_authorization("token abc"), Some("abc"));
/// assert_eq!(parse_authorization("Bearer abc"), None);
/// assert_eq!(parse_authorization("Token"), None);
/// ```
pub fn parse_authorization(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let key = parts.next()?;

    if parts.next().is_some() || !scheme.eq_ignore_ascii_case(AUTH_SCHEME) {
        return None;
    }

    Some(key)
}
