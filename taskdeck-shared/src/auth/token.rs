/// Bearer token key utilities
///
/// This module generates and validates the opaque keys carried in
/// `Authorization: Token <key>` headers. These work in conjunction with the
/// `models::token` module for database operations.
///
/// # Security
///
/// - **Format**: 40 lowercase hex characters (20 random bytes)
/// - **Storage**: Keys are stored verbatim; login hands back the existing
///   key, so there is no derived form to compare against
/// - **Lookup**: The key is the primary key of `auth_tokens`, one indexed
///   read per request
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::token::{generate_key, validate_key_format};
///
/// let key = generate_key();
/// assert_eq!(key.len(), 40);
/// assert!(validate_key_format(&key));
/// ```

use rand::Rng;

/// Number of random bytes behind a key
const KEY_BYTES: usize = 20;

/// Length of a token key in characters (hex-encoded)
pub const TOKEN_KEY_LENGTH: usize = KEY_BYTES * 2;

/// Generates a new token key
///
/// Creates 20 cryptographically random bytes and hex-encodes them, giving
/// a 40-character key with 160 bits of entropy.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::token::generate_key;
///
/// let key1 = generate_key();
/// let key2 = generate_key();
/// assert_eq!(key1.len(), 40);
/// assert_ne!(key1, key2);
/// ```
pub fn generate_key() -> String {
    let bytes: [u8; KEY_BYTES] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Validates token key format
///
/// Checks length and that every character is lowercase hex. Useful for
/// rejecting garbage before touching the database, though an unknown
/// well-formed key still resolves to nothing.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::token::validate_key_format;
///
/// assert!(validate_key_format(&"a1".repeat(20)));
///
/// // Wrong length
/// assert!(!validate_key_format("abc123"));
///
/// // Non-hex characters
/// assert!(!validate_key_format(&"zz".repeat(20)));
/// ```
pub fn validate_key_format(key: &str) -> bool {
    key.len() == TOKEN_KEY_LENGTH
        && key
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
