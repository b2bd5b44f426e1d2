/// Authentication utilities
///
/// This module provides the authentication primitives for TaskDeck:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Bearer token key generation and format checks
/// - [`middleware`]: Axum middleware resolving `Authorization: Token <key>`
///   headers to a [`crate::visibility::Caller`]
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Token Keys**: 40 hex characters from a cryptographically secure RNG
/// - **Constant-time Comparison**: Password verification uses constant-time operations
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::password::{hash_password, verify_password};
/// use taskdeck_shared::auth::token::generate_key;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let key = generate_key();
/// assert_eq!(key.len(), 40);
/// # Ok(())
/// # }
/// ```

pub mod middleware;
pub mod password;
pub mod token;
