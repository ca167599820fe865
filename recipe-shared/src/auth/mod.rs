/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and length validation
/// - [`token`]: Opaque login token keys (generation, hashing, header parsing)
/// - [`middleware`]: Resolving an `Authorization` header to an [`middleware::AuthContext`]
/// - [`authorization`]: Staff-only access checks
///
/// # Example
///
/// ```no_run
/// use recipe_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
