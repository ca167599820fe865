/// Authorization checks
///
/// Ownership is enforced by the models themselves (every user-owned query
/// is scoped by `user_id`). The only role check left is staff access to the
/// admin listings.

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Staff access required")]
    NotStaff,
}

/// Requires the caller to be a staff user
///
/// # Example
///
/// ```
/// use recipe_shared::auth::authorization::require_staff;
/// use recipe_shared::auth::middleware::AuthContext;
///
/// let auth = AuthContext { user_id: 1, email: "a@b.c".into(), is_staff: false };
/// assert!(require_staff(&auth).is_err());
/// ```
pub fn require_staff(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.is_staff {
        return Err(AuthzError::NotStaff);
    }

    Ok(())
}
