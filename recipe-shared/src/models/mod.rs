/// Database models and their queries
///
/// # Models
///
/// - `user`: Accounts, including the staff/superuser flags
/// - `auth_token`: One opaque login token per user (stored hashed)
/// - `attribute`: Tags and ingredients, the user-owned recipe attributes
/// - `recipe`: Recipes and their tag/ingredient associations
///
/// Every read or write of user-owned data takes the owner's id; rows owned by
/// someone else are indistinguishable from rows that do not exist.

pub mod attribute;
pub mod auth_token;
pub mod recipe;
pub mod user;
