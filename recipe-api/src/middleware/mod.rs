/// Middleware modules for the API server
///
/// Token authentication is a `from_fn` layer in [`crate::app`]; this module
/// holds the tower layers.
///
/// - `security`: Security response headers

pub mod security;
