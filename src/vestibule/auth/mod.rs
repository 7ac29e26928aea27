//! Session authentication and authorization.

pub mod config;
pub mod cookies;
pub mod error;
pub mod gate;
pub mod guards;
pub mod policy;
pub mod redirect;
mod session;
pub mod state;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AuthConfig, LoginOptions};
pub use cookies::{CookieAttributes, CookieOverrides, CookieStore, JarCookieStore};
pub use error::LoginError;
pub use guards::{MaybeUser, RequireAdmin, RequireUser};
pub use policy::{is_admin, AdminAllowlist};
pub use state::AuthState;
pub use user::SessionUser;
