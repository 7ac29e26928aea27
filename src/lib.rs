//! # Vestibule (session authentication and edge request gating)
//!
//! `vestibule` turns a short-lived identity token, issued to the browser by an
//! external identity authority, into a durable and revocable session stored in
//! an `HttpOnly` cookie.
//!
//! ## Two tiers of trust
//!
//! - **Edge gate:** a cheap middleware that runs before every route and only
//!   checks whether a session cookie is *present*. It never calls the identity
//!   authority and only decides where to send the request.
//! - **Route guards:** handlers that need identity verify the cookie with the
//!   authority on every request (revocation checked) and derive admin
//!   privilege from the verified claims.
//!
//! ## Admin privilege
//!
//! A session is admin when the `admin` custom claim is `true` and the email is
//! verified, or when the normalized email is on the configured allowlist.
//! Non-admins requesting admin routes receive `404 Not Found`.

pub mod cli;
pub mod identity;
pub mod vestibule;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
