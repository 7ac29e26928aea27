//! Map validated CLI arguments to an action.
//!
//! Session, cookie, and policy flags become an immutable `AuthConfig`; the
//! identity authority flags are shared by the server and `grant-admin`.

use crate::cli::actions::{grant_admin, server, Action};
use crate::cli::commands::{auth, authority, ARG_EMAIL, CMD_GRANT_ADMIN};
use anyhow::{Context, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some((CMD_GRANT_ADMIN, sub)) = matches.subcommand() {
        let email = sub
            .get_one::<String>(ARG_EMAIL)
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .context("missing required argument: --email")?;

        return Ok(Action::GrantAdmin(grant_admin::Args {
            email,
            authority: authority::Options::parse(sub)?.into_config(),
        }));
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let authority = authority::Options::parse(matches)?.into_config();
    let config = auth::Options::parse(matches)?.into_config();

    Ok(Action::Server(server::Args {
        port,
        config,
        authority,
    }))
}
