use crate::{
    identity::{AuthorityConfig, HttpIdentityAuthority},
    vestibule::{self, auth::AuthConfig, auth::AuthState},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub config: AuthConfig,
    pub authority: AuthorityConfig,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the identity authority client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let authority = HttpIdentityAuthority::new(args.authority)?;
    let origin = authority.origin();

    info!(
        "identity authority: {origin}, protected prefixes: {:?}, admin allowlist entries: {}",
        args.config.protected_prefixes(),
        args.config.admin_allowlist().len()
    );

    let state = AuthState::new(args.config, Arc::new(authority)).with_authority_origin(origin);

    vestibule::new(args.port, Arc::new(state)).await
}
