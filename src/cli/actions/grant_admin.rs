use crate::identity::{AuthorityConfig, HttpIdentityAuthority};
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub email: String,
    pub authority: AuthorityConfig,
}

/// Claims written by `grant-admin`; `allowlisted` marks promotions made by an operator.
#[must_use]
pub fn admin_claims() -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert("admin".to_string(), json!(true));
    claims.insert("allowlisted".to_string(), json!(true));
    claims
}

/// Execute the grant-admin action.
/// # Errors
/// Returns an error if the user cannot be found or the claims cannot be written.
pub async fn execute(args: Args) -> Result<()> {
    let authority = HttpIdentityAuthority::new(args.authority)?;

    let uid = authority
        .lookup_user_by_email(&args.email)
        .await
        .with_context(|| format!("Failed to find user {}", args.email))?;

    authority
        .set_custom_claims(&uid, &admin_claims())
        .await
        .with_context(|| format!("Failed to set admin claims for {uid}"))?;

    info!("granted admin to {} ({uid})", args.email);
    println!("Granted admin to {} ({uid})", args.email);

    Ok(())
}
