//! Session issuance, verification, and logout.
//!
//! Flow Overview: login verifies the identity token (revocation checked),
//! applies the admin policy, then asks the authority to mint a session
//! credential that is stored in the session cookie. Every later verification
//! sends that credential back to the authority; any failure clears the cookie.

use super::{
    config::LoginOptions,
    cookies::{CookieOverrides, CookieStore},
    error::LoginError,
    state::AuthState,
    user::SessionUser,
};
use time::Duration;
use tracing::{debug, info, warn};

impl AuthState {
    /// Resolve the session cookie into a user.
    ///
    /// Returns `None` without contacting the authority when there is no
    /// cookie. Any verification failure deletes the cookie once and returns
    /// `None`.
    pub async fn verify_session(&self, cookies: &mut dyn CookieStore) -> Option<SessionUser> {
        let name = self.config().session_cookie_name();
        let credential = cookies.get(name).filter(|value| !value.is_empty())?;

        match self
            .authority()
            .verify_session_credential(&credential, self.config().check_revoked())
            .await
        {
            Ok(token) => Some(SessionUser::from_verified(
                token,
                self.config().admin_allowlist(),
            )),
            Err(err) => {
                debug!("session verification failed: {err}");
                cookies.delete(name, &CookieOverrides::default());
                None
            }
        }
    }

    /// Exchange an identity token for a session cookie.
    ///
    /// # Errors
    /// Returns [`LoginError`] when the token is rejected, the email is not
    /// verified, or the account is not admin while admin is required. No
    /// cookie is written on any error.
    pub async fn login(
        &self,
        cookies: &mut dyn CookieStore,
        id_token: &str,
        options: &LoginOptions,
    ) -> Result<SessionUser, LoginError> {
        if id_token.trim().is_empty() {
            return Err(LoginError::InvalidToken);
        }

        let token = self
            .authority()
            .verify_id_token(id_token, true)
            .await
            .map_err(|err| {
                warn!("identity token rejected: {err}");
                LoginError::InvalidToken
            })?;

        let user = SessionUser::from_verified(token, self.config().admin_allowlist());

        if options.require_email_verified && !user.email_verified {
            debug!("login refused for {}: email not verified", user.uid);
            return Err(LoginError::EmailUnverified);
        }

        if options.require_admin && !user.is_admin {
            debug!("login refused for {}: not admin", user.uid);
            return Err(LoginError::Forbidden);
        }

        let credential = self
            .authority()
            .create_session_credential(id_token, options.max_age_seconds)
            .await
            .map_err(|err| {
                warn!("failed to mint session credential: {err}");
                LoginError::InvalidToken
            })?;

        let max_age = i64::try_from(options.max_age_seconds).unwrap_or(i64::MAX);
        cookies.set(
            self.config().session_cookie_name(),
            &credential,
            &CookieOverrides::default().with_max_age(Duration::seconds(max_age)),
        );

        info!("session created for {}", user.uid);

        Ok(user)
    }

    /// Revoke the user's tokens (best effort) and clear the session cookie.
    pub async fn logout(&self, cookies: &mut dyn CookieStore, uid: Option<&str>) {
        if let Some(uid) = uid {
            match self.authority().revoke_refresh_tokens(uid).await {
                Ok(()) => info!("revoked tokens for {uid}"),
                Err(err) => warn!("failed to revoke tokens for {uid}: {err}"),
            }
        }

        cookies.delete(
            self.config().session_cookie_name(),
            &CookieOverrides::default(),
        );
    }

    /// Logout for whoever the current cookie belongs to, if anyone.
    pub async fn logout_current(&self, cookies: &mut dyn CookieStore) {
        let user = self.verify_session(cookies).await;
        self.logout(cookies, user.as_ref().map(|user| user.uid.as_str()))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthorityError;
    use crate::vestibule::auth::{
        config::AuthConfig,
        testing::{CookieWrite, FakeAuthority, RecordingCookieStore},
    };
    use anyhow::{Context, Result};
    use serde_json::json;
    use std::sync::Arc;

    const COOKIE: &str = "__session";

    fn state(config: AuthConfig, authority: &Arc<FakeAuthority>) -> AuthState {
        AuthState::new(config, authority.clone())
    }

    fn admin_authority() -> FakeAuthority {
        FakeAuthority::new()
            .with_id_token(
                "admin-token",
                json!({
                    "uid": "admin",
                    "email": "admin@x.com",
                    "email_verified": true,
                    "admin": true,
                    "iss": "idp",
                }),
            )
            .with_id_token(
                "user-token",
                json!({ "uid": "user", "email": "user@x.com", "email_verified": true }),
            )
            .with_id_token(
                "unverified-token",
                json!({
                    "uid": "unverified",
                    "email": "new@x.com",
                    "email_verified": false,
                    "admin": true,
                }),
            )
            .with_session(
                "good-credential",
                json!({
                    "uid": "admin",
                    "email": "admin@x.com",
                    "email_verified": true,
                    "admin": true,
                }),
            )
    }

    #[tokio::test]
    async fn verify_without_cookie_is_silent() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        assert_eq!(state.verify_session(&mut cookies).await, None);
        assert!(cookies.writes.is_empty());
        assert!(authority.calls().is_empty());
    }

    #[tokio::test]
    async fn verify_with_empty_cookie_is_silent() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default().with_cookie(COOKIE, "");

        assert_eq!(state.verify_session(&mut cookies).await, None);
        assert!(cookies.writes.is_empty());
        assert!(authority.calls().is_empty());
    }

    #[tokio::test]
    async fn verify_valid_cookie_builds_user() -> Result<()> {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default().with_cookie(COOKIE, "good-credential");

        let user = state
            .verify_session(&mut cookies)
            .await
            .context("expected a session")?;
        assert_eq!(user.uid, "admin");
        assert!(user.is_admin);
        assert!(cookies.writes.is_empty());
        assert_eq!(authority.calls(), ["verify_session:good-credential:true"]);
        Ok(())
    }

    #[tokio::test]
    async fn verify_rejected_cookie_deletes_once() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default().with_cookie(COOKIE, "revoked");

        assert_eq!(state.verify_session(&mut cookies).await, None);
        assert_eq!(cookies.deletes(COOKIE), 1);
        assert_eq!(cookies.writes.len(), 1);
    }

    #[tokio::test]
    async fn login_admin_sets_cookie() -> Result<()> {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        let user = state
            .login(&mut cookies, "admin-token", &LoginOptions::default())
            .await?;

        assert!(user.is_admin);
        assert!(!user.claims.contains_key("iss"));
        assert_eq!(
            cookies.writes,
            [CookieWrite::Set {
                name: COOKIE.to_string(),
                value: "session-for-admin-token".to_string(),
                overrides: CookieOverrides::default().with_max_age(Duration::seconds(432_000)),
            }]
        );
        assert_eq!(
            authority.calls(),
            ["verify_id_token:admin-token:true", "mint:admin-token:432000"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn login_then_verify_yields_same_user() -> Result<()> {
        let cases = [
            (AuthConfig::new(), "admin-token"),
            (AuthConfig::new().with_admin_emails("user@x.com"), "user-token"),
        ];

        for (config, id_token) in cases {
            let authority = Arc::new(admin_authority());
            let state = state(config, &authority);

            let mut login_cookies = RecordingCookieStore::default();
            let issued = state
                .login(&mut login_cookies, id_token, &LoginOptions::default())
                .await?;

            let credential = login_cookies
                .writes
                .iter()
                .find_map(|write| match write {
                    CookieWrite::Set { name, value, .. } if name == COOKIE => Some(value.clone()),
                    _ => None,
                })
                .context("login must set the session cookie")?;

            let mut cookies = RecordingCookieStore::default().with_cookie(COOKIE, &credential);
            let verified = state
                .verify_session(&mut cookies)
                .await
                .context("minted credential must verify")?;

            assert_eq!(verified.uid, issued.uid, "{id_token}");
            assert_eq!(verified.email, issued.email, "{id_token}");
            assert_eq!(verified.is_admin, issued.is_admin, "{id_token}");
            assert!(verified.is_admin, "{id_token}");
            assert!(cookies.writes.is_empty());
        }
        Ok(())
    }

    #[tokio::test]
    async fn login_non_admin_is_forbidden_without_cookie() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        let result = state
            .login(&mut cookies, "user-token", &LoginOptions::default())
            .await;

        assert_eq!(result, Err(LoginError::Forbidden));
        assert!(cookies.writes.is_empty());
        assert_eq!(authority.calls(), ["verify_id_token:user-token:true"]);
    }

    #[tokio::test]
    async fn login_allowlisted_user_is_admin() -> Result<()> {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new().with_admin_emails("USER@x.com"), &authority);
        let mut cookies = RecordingCookieStore::default();

        let user = state
            .login(&mut cookies, "user-token", &LoginOptions::default())
            .await?;
        assert!(user.is_admin);
        assert_eq!(cookies.writes.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn login_unverified_email_is_refused() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        let result = state
            .login(&mut cookies, "unverified-token", &LoginOptions::default())
            .await;
        assert_eq!(result, Err(LoginError::EmailUnverified));
        assert!(cookies.writes.is_empty());
    }

    #[tokio::test]
    async fn login_without_admin_requirement_accepts_user() -> Result<()> {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();
        let options = LoginOptions {
            require_admin: false,
            ..LoginOptions::default()
        };

        let user = state.login(&mut cookies, "user-token", &options).await?;
        assert!(!user.is_admin);
        assert_eq!(cookies.writes.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_unknown_and_empty_tokens() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        for token in ["forged", "", "   "] {
            let result = state
                .login(&mut cookies, token, &LoginOptions::default())
                .await;
            assert_eq!(result, Err(LoginError::InvalidToken));
        }
        assert!(cookies.writes.is_empty());
        assert_eq!(authority.calls(), ["verify_id_token:forged:true"]);
    }

    #[tokio::test]
    async fn login_mint_failure_is_invalid_token() {
        let authority = Arc::new(
            admin_authority().with_mint_error(AuthorityError::Unavailable("down".to_string())),
        );
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        let result = state
            .login(&mut cookies, "admin-token", &LoginOptions::default())
            .await;
        assert_eq!(result, Err(LoginError::InvalidToken));
        assert!(cookies.writes.is_empty());
    }

    #[tokio::test]
    async fn logout_revokes_then_deletes() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default().with_cookie(COOKIE, "good-credential");

        state.logout_current(&mut cookies).await;

        assert_eq!(
            authority.calls(),
            ["verify_session:good-credential:true", "revoke:admin"]
        );
        assert_eq!(cookies.deletes(COOKIE), 1);
    }

    #[tokio::test]
    async fn logout_deletes_cookie_even_when_revoke_fails() {
        let authority = Arc::new(
            admin_authority().with_revoke_error(AuthorityError::Unavailable("down".to_string())),
        );
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        state.logout(&mut cookies, Some("admin")).await;

        assert_eq!(authority.calls(), ["revoke:admin"]);
        assert_eq!(cookies.deletes(COOKIE), 1);
    }

    #[tokio::test]
    async fn logout_without_uid_skips_revocation() {
        let authority = Arc::new(admin_authority());
        let state = state(AuthConfig::new(), &authority);
        let mut cookies = RecordingCookieStore::default();

        state.logout(&mut cookies, None).await;

        assert!(authority.calls().is_empty());
        assert_eq!(cookies.deletes(COOKIE), 1);
    }
}
