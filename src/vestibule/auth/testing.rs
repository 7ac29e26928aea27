//! In-memory identity authority and cookie store for tests.

use super::cookies::{CookieOverrides, CookieStore};
use crate::identity::{AuthorityError, IdentityAuthority, VerifiedToken};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{collections::HashMap, sync::Mutex};

pub fn claims(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// Tests always pass a subject; a missing one yields an empty uid.
fn verified(value: Value) -> VerifiedToken {
    VerifiedToken::from_claims(&claims(value)).unwrap_or_else(|_| VerifiedToken {
        uid: String::new(),
        email: None,
        email_verified: false,
        custom_claims: Map::new(),
    })
}

#[derive(Default)]
pub struct FakeAuthority {
    id_tokens: HashMap<String, VerifiedToken>,
    sessions: Mutex<HashMap<String, VerifiedToken>>,
    mint_error: Option<AuthorityError>,
    revoke_error: Option<AuthorityError>,
    calls: Mutex<Vec<String>>,
}

impl FakeAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `id_token` and report `claims` for it.
    pub fn with_id_token(mut self, id_token: &str, claims: Value) -> Self {
        self.id_tokens.insert(id_token.to_string(), verified(claims));
        self
    }

    /// Accept session `credential` and report `claims` for it.
    pub fn with_session(self, credential: &str, claims: Value) -> Self {
        self.register_session(credential.to_string(), verified(claims));
        self
    }

    pub fn with_mint_error(mut self, error: AuthorityError) -> Self {
        self.mint_error = Some(error);
        self
    }

    pub fn with_revoke_error(mut self, error: AuthorityError) -> Self {
        self.revoke_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn register_session(&self, credential: String, token: VerifiedToken) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(credential, token);
        }
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl IdentityAuthority for FakeAuthority {
    async fn verify_id_token(
        &self,
        id_token: &str,
        check_revoked: bool,
    ) -> Result<VerifiedToken, AuthorityError> {
        self.record(format!("verify_id_token:{id_token}:{check_revoked}"));
        self.id_tokens
            .get(id_token)
            .cloned()
            .ok_or(AuthorityError::Rejected(401))
    }

    async fn create_session_credential(
        &self,
        id_token: &str,
        max_age_seconds: u64,
    ) -> Result<String, AuthorityError> {
        self.record(format!("mint:{id_token}:{max_age_seconds}"));
        if let Some(error) = &self.mint_error {
            return Err(error.clone());
        }

        // Minted credentials verify to the claims of the token they came from.
        let credential = format!("session-for-{id_token}");
        if let Some(token) = self.id_tokens.get(id_token) {
            self.register_session(credential.clone(), token.clone());
        }
        Ok(credential)
    }

    async fn verify_session_credential(
        &self,
        credential: &str,
        check_revoked: bool,
    ) -> Result<VerifiedToken, AuthorityError> {
        self.record(format!("verify_session:{credential}:{check_revoked}"));
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(credential).cloned())
            .ok_or(AuthorityError::Rejected(401))
    }

    async fn revoke_refresh_tokens(&self, uid: &str) -> Result<(), AuthorityError> {
        self.record(format!("revoke:{uid}"));
        match &self.revoke_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CookieWrite {
    Set {
        name: String,
        value: String,
        overrides: CookieOverrides,
    },
    Delete {
        name: String,
    },
}

/// Cookie store that keeps every write for inspection.
#[derive(Debug, Default)]
pub struct RecordingCookieStore {
    values: HashMap<String, String>,
    pub writes: Vec<CookieWrite>,
}

impl RecordingCookieStore {
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    pub fn deletes(&self, name: &str) -> usize {
        self.writes
            .iter()
            .filter(|write| matches!(write, CookieWrite::Delete { name: n } if n == name))
            .count()
    }
}

impl CookieStore for RecordingCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str, overrides: &CookieOverrides) {
        self.values.insert(name.to_string(), value.to_string());
        self.writes.push(CookieWrite::Set {
            name: name.to_string(),
            value: value.to_string(),
            overrides: overrides.clone(),
        });
    }

    fn delete(&mut self, name: &str, _overrides: &CookieOverrides) {
        self.values.remove(name);
        self.writes.push(CookieWrite::Delete {
            name: name.to_string(),
        });
    }
}
