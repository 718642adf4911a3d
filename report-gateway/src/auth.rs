//! API key validation.
//!
//! The key store itself is an external collaborator; this module only
//! defines the lookup capability and the policy applied on top of it.

use crate::config::ApiKeyConfig;
use crate::errors::ReportError;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    Standard,
    Admin,
}

/// Identity resolved from a credential for the duration of one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user: String,
    pub level: AccessLevel,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.level == AccessLevel::Admin
    }
}

/// Maps a credential to the active principal that owns it
pub trait KeyStore: Send + Sync {
    fn lookup(&self, key: &str) -> Option<Principal>;
}

/// Key store backed by the `api_keys` configuration section
pub struct StaticKeyStore {
    keys: HashMap<String, (Principal, bool)>,
}

impl StaticKeyStore {
    pub fn new(api_keys: &[ApiKeyConfig]) -> Self {
        let keys = api_keys
            .iter()
            .map(|k| {
                let level = if k.admin {
                    AccessLevel::Admin
                } else {
                    AccessLevel::Standard
                };
                let principal = Principal {
                    user: k.user.clone(),
                    level,
                };
                (k.key.clone(), (principal, k.active))
            })
            .collect();

        Self { keys }
    }
}

impl KeyStore for StaticKeyStore {
    fn lookup(&self, key: &str) -> Option<Principal> {
        match self.keys.get(key) {
            Some((principal, true)) => Some(principal.clone()),
            _ => None,
        }
    }
}

/// Extracts the key from an `Authorization` header value. Both a bare key
/// and `Bearer <key>` are accepted.
pub fn credential_from_header(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    }
}

/// Resolves `credential` to an active principal.
///
/// Absent, blank, unknown and inactive keys are all rejected the same way.
pub fn validate_api_key(
    credential: Option<&str>,
    keys: &dyn KeyStore,
) -> Result<Principal, ReportError> {
    let credential = credential
        .map(credential_from_header)
        .filter(|c| !c.is_empty())
        .ok_or(ReportError::AuthenticationFailure)?;

    keys.lookup(credential)
        .ok_or(ReportError::AuthenticationFailure)
}

/// Checks that `principal` may call an endpoint with the given requirement.
pub fn authorize(principal: &Principal, require_admin: bool) -> Result<(), ReportError> {
    if require_admin && !principal.is_admin() {
        return Err(ReportError::AuthorizationFailure);
    }
    Ok(())
}
