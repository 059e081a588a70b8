use std::sync::Arc;

use crate::errors::ChatError;
use crate::store::{API_KEY, KeyValueStore};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Supplies the bearer token attached to each call.
///
/// The token is treated as opaque and sent verbatim.
pub trait CredentialSource: Send + Sync {
    /// Returns the current token, or `None` when no credential is configured.
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed token known up front.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredential(<redacted>)")
    }
}

impl CredentialSource for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the token from an environment variable first, then from the stored
/// `apikey` entry. Resolved on every call so a key saved mid-session is used
/// by the next request.
pub struct EnvOrStoreCredential {
    env_var: String,
    store: Arc<dyn KeyValueStore>,
}

impl EnvOrStoreCredential {
    /// Uses [`API_KEY_ENV`] as the override variable.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_env_var(API_KEY_ENV, store)
    }

    pub fn with_env_var(env_var: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            env_var: env_var.into(),
            store,
        }
    }
}

impl CredentialSource for EnvOrStoreCredential {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.env_var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.store.get(API_KEY))
    }
}

pub(crate) fn resolve_token(source: &dyn CredentialSource) -> Result<String, ChatError> {
    source
        .bearer_token()
        .filter(|token| !token.trim().is_empty())
        .ok_or(ChatError::MissingCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn falls_back_to_stored_key_when_env_unset() {
        let store = Arc::new(MemoryStore::new().with_entry(API_KEY, "stored-key"));
        let source =
            EnvOrStoreCredential::with_env_var("DEEPERSEEKER_TEST_UNSET_KEY_VAR", store);
        assert_eq!(source.bearer_token().as_deref(), Some("stored-key"));
    }

    #[test]
    fn blank_token_is_missing_credential() {
        let err = resolve_token(&StaticCredential::new("   ")).expect_err("blank");
        assert_eq!(err, ChatError::MissingCredential);
    }

    #[test]
    fn missing_everywhere_is_missing_credential() {
        let source = EnvOrStoreCredential::with_env_var(
            "DEEPERSEEKER_TEST_UNSET_KEY_VAR",
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(resolve_token(&source), Err(ChatError::MissingCredential));
    }

    #[test]
    fn static_credential_debug_is_redacted() {
        let debug = format!("{:?}", StaticCredential::new("secret"));
        assert!(!debug.contains("secret"));
    }
}
