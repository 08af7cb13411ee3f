//! Secrets for the hosted services.
//!
//! Tokens are read from the environment first (a `.env` file is loaded by
//! the CLI), then from the OS keychain.

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "studyboard";
const GITHUB_ACCOUNT: &str = "github-token";

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const GITHUB_TOKEN_BACKUP_VAR: &str = "GITHUB_TOKEN_BACKUP";
pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_KEY";

/// Hosted database location and key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseSettings {
    pub url: String,
    pub key: String,
}

pub struct CredentialStore;

impl CredentialStore {
    /// Store the GitHub token in the OS keychain
    pub fn store_github_token(token: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, GITHUB_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    pub fn get_github_token() -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, GITHUB_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve token from keychain")
    }

    pub fn delete_github_token() -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, GITHUB_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete token from keychain")?;
        Ok(())
    }
}

/// First non-blank value among the named variables
fn first_set(vars: &[&str], lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    vars.iter()
        .filter_map(|&name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn github_token_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    first_set(&[GITHUB_TOKEN_VAR, GITHUB_TOKEN_BACKUP_VAR], lookup)
}

fn supabase_from(lookup: impl Fn(&str) -> Option<String>) -> Option<SupabaseSettings> {
    let url = first_set(&[SUPABASE_URL_VAR], &lookup)?;
    let key = first_set(&[SUPABASE_KEY_VAR], &lookup)?;
    Some(SupabaseSettings {
        url: url.trim_end_matches('/').to_string(),
        key,
    })
}

/// GitHub token from `GITHUB_TOKEN`, `GITHUB_TOKEN_BACKUP`, then the keychain
pub fn github_token() -> Option<String> {
    if let Some(token) = github_token_from(env_var) {
        return Some(token);
    }
    match CredentialStore::get_github_token() {
        Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "No GitHub token in keychain");
            None
        }
    }
}

/// Supabase settings, present only when both URL and key are set
pub fn supabase_settings() -> Option<SupabaseSettings> {
    supabase_from(env_var)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_primary_token_wins() {
        let env = lookup(&[(GITHUB_TOKEN_VAR, "primary"), (GITHUB_TOKEN_BACKUP_VAR, "backup")]);
        assert_eq!(github_token_from(env).as_deref(), Some("primary"));
    }

    #[test]
    fn test_backup_token_used_when_primary_blank() {
        let env = lookup(&[(GITHUB_TOKEN_VAR, "  "), (GITHUB_TOKEN_BACKUP_VAR, "backup")]);
        assert_eq!(github_token_from(env).as_deref(), Some("backup"));
        assert_eq!(github_token_from(lookup(&[])), None);
    }

    #[test]
    fn test_supabase_needs_url_and_key() {
        let env = lookup(&[(SUPABASE_URL_VAR, "https://db.example.co/")]);
        assert_eq!(supabase_from(env), None);

        let env = lookup(&[
            (SUPABASE_URL_VAR, "https://db.example.co/"),
            (SUPABASE_KEY_VAR, "anon"),
        ]);
        assert_eq!(
            supabase_from(env),
            Some(SupabaseSettings {
                url: "https://db.example.co".into(),
                key: "anon".into(),
            })
        );
    }
}
