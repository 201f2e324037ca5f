//! Secure token manager for hosting-branch authentication
//!
//! The bearer token and repository slug are read from environment variables
//! into `secrecy` wrappers so that neither ends up in logs or `Debug` output.

use crate::core::error::DocsError;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::env;

/// Secure token manager for publishing credentials
///
/// # Examples
///
/// ```
/// use docs_publisher::security::SecureTokenManager;
///
/// let manager = SecureTokenManager::new("GITHUB_TOKEN", "GITHUB_REPOSITORY");
/// assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
/// ```
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    token_env: String,
    repository_env: String,
}

impl SecureTokenManager {
    pub fn new<T: Into<String>, R: Into<String>>(token_env: T, repository_env: R) -> Self {
        Self {
            token_env: token_env.into(),
            repository_env: repository_env.into(),
        }
    }

    pub fn token_env(&self) -> &str {
        &self.token_env
    }

    pub fn repository_env(&self) -> &str {
        &self.repository_env
    }

    /// Retrieves the bearer token, `None` when unset or empty
    pub fn get_token(&self) -> Option<SecretString> {
        let value = env::var(&self.token_env).ok()?;
        if value.trim().is_empty() {
            return None;
        }
        Some(SecretString::new(value.into()))
    }

    /// Retrieves the `<owner>/<repo>` slug, `None` when unset or empty
    pub fn get_repository(&self) -> Option<String> {
        let value = env::var(&self.repository_env).ok()?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(value.to_string())
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    /// Build `https://git:<token>@<host>/<slug>.git`
    ///
    /// # Errors
    ///
    /// `DocsError::Auth` naming the missing variable.
    pub fn authenticated_remote_url(&self, host: &str) -> Result<SecretString, DocsError> {
        let token = self.get_token().ok_or_else(|| DocsError::Auth {
            message: format!("{} is not set", self.token_env),
            output: String::new(),
        })?;
        let repository = self.get_repository().ok_or_else(|| DocsError::Auth {
            message: format!("{} is not set", self.repository_env),
            output: String::new(),
        })?;

        let url = format!(
            "https://git:{}@{}/{}.git",
            token.expose_secret(),
            host,
            repository
        );
        Ok(SecretString::new(url.into()))
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    pub fn mask_token(&self, token: &str) -> String {
        if token.len() < 10 || !token.is_char_boundary(3) || !token.is_char_boundary(token.len() - 3)
        {
            return "****".to_string();
        }

        let prefix = &token[..3];
        let suffix = &token[token.len() - 3..];
        format!("{}...{}", prefix, suffix)
    }

    /// Masks the configured token wherever it appears in `text`
    pub fn mask_tokens_in_string(&self, text: &str) -> String {
        let Some(token) = self.get_token() else {
            return text.to_string();
        };
        let token_str = token.expose_secret();

        match Regex::new(&regex::escape(token_str)) {
            Ok(regex) => {
                let masked_token = self.mask_token(token_str);
                regex.replace_all(text, masked_token.as_str()).into_owned()
            }
            Err(_) => text.replace(token_str, "****"),
        }
    }
}
