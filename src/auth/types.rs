//! Auth configuration types
//!
//! A GitHub personal access token and the scheme used to present it.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

/// Environment variable consulted for a token
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// A personal access token
///
/// Never printed: `Debug` redacts the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a token value, rejecting blank input
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(Error::auth("token is empty"));
        }
        Ok(Self(value))
    }

    /// Read a token from a key file
    ///
    /// Only the first line is used, with surrounding whitespace removed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::auth(format!("cannot read {}: {e}", path.display())))?;
        let first_line = content.lines().next().unwrap_or_default();

        Self::new(first_line)
            .map_err(|_| Error::auth(format!("key file {} is empty", path.display())))
    }

    /// Read a token from `GITHUB_TOKEN`, if set and non-blank
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .and_then(|value| Self::new(value).ok())
    }

    /// The raw token value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// How credentials are attached to requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication (unauthenticated GitHub limits apply)
    #[default]
    None,

    /// `Authorization: token <key>`, GitHub's classic PAT scheme
    Token(Token),

    /// `Authorization: Bearer <key>`
    Bearer(Token),
}

impl AuthConfig {
    /// Check if credentials are configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthConfig::None)
    }
}
