//! Authenticator implementation
//!
//! Applies the configured credentials to outgoing requests.

use super::types::{AuthConfig, Token};
use crate::error::{Error, Result};
use reqwest::RequestBuilder;
use std::path::Path;
use tracing::debug;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Get the auth configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config {
            AuthConfig::None => req,
            AuthConfig::Token(token) => {
                req.header("Authorization", format!("token {}", token.expose()))
            }
            AuthConfig::Bearer(token) => req.bearer_auth(token.expose()),
        }
    }
}

/// Resolve the token to use for a run
///
/// An explicit token (usually from `GITHUB_TOKEN`) wins; otherwise the key
/// file is read. A missing or empty key file is an error.
pub fn resolve_token(explicit: Option<Token>, key_file: Option<&Path>) -> Result<Token> {
    if let Some(token) = explicit {
        debug!("Using token from environment");
        return Ok(token);
    }

    match key_file {
        Some(path) => {
            debug!("Reading token from {}", path.display());
            Token::from_file(path)
        }
        None => Err(Error::auth(
            "no token: set GITHUB_TOKEN or provide a key file",
        )),
    }
}
