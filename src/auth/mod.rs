//! Authentication module
//!
//! Supports: GitHub token scheme, Bearer, unauthenticated
//!
//! Tokens are only ever read (from a key file or `GITHUB_TOKEN`), never
//! stored or refreshed.

mod authenticator;
mod types;

pub use authenticator::{resolve_token, Authenticator};
pub use types::{AuthConfig, Token, TOKEN_ENV_VAR};
