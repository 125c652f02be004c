//! Common types and state shared between console-ui and console-cli
//!
//! Holds the wire model for rulesets and users, the session context, the
//! REST client traits, and the framework-independent state behind the rule
//! list and user table widgets.

pub mod auth;
pub mod client;
pub mod events;
pub mod rule_list;
pub mod rules;
pub mod session;
pub mod user_table;

#[cfg(test)]
pub(crate) mod testing;

/// Console error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected response status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Unknown sort key: {0}")]
    InvalidSortKey(String),

    #[error("Unknown ruleset language: {0}")]
    InvalidLanguage(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Missing client role: {0}")]
    Forbidden(&'static str),

    #[error("Not supported: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
