//! Error types for posture collection.

use std::{error::Error, fmt};

/// Failure reported by a [`GitHubClient`](crate::GitHubClient) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    Transport(String),
    /// The API answered with a non-success HTTP status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
    /// The response body could not be decoded.
    Decode(String),
    /// The GraphQL endpoint reported errors in its payload.
    GraphQl(String),
    /// Credentials could not be turned into an access token.
    Auth(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Status { status, message } => {
                write!(f, "github api error ({status}): {message}")
            }
            Self::Decode(message) => write!(f, "github response decode failed: {message}"),
            Self::GraphQl(message) => write!(f, "graphql error: {message}"),
            Self::Auth(message) => write!(f, "authentication failed: {message}"),
        }
    }
}

impl Error for FetchError {}

/// Error type for a posture collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostureError {
    /// Configuration is missing or invalid; collection never started.
    Config(String),
    /// Organization-level security settings could not be fetched.
    OrgSecurity(FetchError),
    /// Repository enumeration failed part-way through.
    Repositories(FetchError),
    /// The run was cancelled before a report was produced.
    Cancelled,
}

impl fmt::Display for PostureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(message) => write!(f, "{message}"),
            Self::OrgSecurity(err) => write!(f, "failed to fetch org security: {err}"),
            Self::Repositories(err) => write!(f, "failed to fetch repositories: {err}"),
            Self::Cancelled => write!(f, "collection cancelled"),
        }
    }
}

impl Error for PostureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::OrgSecurity(err) | Self::Repositories(err) => Some(err),
            Self::Config(_) | Self::Cancelled => None,
        }
    }
}

/// Convenience result type for posture collection.
pub type Result<T> = std::result::Result<T, PostureError>;
