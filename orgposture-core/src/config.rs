//! Collector configuration and credential resolution.

use serde::{Deserialize, Serialize};

use crate::error::{PostureError, Result};
use crate::pattern::DEFAULT_INCLUDE_PATTERN;

/// Default number of concurrent per-repository settings lookups.
pub const DEFAULT_SETTINGS_CONCURRENCY: usize = 5;

/// Inputs for one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Organization login to scan.
    pub organization: String,
    /// Glob patterns selecting repositories; empty means all.
    #[serde(default)]
    pub include_patterns: Vec<String>,
    /// Glob patterns removing repositories from scope.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Upper bound on in-flight settings lookups.
    #[serde(default = "default_settings_concurrency")]
    pub settings_concurrency: usize,
}

fn default_settings_concurrency() -> usize {
    DEFAULT_SETTINGS_CONCURRENCY
}

/// Include and exclude patterns after defaults were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    /// Include patterns, never empty.
    pub include: Vec<String>,
    /// Exclude patterns.
    pub exclude: Vec<String>,
}

impl CollectorConfig {
    /// Create a configuration that scans every repository of `organization`.
    ///
    /// Surrounding whitespace is removed from the organization login.
    pub fn new(organization: impl Into<String>) -> Self {
        let organization: String = organization.into();
        Self {
            organization: organization.trim().to_string(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            settings_concurrency: DEFAULT_SETTINGS_CONCURRENCY,
        }
    }

    /// Reject configurations that cannot start a collection.
    pub fn validate(&self) -> Result<()> {
        if self.organization.trim().is_empty() {
            return Err(PostureError::Config("organization is required".to_string()));
        }
        Ok(())
    }

    /// Patterns to apply, with an empty include list widened to `*`.
    pub fn resolved_scope(&self) -> ResolvedScope {
        let include = if self.include_patterns.is_empty() {
            vec![DEFAULT_INCLUDE_PATTERN.to_string()]
        } else {
            self.include_patterns.clone()
        };
        ResolvedScope {
            include,
            exclude: self.exclude_patterns.clone(),
        }
    }

    /// Concurrency bound, at least one.
    pub fn effective_concurrency(&self) -> usize {
        self.settings_concurrency.max(1)
    }
}

/// How the transport authenticates against GitHub.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Personal access token.
    Token(String),
    /// GitHub App installation.
    App {
        /// GitHub App ID.
        app_id: u64,
        /// Installation ID for the organization.
        installation_id: u64,
        /// PEM-encoded private key.
        private_key: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.debug_tuple("Token").finish_non_exhaustive(),
            Self::App {
                app_id,
                installation_id,
                ..
            } => f
                .debug_struct("App")
                .field("app_id", app_id)
                .field("installation_id", installation_id)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    /// Pick credentials from the optional inputs.
    ///
    /// App credentials win when both an app ID and a private key are present;
    /// otherwise a non-empty token is required.
    pub fn resolve(
        token: Option<&str>,
        app_id: Option<u64>,
        installation_id: Option<u64>,
        private_key: Option<&str>,
    ) -> Result<Self> {
        let app_id = app_id.filter(|id| *id != 0);
        let private_key = private_key.map(str::trim).filter(|key| !key.is_empty());
        if let (Some(app_id), Some(private_key)) = (app_id, private_key) {
            let installation_id = installation_id.filter(|id| *id != 0).ok_or_else(|| {
                PostureError::Config(
                    "installation_id is required when using GitHub App authentication".to_string(),
                )
            })?;
            return Ok(Self::App {
                app_id,
                installation_id,
                private_key: private_key.to_string(),
            });
        }

        match token.map(str::trim).filter(|token| !token.is_empty()) {
            Some(token) => Ok(Self::Token(token.to_string())),
            None => Err(PostureError::Config(
                "authentication required: provide app_id + private_key (recommended) or github_token"
                    .to_string(),
            )),
        }
    }
}
