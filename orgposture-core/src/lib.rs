#![deny(missing_docs)]
//! orgposture core library.
//!
//! Collects the security posture of a GitHub organization: branch protection
//! on default branches, repository security features, and organization-level
//! two-factor enforcement. Transport is abstracted behind [`GitHubClient`].

pub mod client;
pub mod clock;
pub mod collector;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod pattern;
pub mod posture;
pub mod report;
pub mod schema;

pub use client::{FetchFuture, GitHubClient};
pub use clock::{Clock, SystemClock, format_timestamp};
pub use collector::{Collector, NoopReporter, ProgressReporter};
pub use config::{CollectorConfig, Credentials, DEFAULT_SETTINGS_CONCURRENCY, ResolvedScope};
pub use domain::{
    BranchProtectionRule, OrgAccessState, RepoIdentity, RepositoryPage, RepositoryRecord,
    RepositorySecuritySettings,
};
pub use error::{FetchError, PostureError, Result};
pub use metrics::{BranchProtectionCounts, MetricsAggregator, SecurityFeatureCounts};
pub use pattern::{DEFAULT_INCLUDE_PATTERN, matches_pattern, should_include_repo};
pub use posture::{PostureCalculator, percent};
pub use report::{
    AccessControl, BranchProtectionRules, Posture, PostureReport, SCHEMA_VERSION, Scope,
    SecurityFeatures, render_json, render_posture_markdown, two_factor_label,
};
pub use schema::{ReportSchema, render_schema_json};
pub use tokio_util::sync::CancellationToken;
