//! Posture report types and renderers.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Version of the report schema.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Security posture of a GitHub organization at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PostureReport {
    /// Version of this schema.
    pub schema_version: String,
    /// RFC 3339 UTC timestamp of the collection.
    pub collected_at: String,
    /// Organization login.
    pub organization: String,
    /// Resolved scope and how much of the organization it covers.
    pub scope: Scope,
    /// Headline coverage numbers.
    pub posture: Posture,
    /// Organization-level access control.
    pub access_control: AccessControl,
    /// Per-rule branch protection coverage.
    pub branch_protection_rules: BranchProtectionRules,
    /// Per-feature security coverage.
    pub security_features: SecurityFeatures,
}

/// Patterns used to select repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Scope {
    /// Include patterns after defaults were applied.
    pub include_patterns: Vec<String>,
    /// Exclude patterns.
    pub exclude_patterns: Vec<String>,
    /// Percentage of the organization's repositories that were in scope.
    pub repositories_coverage: u8,
}

/// Headline coverage percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Posture {
    /// Repositories with default branch protection.
    pub branch_protection_coverage: u8,
    /// Average adoption across the five security features.
    pub security_features_coverage: u8,
}

/// Organization-level access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessControl {
    /// Two-factor enforcement; `null` when the credential cannot see it.
    pub two_factor_required: Option<bool>,
}

/// Branch protection rule coverage, relative to repositories in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BranchProtectionRules {
    /// Pull requests required before merge.
    pub pull_request_required: u8,
    /// Approving reviews required.
    pub approving_reviews: u8,
    /// Stale reviews dismissed on push.
    pub dismiss_stale_reviews: u8,
    /// Code owner review required.
    pub code_owner_reviews: u8,
    /// Status checks required.
    pub status_checks: u8,
    /// Signed commits required.
    pub signed_commits: u8,
    /// Rules enforced for administrators.
    pub admin_enforcement: u8,
}

/// Security feature coverage, relative to repositories in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SecurityFeatures {
    /// Vulnerability alerts enabled.
    pub vulnerability_alerts: u8,
    /// Code scanning configured.
    pub code_scanning: u8,
    /// Secret scanning enabled.
    pub secret_scanning: u8,
    /// Secret scanning push protection enabled.
    pub secret_scanning_push_protection: u8,
    /// Dependabot security updates enabled.
    pub dependabot_security_updates: u8,
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Render a posture report as Markdown.
pub fn render_posture_markdown(report: &PostureReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Security Posture: {}\n", report.organization);
    let _ = writeln!(output, "- Collected at: {}", report.collected_at);
    let _ = writeln!(output, "- Schema version: {}\n", report.schema_version);

    let _ = writeln!(output, "## Scope\n");
    append_list(
        &mut output,
        "Include patterns",
        &report.scope.include_patterns,
        "None.",
    );
    append_list(
        &mut output,
        "Exclude patterns",
        &report.scope.exclude_patterns,
        "None.",
    );
    let _ = writeln!(
        output,
        "Repositories in scope: {}%\n",
        report.scope.repositories_coverage
    );

    let _ = writeln!(output, "## Posture\n");
    append_table(
        &mut output,
        &[
            (
                "Branch protection",
                report.posture.branch_protection_coverage,
            ),
            (
                "Security features",
                report.posture.security_features_coverage,
            ),
        ],
    );

    let _ = writeln!(output, "## Access control\n");
    let _ = writeln!(
        output,
        "- Two-factor required: {}\n",
        two_factor_label(report.access_control.two_factor_required)
    );

    let rules = &report.branch_protection_rules;
    let _ = writeln!(output, "## Branch protection rules\n");
    append_table(
        &mut output,
        &[
            ("Pull request required", rules.pull_request_required),
            ("Approving reviews", rules.approving_reviews),
            ("Dismiss stale reviews", rules.dismiss_stale_reviews),
            ("Code owner reviews", rules.code_owner_reviews),
            ("Status checks", rules.status_checks),
            ("Signed commits", rules.signed_commits),
            ("Admin enforcement", rules.admin_enforcement),
        ],
    );

    let features = &report.security_features;
    let _ = writeln!(output, "## Security features\n");
    append_table(
        &mut output,
        &[
            ("Vulnerability alerts", features.vulnerability_alerts),
            ("Code scanning", features.code_scanning),
            ("Secret scanning", features.secret_scanning),
            (
                "Secret scanning push protection",
                features.secret_scanning_push_protection,
            ),
            (
                "Dependabot security updates",
                features.dependabot_security_updates,
            ),
        ],
    );
    output
}

/// Human label for a tri-state two-factor setting.
pub fn two_factor_label(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

fn append_list(output: &mut String, title: &str, items: &[String], empty_message: &str) {
    if items.is_empty() {
        let _ = writeln!(output, "### {title}\n{empty_message}\n");
        return;
    }
    let _ = writeln!(output, "### {title}");
    for item in items {
        let _ = writeln!(output, "- `{item}`");
    }
    let _ = writeln!(output);
}

fn append_table(output: &mut String, rows: &[(&str, u8)]) {
    let _ = writeln!(output, "| Metric | Coverage |");
    let _ = writeln!(output, "| --- | ---: |");
    for (label, value) in rows {
        let _ = writeln!(output, "| {label} | {value}% |");
    }
    let _ = writeln!(output);
}
