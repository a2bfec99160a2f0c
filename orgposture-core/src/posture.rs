//! Conversion of aggregated counts into coverage percentages.

use crate::config::ResolvedScope;
use crate::domain::OrgAccessState;
use crate::metrics::{MetricsAggregator, SecurityFeatureCounts};
use crate::report::{
    AccessControl, BranchProtectionRules, Posture, PostureReport, SCHEMA_VERSION, Scope,
    SecurityFeatures,
};

const MAX_PERCENTAGE: u64 = 100;

/// Percentage of `count` over `total`, truncated. Returns 0 when `total` is 0.
pub fn percent(count: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let value = (count as u64 * MAX_PERCENTAGE) / total as u64;
    value.min(MAX_PERCENTAGE) as u8
}

/// Reads final aggregator state and derives report sections.
#[derive(Debug, Clone, Copy)]
pub struct PostureCalculator<'a> {
    metrics: &'a MetricsAggregator,
}

impl<'a> PostureCalculator<'a> {
    /// Wrap final aggregator state.
    pub fn new(metrics: &'a MetricsAggregator) -> Self {
        Self { metrics }
    }

    /// Share of observed repositories that were in scope.
    pub fn repositories_coverage(&self) -> u8 {
        percent(self.metrics.included(), self.metrics.observed())
    }

    /// Share of in-scope repositories with default branch protection.
    pub fn branch_protection_coverage(&self) -> u8 {
        percent(
            self.metrics.branch_protection().enabled,
            self.metrics.included(),
        )
    }

    /// Unweighted mean adoption across all security features.
    ///
    /// Truncation happens once over the summed counters, not per feature.
    pub fn security_features_coverage(&self) -> u8 {
        let features = self.metrics.security_features();
        percent(
            features.total(),
            self.metrics.included() * SecurityFeatureCounts::FEATURES,
        )
    }

    /// Per-rule branch protection percentages.
    pub fn branch_protection_rules(&self) -> BranchProtectionRules {
        let counts = self.metrics.branch_protection();
        let total = self.metrics.included();
        BranchProtectionRules {
            // Both fields derive from the approving-reviews flag.
            pull_request_required: percent(counts.approving_reviews, total),
            approving_reviews: percent(counts.approving_reviews, total),
            dismiss_stale_reviews: percent(counts.dismiss_stale_reviews, total),
            code_owner_reviews: percent(counts.code_owner_reviews, total),
            status_checks: percent(counts.status_checks, total),
            signed_commits: percent(counts.signed_commits, total),
            admin_enforcement: percent(counts.admin_enforcement, total),
        }
    }

    /// Per-feature security percentages.
    pub fn security_features(&self) -> SecurityFeatures {
        let counts = self.metrics.security_features();
        let total = self.metrics.included();
        SecurityFeatures {
            vulnerability_alerts: percent(counts.vulnerability_alerts, total),
            code_scanning: percent(counts.code_scanning, total),
            secret_scanning: percent(counts.secret_scanning, total),
            secret_scanning_push_protection: percent(counts.secret_scanning_push_protection, total),
            dependabot_security_updates: percent(counts.dependabot_security_updates, total),
        }
    }

    /// Assemble the final report.
    pub fn build_report(
        &self,
        organization: &str,
        collected_at: String,
        scope: &ResolvedScope,
        access: OrgAccessState,
    ) -> PostureReport {
        PostureReport {
            schema_version: SCHEMA_VERSION.to_string(),
            collected_at,
            organization: organization.to_string(),
            scope: Scope {
                include_patterns: scope.include.clone(),
                exclude_patterns: scope.exclude.clone(),
                repositories_coverage: self.repositories_coverage(),
            },
            posture: Posture {
                branch_protection_coverage: self.branch_protection_coverage(),
                security_features_coverage: self.security_features_coverage(),
            },
            access_control: AccessControl {
                two_factor_required: access.two_factor_required,
            },
            branch_protection_rules: self.branch_protection_rules(),
            security_features: self.security_features(),
        }
    }
}
