//! Streaming aggregation of repository metrics.

use crate::domain::{RepoIdentity, RepositoryRecord, RepositorySecuritySettings};
use crate::pattern::should_include_repo;

/// Default-branch protection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchProtectionCounts {
    /// Repositories with any protection rule on the default branch.
    pub enabled: usize,
    /// Rules requiring approving reviews.
    pub approving_reviews: usize,
    /// Rules dismissing stale reviews.
    pub dismiss_stale_reviews: usize,
    /// Rules requiring code owner review.
    pub code_owner_reviews: usize,
    /// Rules requiring status checks.
    pub status_checks: usize,
    /// Rules requiring signed commits.
    pub signed_commits: usize,
    /// Rules enforced for administrators.
    pub admin_enforcement: usize,
}

/// Security feature adoption counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityFeatureCounts {
    /// Repositories with vulnerability alerts.
    pub vulnerability_alerts: usize,
    /// Repositories with code scanning configured.
    pub code_scanning: usize,
    /// Repositories with secret scanning.
    pub secret_scanning: usize,
    /// Repositories with secret scanning push protection.
    pub secret_scanning_push_protection: usize,
    /// Repositories with Dependabot security updates.
    pub dependabot_security_updates: usize,
}

impl SecurityFeatureCounts {
    /// Number of tracked security features.
    pub const FEATURES: usize = 5;

    /// Sum of all feature counters.
    pub fn total(&self) -> usize {
        self.vulnerability_alerts
            + self.code_scanning
            + self.secret_scanning
            + self.secret_scanning_push_protection
            + self.dependabot_security_updates
    }
}

/// Accumulates counts across repository pages and settings lookups.
///
/// The aggregator does no I/O and no locking. Callers must feed every
/// repository through [`process_repository`](Self::process_repository) before
/// any of the settings for that repository arrive.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    included: usize,
    excluded: usize,
    accepted: Vec<RepoIdentity>,
    branch_protection: BranchProtectionCounts,
    security_features: SecurityFeatureCounts,
}

impl MetricsAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one enumerated repository into the counts.
    pub fn process_repository(
        &mut self,
        record: &RepositoryRecord,
        include: &[String],
        exclude: &[String],
    ) {
        if !should_include_repo(&record.name, include, exclude) {
            self.excluded += 1;
            return;
        }

        self.included += 1;
        self.accepted.push(record.identity());

        if record.vulnerability_alerts_enabled {
            self.security_features.vulnerability_alerts += 1;
        }

        let Some(rule) = record.branch_protection else {
            return;
        };
        let counts = &mut self.branch_protection;
        counts.enabled += 1;
        if rule.requires_approving_reviews {
            counts.approving_reviews += 1;
        }
        if rule.dismisses_stale_reviews {
            counts.dismiss_stale_reviews += 1;
        }
        if rule.requires_code_owner_reviews {
            counts.code_owner_reviews += 1;
        }
        if rule.requires_status_checks {
            counts.status_checks += 1;
        }
        if rule.requires_commit_signatures {
            counts.signed_commits += 1;
        }
        if rule.is_admin_enforced {
            counts.admin_enforcement += 1;
        }
    }

    /// Fold one repository's security settings into the counts.
    pub fn count_security_settings(&mut self, settings: &RepositorySecuritySettings) {
        let counts = &mut self.security_features;
        if settings.code_scanning_enabled {
            counts.code_scanning += 1;
        }
        if settings.secret_scanning {
            counts.secret_scanning += 1;
        }
        if settings.secret_scanning_push_protection {
            counts.secret_scanning_push_protection += 1;
        }
        if settings.dependabot_security_updates {
            counts.dependabot_security_updates += 1;
        }
    }

    /// Repositories that passed the scope filter.
    pub fn included(&self) -> usize {
        self.included
    }

    /// Repositories rejected by the scope filter.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Every repository observed across all pages.
    pub fn observed(&self) -> usize {
        self.included + self.excluded
    }

    /// Identities of accepted repositories, in enumeration order.
    pub fn accepted(&self) -> &[RepoIdentity] {
        &self.accepted
    }

    /// Branch protection counters.
    pub fn branch_protection(&self) -> &BranchProtectionCounts {
        &self.branch_protection
    }

    /// Security feature counters.
    pub fn security_features(&self) -> &SecurityFeatureCounts {
        &self.security_features
    }
}
