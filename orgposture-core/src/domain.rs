//! Domain entities observed while scanning an organization.

use serde::{Deserialize, Serialize};

/// Owner and name of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoIdentity {
    /// Owning account login.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoIdentity {
    /// Build an identity from owner and name.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name` form used in logs and progress messages.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Protection rule configured on a repository's default branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtectionRule {
    /// Pull requests need approving reviews before merge.
    pub requires_approving_reviews: bool,
    /// New commits dismiss existing approvals.
    pub dismisses_stale_reviews: bool,
    /// Code owners must review.
    pub requires_code_owner_reviews: bool,
    /// Status checks must pass.
    pub requires_status_checks: bool,
    /// Commits must be signed.
    pub requires_commit_signatures: bool,
    /// Rules apply to administrators too.
    pub is_admin_enforced: bool,
}

/// A repository as returned by one page of enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Owning account login.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Whether Dependabot vulnerability alerts are enabled.
    pub vulnerability_alerts_enabled: bool,
    /// Default branch protection, `None` when nothing is configured.
    pub branch_protection: Option<BranchProtectionRule>,
}

impl RepositoryRecord {
    /// Identity of this repository.
    pub fn identity(&self) -> RepoIdentity {
        RepoIdentity::new(self.owner.clone(), self.name.clone())
    }
}

/// One page of repositories plus the cursor for the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryPage {
    /// Repositories on this page, in API order.
    pub repositories: Vec<RepositoryRecord>,
    /// Cursor for the following page, `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Per-repository security settings fetched after enumeration.
///
/// The default value (everything disabled) stands in for a failed fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySecuritySettings {
    /// Secret scanning is enabled.
    pub secret_scanning: bool,
    /// Secret scanning push protection is enabled.
    pub secret_scanning_push_protection: bool,
    /// Dependabot security updates are enabled.
    pub dependabot_security_updates: bool,
    /// Code scanning default setup is configured.
    pub code_scanning_enabled: bool,
}

/// Organization-level access control state.
///
/// `two_factor_required` is `None` when the credential lacks permission to
/// observe the setting; it must never be read as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgAccessState {
    /// Whether members must enable two-factor authentication.
    pub two_factor_required: Option<bool>,
}
