//! Transport capability consumed by the collector.

use std::future::Future;
use std::pin::Pin;

use crate::domain::{OrgAccessState, RepositoryPage, RepositorySecuritySettings};
use crate::error::FetchError;

/// Boxed future returned by [`GitHubClient`] operations.
pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// GitHub API operations needed to assess an organization.
///
/// Implementations own authentication and pagination details. They should
/// not retry; each call is one attempt.
pub trait GitHubClient {
    /// Fetch organization-level access control settings.
    ///
    /// Settings the credential cannot observe are reported as unknown rather
    /// than as an error.
    fn fetch_org_security<'a>(&'a self, org: &'a str) -> FetchFuture<'a, OrgAccessState>;

    /// Fetch one page of repositories, starting after `cursor`.
    fn fetch_repository_page<'a>(
        &'a self,
        org: &'a str,
        cursor: Option<&'a str>,
    ) -> FetchFuture<'a, RepositoryPage>;

    /// Fetch security settings for a single repository.
    fn fetch_repository_settings<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> FetchFuture<'a, RepositorySecuritySettings>;
}
