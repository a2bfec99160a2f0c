//! Orchestration of a posture collection run.
//!
//! A run has three phases: organization security settings, repository
//! enumeration, and per-repository security settings. The first two are
//! fatal on failure. Failures in the third are logged and counted as "all
//! features disabled" for the affected repository.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::GitHubClient;
use crate::clock::{Clock, SystemClock, format_timestamp};
use crate::config::{CollectorConfig, ResolvedScope};
use crate::domain::{RepoIdentity, RepositorySecuritySettings};
use crate::error::{FetchError, PostureError, Result};
use crate::metrics::MetricsAggregator;
use crate::posture::PostureCalculator;
use crate::report::PostureReport;

/// Receives informational status updates during a run.
pub trait ProgressReporter: Send + Sync {
    /// Indeterminate status at a phase boundary.
    fn status(&self, _message: &str) {}
    /// Determinate progress through the settings phase.
    fn progress(&self, _current: u64, _total: u64, _message: &str) {}
}

/// Reporter that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}

/// Collects the security posture of one organization.
pub struct Collector {
    client: Arc<dyn GitHubClient + Send + Sync>,
    config: CollectorConfig,
    clock: Arc<dyn Clock + Send + Sync>,
    reporter: Arc<dyn ProgressReporter>,
}

impl Collector {
    /// Create a collector using the system clock and no progress output.
    pub fn new(config: CollectorConfig, client: Arc<dyn GitHubClient + Send + Sync>) -> Self {
        Self {
            client,
            config,
            clock: Arc::new(SystemClock),
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Replace the clock used for `collected_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Configuration of this collector.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run a collection that cannot be cancelled from outside.
    pub async fn collect(&self) -> Result<PostureReport> {
        self.collect_with_cancel(&CancellationToken::new()).await
    }

    /// Run a collection, aborting with [`PostureError::Cancelled`] once
    /// `cancel` fires.
    pub async fn collect_with_cancel(&self, cancel: &CancellationToken) -> Result<PostureReport> {
        self.config.validate()?;
        let organization = self.config.organization.trim();
        let scope = self.config.resolved_scope();
        let collected_at = format_timestamp(self.clock.now());

        log::info!("collecting security posture for {organization}");
        self.reporter
            .status("Fetching organization security settings");
        let access = until_cancelled(cancel, self.client.fetch_org_security(organization))
            .await?
            .map_err(PostureError::OrgSecurity)?;
        if access.two_factor_required.is_none() {
            log::warn!(
                "two-factor requirement for {organization} is not visible to this credential"
            );
        }

        let mut metrics = MetricsAggregator::new();
        self.enumerate_repositories(organization, &scope, &mut metrics, cancel)
            .await?;
        self.fetch_security_settings(&mut metrics, cancel).await?;

        let report = PostureCalculator::new(&metrics).build_report(
            organization,
            collected_at,
            &scope,
            access,
        );
        log::info!(
            "collected {organization}: {} in scope, {} excluded",
            metrics.included(),
            metrics.excluded()
        );
        Ok(report)
    }

    async fn enumerate_repositories(
        &self,
        organization: &str,
        scope: &ResolvedScope,
        metrics: &mut MetricsAggregator,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.reporter.status("Enumerating repositories");
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let request = self
                .client
                .fetch_repository_page(organization, cursor.as_deref());
            let page = until_cancelled(cancel, request)
                .await?
                .map_err(PostureError::Repositories)?;
            pages += 1;

            for record in &page.repositories {
                metrics.process_repository(record, &scope.include, &scope.exclude);
            }
            log::debug!(
                "page {pages}: {} repositories, {} in scope so far",
                page.repositories.len(),
                metrics.included()
            );
            let enumerated = format!("Enumerated {} repositories", metrics.observed());
            self.reporter.status(&enumerated);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        log::info!(
            "enumerated {} repositories across {pages} pages",
            metrics.observed()
        );
        Ok(())
    }

    async fn fetch_security_settings(
        &self,
        metrics: &mut MetricsAggregator,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let targets = metrics.accepted().to_vec();
        let total = targets.len() as u64;
        self.reporter.status(&format!(
            "Fetching security settings for {total} repositories"
        ));

        let permits = self
            .config
            .effective_concurrency()
            .min(Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();
        for identity in targets {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        client
                            .fetch_repository_settings(&identity.owner, &identity.name)
                            .await
                    }
                    Err(err) => Err(FetchError::Transport(err.to_string())),
                };
                (identity, result)
            });
        }

        let mut completed = 0u64;
        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(PostureError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };
            completed += 1;

            let (label, settings) = match joined {
                Ok((identity, result)) => {
                    let settings = settings_or_default(&identity, result);
                    (identity.full_name(), settings)
                }
                Err(err) => {
                    log::warn!("security settings task failed: {err}");
                    (
                        "unknown repository".to_string(),
                        RepositorySecuritySettings::default(),
                    )
                }
            };
            metrics.count_security_settings(&settings);
            self.reporter.progress(completed, total, &label);
        }
        Ok(())
    }
}

fn settings_or_default(
    identity: &RepoIdentity,
    result: std::result::Result<RepositorySecuritySettings, FetchError>,
) -> RepositorySecuritySettings {
    match result {
        Ok(settings) => {
            log::debug!("fetched security settings for {}", identity.full_name());
            settings
        }
        Err(err) => {
            log::warn!(
                "security settings unavailable for {}, counting as disabled: {err}",
                identity.full_name()
            );
            RepositorySecuritySettings::default()
        }
    }
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PostureError::Cancelled),
        output = future => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchFuture;
    use crate::clock::MockClock;
    use crate::domain::{BranchProtectionRule, OrgAccessState, RepositoryPage, RepositoryRecord};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeGitHubClient {
        org: Option<std::result::Result<OrgAccessState, FetchError>>,
        pages: Vec<Vec<RepositoryRecord>>,
        failing_page: Option<usize>,
        settings: HashMap<String, std::result::Result<RepositorySecuritySettings, FetchError>>,
        hang_org: bool,
        hang_page: Option<usize>,
        hang_settings: bool,
        org_calls: AtomicUsize,
        page_calls: AtomicUsize,
        settings_calls: AtomicUsize,
    }

    impl FakeGitHubClient {
        fn with_pages(pages: Vec<Vec<RepositoryRecord>>) -> Self {
            Self {
                pages,
                ..Default::default()
            }
        }
    }

    impl GitHubClient for FakeGitHubClient {
        fn fetch_org_security<'a>(&'a self, _org: &'a str) -> FetchFuture<'a, OrgAccessState> {
            self.org_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_org {
                return Box::pin(std::future::pending::<
                    std::result::Result<OrgAccessState, FetchError>,
                >());
            }
            let result = self.org.clone().unwrap_or(Ok(OrgAccessState {
                two_factor_required: Some(true),
            }));
            Box::pin(async move { result })
        }

        fn fetch_repository_page<'a>(
            &'a self,
            _org: &'a str,
            cursor: Option<&'a str>,
        ) -> FetchFuture<'a, RepositoryPage> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            let index = cursor
                .and_then(|cursor| cursor.strip_prefix("page-"))
                .and_then(|index| index.parse::<usize>().ok())
                .unwrap_or(0);
            if self.hang_page == Some(index) {
                return Box::pin(std::future::pending::<
                    std::result::Result<RepositoryPage, FetchError>,
                >());
            }
            let result = if self.failing_page == Some(index) {
                Err(FetchError::Status {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            } else {
                Ok(RepositoryPage {
                    repositories: self.pages.get(index).cloned().unwrap_or_default(),
                    next_cursor: (index + 1 < self.pages.len())
                        .then(|| format!("page-{}", index + 1)),
                })
            };
            Box::pin(async move { result })
        }

        fn fetch_repository_settings<'a>(
            &'a self,
            _owner: &'a str,
            name: &'a str,
        ) -> FetchFuture<'a, RepositorySecuritySettings> {
            self.settings_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_settings {
                return Box::pin(std::future::pending::<
                    std::result::Result<RepositorySecuritySettings, FetchError>,
                >());
            }
            let result = self
                .settings
                .get(name)
                .cloned()
                .unwrap_or(Ok(RepositorySecuritySettings::default()));
            Box::pin(async move { result })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        statuses: Mutex<Vec<String>>,
        progress: Mutex<Vec<(u64, u64)>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn status(&self, message: &str) {
            self.statuses
                .lock()
                .expect("statuses")
                .push(message.to_string());
        }

        fn progress(&self, current: u64, total: u64, _message: &str) {
            self.progress
                .lock()
                .expect("progress")
                .push((current, total));
        }
    }

    fn repo(name: &str, rule: Option<BranchProtectionRule>) -> RepositoryRecord {
        RepositoryRecord {
            owner: "acme".to_string(),
            name: name.to_string(),
            vulnerability_alerts_enabled: false,
            branch_protection: rule,
        }
    }

    fn full_rule() -> BranchProtectionRule {
        BranchProtectionRule {
            requires_approving_reviews: true,
            dismisses_stale_reviews: true,
            requires_code_owner_reviews: true,
            requires_status_checks: true,
            requires_commit_signatures: true,
            is_admin_enforced: true,
        }
    }

    fn fixed_clock() -> Arc<MockClock> {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .return_const(Utc.with_ymd_and_hms(2026, 5, 6, 7, 8, 9).unwrap());
        Arc::new(clock)
    }

    fn collector(config: CollectorConfig, client: Arc<FakeGitHubClient>) -> Collector {
        Collector::new(config, client).with_clock(fixed_clock())
    }

    #[tokio::test]
    async fn reports_branch_protection_across_all_repositories() {
        let partial = BranchProtectionRule {
            requires_approving_reviews: true,
            requires_status_checks: true,
            ..Default::default()
        };
        let client = Arc::new(FakeGitHubClient::with_pages(vec![vec![
            repo("api", Some(full_rule())),
            repo("web", Some(partial)),
            repo("docs", None),
        ]]));

        let report = collector(CollectorConfig::new("acme"), client)
            .collect()
            .await
            .expect("report");

        assert_eq!(report.collected_at, "2026-05-06T07:08:09Z");
        assert_eq!(report.scope.include_patterns, vec!["*".to_string()]);
        assert!(report.scope.exclude_patterns.is_empty());
        assert_eq!(report.scope.repositories_coverage, 100);
        assert_eq!(report.posture.branch_protection_coverage, 66);
        let rules = report.branch_protection_rules;
        assert_eq!(rules.pull_request_required, 66);
        assert_eq!(rules.approving_reviews, 66);
        assert_eq!(rules.status_checks, 66);
        assert_eq!(rules.dismiss_stale_reviews, 33);
        assert_eq!(rules.code_owner_reviews, 33);
        assert_eq!(rules.signed_commits, 33);
        assert_eq!(rules.admin_enforcement, 33);
        assert_eq!(report.access_control.two_factor_required, Some(true));
    }

    #[tokio::test]
    async fn include_patterns_limit_scope() {
        let client = Arc::new(FakeGitHubClient::with_pages(vec![vec![
            repo("prod-a", None),
            repo("prod-b", None),
            repo("test-c", None),
        ]]));
        let mut config = CollectorConfig::new("acme");
        config.include_patterns = vec!["prod-*".to_string()];

        let report = collector(config, client.clone())
            .collect()
            .await
            .expect("report");

        assert_eq!(report.scope.repositories_coverage, 66);
        assert_eq!(client.settings_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exclude_patterns_win_over_includes() {
        let client = Arc::new(FakeGitHubClient::with_pages(vec![vec![
            repo("service", Some(full_rule())),
            repo("service-archive", Some(full_rule())),
        ]]));
        let mut config = CollectorConfig::new("acme");
        config.exclude_patterns = vec!["*-archive".to_string()];

        let report = collector(config, client).collect().await.expect("report");

        assert_eq!(report.scope.repositories_coverage, 50);
        assert_eq!(report.posture.branch_protection_coverage, 100);
        assert_eq!(report.scope.exclude_patterns, vec!["*-archive".to_string()]);
    }

    #[tokio::test]
    async fn unknown_two_factor_stays_unknown() {
        let mut client = FakeGitHubClient::with_pages(vec![vec![repo("api", Some(full_rule()))]]);
        client.org = Some(Ok(OrgAccessState::default()));

        let report = collector(CollectorConfig::new("acme"), Arc::new(client))
            .collect()
            .await
            .expect("report");

        assert_eq!(report.access_control.two_factor_required, None);
        assert_eq!(report.posture.branch_protection_coverage, 100);
        assert_eq!(report.scope.repositories_coverage, 100);
    }

    #[tokio::test]
    async fn failed_settings_lookup_counts_as_disabled() {
        let enabled = RepositorySecuritySettings {
            secret_scanning: true,
            secret_scanning_push_protection: true,
            dependabot_security_updates: true,
            code_scanning_enabled: true,
        };
        let mut client =
            FakeGitHubClient::with_pages(vec![vec![repo("good", None), repo("broken", None)]]);
        client.settings.insert("good".to_string(), Ok(enabled));
        client.settings.insert(
            "broken".to_string(),
            Err(FetchError::Status {
                status: 404,
                message: "not found".to_string(),
            }),
        );

        let report = collector(CollectorConfig::new("acme"), Arc::new(client))
            .collect()
            .await
            .expect("report");

        assert_eq!(report.scope.repositories_coverage, 100);
        assert_eq!(report.security_features.secret_scanning, 50);
        assert_eq!(report.security_features.code_scanning, 50);
        assert_eq!(report.security_features.dependabot_security_updates, 50);
        assert_eq!(report.security_features.secret_scanning_push_protection, 50);
        // 4 of 10 feature slots.
        assert_eq!(report.posture.security_features_coverage, 40);
    }

    #[tokio::test]
    async fn org_security_failure_is_fatal() {
        let mut client = FakeGitHubClient::with_pages(vec![vec![repo("api", None)]]);
        client.org = Some(Err(FetchError::Transport("connection refused".to_string())));
        let client = Arc::new(client);

        let err = collector(CollectorConfig::new("acme"), client.clone())
            .collect()
            .await
            .unwrap_err();

        assert!(matches!(err, PostureError::OrgSecurity(_)));
        assert_eq!(client.page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repository_failure_discards_partial_pages() {
        let mut client = FakeGitHubClient::with_pages(vec![
            vec![repo("a", None)],
            vec![repo("b", None)],
            vec![repo("c", None)],
        ]);
        client.failing_page = Some(1);
        let client = Arc::new(client);

        let err = collector(CollectorConfig::new("acme"), client.clone())
            .collect()
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("failed to fetch repositories"));
        assert_eq!(client.page_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.settings_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pages_are_followed_until_exhausted() {
        let client = Arc::new(FakeGitHubClient::with_pages(vec![
            vec![repo("a", Some(full_rule())), repo("b", None)],
            vec![repo("c", None)],
        ]));

        let report = collector(CollectorConfig::new("acme"), client.clone())
            .collect()
            .await
            .expect("report");

        assert_eq!(client.page_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.settings_calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.posture.branch_protection_coverage, 33);
    }

    #[tokio::test]
    async fn empty_organization_is_rejected_before_fetching() {
        let client = Arc::new(FakeGitHubClient::default());
        let err = collector(CollectorConfig::new(""), client.clone())
            .collect()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PostureError::Config("organization is required".to_string())
        );
        assert_eq!(client.page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn organization_without_repositories_reports_zero() {
        let client = Arc::new(FakeGitHubClient::default());
        let report = collector(CollectorConfig::new("acme"), client)
            .collect()
            .await
            .expect("report");

        assert_eq!(report.scope.repositories_coverage, 0);
        assert_eq!(report.posture.branch_protection_coverage, 0);
        assert_eq!(report.posture.security_features_coverage, 0);
    }

    #[tokio::test]
    async fn repeated_runs_produce_identical_reports() {
        let mut client = FakeGitHubClient::with_pages(vec![
            vec![repo("a", Some(full_rule())), repo("b", None)],
            vec![repo("c", None)],
        ]);
        client.settings.insert(
            "b".to_string(),
            Ok(RepositorySecuritySettings {
                secret_scanning: true,
                ..Default::default()
            }),
        );
        let collector = collector(CollectorConfig::new("acme"), Arc::new(client));

        let first = collector.collect().await.expect("first");
        let second = collector.collect().await.expect("second");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn concurrency_does_not_change_counts() {
        let page_of = |page: usize| -> Vec<RepositoryRecord> {
            (0..5)
                .map(|i| repo(&format!("repo-{page}-{i}"), None))
                .collect()
        };
        let pages: Vec<Vec<RepositoryRecord>> = (0..4).map(page_of).collect();
        let mut client = FakeGitHubClient::with_pages(pages);
        for page in 0..4 {
            client.settings.insert(
                format!("repo-{page}-0"),
                Ok(RepositorySecuritySettings {
                    dependabot_security_updates: true,
                    ..Default::default()
                }),
            );
        }
        client.settings.insert(
            "repo-1-1".to_string(),
            Err(FetchError::Transport("timeout".to_string())),
        );
        let client = Arc::new(client);

        let mut sequential = CollectorConfig::new("acme");
        sequential.settings_concurrency = 1;
        let mut parallel = CollectorConfig::new("acme");
        parallel.settings_concurrency = 8;

        let first = collector(sequential, client.clone())
            .collect()
            .await
            .expect("sequential");
        let second = collector(parallel, client)
            .collect()
            .await
            .expect("parallel");

        assert_eq!(first, second);
        assert_eq!(first.security_features.dependabot_security_updates, 20);
    }

    #[tokio::test]
    async fn reporter_sees_phases_and_per_repository_progress() {
        let client = Arc::new(FakeGitHubClient::with_pages(vec![vec![
            repo("a", None),
            repo("b", None),
        ]]));
        let reporter = Arc::new(RecordingReporter::default());

        collector(CollectorConfig::new("acme"), client)
            .with_reporter(reporter.clone())
            .collect()
            .await
            .expect("report");

        let statuses = reporter.statuses.lock().expect("statuses").clone();
        assert_eq!(statuses[0], "Fetching organization security settings");
        assert!(statuses.contains(&"Enumerated 2 repositories".to_string()));
        assert!(statuses.contains(&"Fetching security settings for 2 repositories".to_string()));
        let progress = reporter.progress.lock().expect("progress").clone();
        assert_eq!(progress, vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn cancellation_before_start_returns_cancelled() {
        let client = Arc::new(FakeGitHubClient::with_pages(vec![vec![repo("a", None)]]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = collector(CollectorConfig::new("acme"), client.clone())
            .collect_with_cancel(&cancel)
            .await
            .unwrap_err();

        assert_eq!(err, PostureError::Cancelled);
        assert_eq!(client.page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_aborts_pending_settings_lookups() {
        let mut client = FakeGitHubClient::with_pages(vec![vec![repo("a", None), repo("b", None)]]);
        client.hang_settings = true;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = collector(CollectorConfig::new("acme"), Arc::new(client))
            .collect_with_cancel(&cancel)
            .await
            .unwrap_err();

        assert_eq!(err, PostureError::Cancelled);
    }

    #[tokio::test]
    async fn org_server_error_aborts_the_run() {
        let mut client = FakeGitHubClient::with_pages(vec![vec![repo("api", None)]]);
        client.org = Some(Err(FetchError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        }));
        let client = Arc::new(client);

        let err = collector(CollectorConfig::new("acme"), client.clone())
            .collect()
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to fetch org security: github api error (502): bad gateway"
        );
        assert_eq!(client.page_calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.settings_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_org_security_fetch() {
        let mut client = FakeGitHubClient::with_pages(vec![vec![repo("a", None)]]);
        client.hang_org = true;
        let client = Arc::new(client);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = collector(CollectorConfig::new("acme"), client.clone())
            .collect_with_cancel(&cancel)
            .await
            .unwrap_err();

        assert_eq!(err, PostureError::Cancelled);
        assert_eq!(client.org_calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_repository_enumeration() {
        let mut client = FakeGitHubClient::with_pages(vec![
            vec![repo("a", None)],
            vec![repo("b", None)],
            vec![repo("c", None)],
        ]);
        client.hang_page = Some(1);
        let client = Arc::new(client);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = collector(CollectorConfig::new("acme"), client.clone())
            .collect_with_cancel(&cancel)
            .await
            .unwrap_err();

        assert_eq!(err, PostureError::Cancelled);
        assert_eq!(client.page_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.settings_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deserialized_organization_is_trimmed_for_the_report() {
        let client = Arc::new(FakeGitHubClient::with_pages(vec![vec![repo("a", None)]]));
        let config: CollectorConfig =
            serde_json::from_str(r#"{"organization":" acme "}"#).expect("config");

        let report = collector(config, client).collect().await.expect("report");

        assert_eq!(report.organization, "acme");
    }
}
