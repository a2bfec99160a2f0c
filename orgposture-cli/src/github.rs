//! reqwest transport for the GitHub REST and GraphQL APIs.

use crate::app_auth::{AppSigner, InstallationTokens};
use orgposture_core::{
    BranchProtectionRule, Clock, Credentials, FetchError, FetchFuture, GitHubClient,
    OrgAccessState, RepositoryPage, RepositoryRecord, RepositorySecuritySettings,
};
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use urlencoding::encode;

/// Public GitHub REST endpoint.
pub(crate) const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT_HEADER: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "orgposture";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const STATUS_ENABLED: &str = "enabled";
const STATE_CONFIGURED: &str = "configured";

const REPOSITORIES_QUERY: &str = r#"query($org: String!, $cursor: String) {
  organization(login: $org) {
    repositories(first: 100, after: $cursor) {
      nodes {
        name
        owner { login }
        hasVulnerabilityAlertsEnabled
        defaultBranchRef {
          branchProtectionRule {
            requiresApprovingReviews
            dismissesStaleReviews
            requiresCodeOwnerReviews
            requiresStatusChecks
            requiresCommitSignatures
            isAdminEnforced
          }
        }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

/// Base URLs for REST and GraphQL calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiEndpoints {
    pub(crate) api_url: String,
    pub(crate) graphql_url: String,
}

impl ApiEndpoints {
    /// Normalize the REST base URL and derive the GraphQL URL when absent.
    pub(crate) fn new(api_url: &str, graphql_url: Option<&str>) -> Self {
        let api_url = api_url.trim().trim_end_matches('/').to_string();
        let graphql_url = graphql_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{api_url}/graphql"));
        Self {
            api_url,
            graphql_url,
        }
    }
}

enum TokenSource {
    Static(String),
    App(InstallationTokens),
}

impl TokenSource {
    async fn bearer(&self) -> Result<String, FetchError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::App(tokens) => tokens.token().await,
        }
    }
}

/// [`GitHubClient`] backed by `reqwest`.
pub(crate) struct ReqwestGitHubClient {
    http: Client,
    endpoints: ApiEndpoints,
    tokens: TokenSource,
}

impl ReqwestGitHubClient {
    pub(crate) fn new(
        endpoints: ApiEndpoints,
        credentials: Credentials,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, FetchError> {
        let http = build_http_client()?;
        let tokens = match credentials {
            Credentials::Token(token) => TokenSource::Static(token),
            Credentials::App {
                app_id,
                installation_id,
                private_key,
            } => {
                let signer = AppSigner::from_pem(app_id, &private_key)?;
                TokenSource::App(InstallationTokens::new(
                    http.clone(),
                    &endpoints.api_url,
                    installation_id,
                    signer,
                    clock,
                ))
            }
        };
        Ok(Self {
            http,
            endpoints,
            tokens,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        let token = self.tokens.bearer().await?;
        request.bearer_auth(token).send().await.map_err(transport)
    }

    async fn org_security(&self, org: &str) -> Result<OrgAccessState, FetchError> {
        let url = format!("{}/orgs/{}", self.endpoints.api_url, encode(org));
        let response = self.send(self.http.get(url)).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            log::warn!("organization settings for {org} unavailable ({status})");
            return Ok(OrgAccessState::default());
        }
        if !status.is_success() {
            return Err(status_error(response).await);
        }
        let body = response.json::<OrgResponse>().await.map_err(decode)?;
        Ok(OrgAccessState {
            two_factor_required: body.two_factor_requirement_enabled,
        })
    }

    async fn repository_page(
        &self,
        org: &str,
        cursor: Option<&str>,
    ) -> Result<RepositoryPage, FetchError> {
        let payload = GraphQlRequest {
            query: REPOSITORIES_QUERY,
            variables: RepositoriesVariables { org, cursor },
        };
        let response = self
            .send(self.http.post(&self.endpoints.graphql_url).json(&payload))
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let body = response
            .json::<GraphQlResponse<RepositoriesData>>()
            .await
            .map_err(decode)?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|error| error.message).collect();
            return Err(FetchError::GraphQl(messages.join("; ")));
        }
        let organization = body
            .data
            .and_then(|data| data.organization)
            .ok_or_else(|| FetchError::GraphQl(format!("organization {org} not found")))?;

        let connection = organization.repositories;
        let page_info = connection.page_info;
        let next_cursor = match (page_info.has_next_page, page_info.end_cursor) {
            (true, Some(cursor)) => Some(cursor),
            (true, None) => {
                return Err(FetchError::GraphQl(
                    "missing endCursor on non-final page".to_string(),
                ));
            }
            (false, _) => None,
        };
        Ok(RepositoryPage {
            repositories: connection
                .nodes
                .into_iter()
                .flatten()
                .map(RepositoryRecord::from)
                .collect(),
            next_cursor,
        })
    }

    async fn repository_settings(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<RepositorySecuritySettings, FetchError> {
        let url = format!(
            "{}/repos/{}/{}",
            self.endpoints.api_url,
            encode(owner),
            encode(name)
        );
        let response = self.send(self.http.get(url)).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let body = response
            .json::<RepositoryResponse>()
            .await
            .map_err(decode)?;
        let analysis = body.security_and_analysis.unwrap_or_default();

        Ok(RepositorySecuritySettings {
            secret_scanning: is_enabled(&analysis.secret_scanning),
            secret_scanning_push_protection: is_enabled(&analysis.secret_scanning_push_protection),
            dependabot_security_updates: is_enabled(&analysis.dependabot_security_updates),
            code_scanning_enabled: self.code_scanning_configured(owner, name).await,
        })
    }

    /// Whether default code scanning setup is configured. Any failure reads as `false`.
    async fn code_scanning_configured(&self, owner: &str, name: &str) -> bool {
        let url = format!(
            "{}/repos/{}/{}/code-scanning/default-setup",
            self.endpoints.api_url,
            encode(owner),
            encode(name)
        );
        let response = match self.send(self.http.get(url)).await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::debug!(
                    "code scanning setup for {owner}/{name} unavailable ({})",
                    response.status()
                );
                return false;
            }
            Err(err) => {
                log::debug!("code scanning setup for {owner}/{name} failed: {err}");
                return false;
            }
        };
        match response.json::<CodeScanningSetup>().await {
            Ok(setup) => setup.state == STATE_CONFIGURED,
            Err(_) => false,
        }
    }
}

impl GitHubClient for ReqwestGitHubClient {
    fn fetch_org_security<'a>(&'a self, org: &'a str) -> FetchFuture<'a, OrgAccessState> {
        Box::pin(self.org_security(org))
    }

    fn fetch_repository_page<'a>(
        &'a self,
        org: &'a str,
        cursor: Option<&'a str>,
    ) -> FetchFuture<'a, RepositoryPage> {
        Box::pin(self.repository_page(org, cursor))
    }

    fn fetch_repository_settings<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> FetchFuture<'a, RepositorySecuritySettings> {
        Box::pin(self.repository_settings(owner, name))
    }
}

fn build_http_client() -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
    headers.insert(
        HeaderName::from_static(API_VERSION_HEADER),
        HeaderValue::from_static(API_VERSION),
    );
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(transport)
}

fn transport(err: reqwest::Error) -> FetchError {
    FetchError::Transport(err.to_string())
}

fn decode(err: reqwest::Error) -> FetchError {
    FetchError::Decode(err.to_string())
}

async fn status_error(response: Response) -> FetchError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&body)
        .map(|payload| payload.message)
        .unwrap_or_else(|_| body.trim().to_string());
    FetchError::Status { status, message }
}

fn is_enabled(feature: &Option<FeatureStatus>) -> bool {
    feature
        .as_ref()
        .is_some_and(|feature| feature.status == STATUS_ENABLED)
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OrgResponse {
    #[serde(default)]
    two_factor_requirement_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    #[serde(default)]
    security_and_analysis: Option<SecurityAndAnalysis>,
}

#[derive(Debug, Default, Deserialize)]
struct SecurityAndAnalysis {
    #[serde(default)]
    secret_scanning: Option<FeatureStatus>,
    #[serde(default)]
    secret_scanning_push_protection: Option<FeatureStatus>,
    #[serde(default)]
    dependabot_security_updates: Option<FeatureStatus>,
}

#[derive(Debug, Deserialize)]
struct FeatureStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct CodeScanningSetup {
    state: String,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: RepositoriesVariables<'a>,
}

#[derive(Debug, Serialize)]
struct RepositoriesVariables<'a> {
    org: &'a str,
    cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepositoriesData {
    organization: Option<OrganizationNode>,
}

#[derive(Debug, Deserialize)]
struct OrganizationNode {
    repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryConnection {
    #[serde(default)]
    nodes: Vec<Option<RepositoryNode>>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name: String,
    owner: OwnerNode,
    #[serde(default)]
    has_vulnerability_alerts_enabled: bool,
    default_branch_ref: Option<BranchRefNode>,
}

#[derive(Debug, Deserialize)]
struct OwnerNode {
    login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchRefNode {
    branch_protection_rule: Option<ProtectionRuleNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProtectionRuleNode {
    requires_approving_reviews: bool,
    dismisses_stale_reviews: bool,
    requires_code_owner_reviews: bool,
    requires_status_checks: bool,
    requires_commit_signatures: bool,
    is_admin_enforced: bool,
}

impl From<ProtectionRuleNode> for BranchProtectionRule {
    fn from(rule: ProtectionRuleNode) -> Self {
        Self {
            requires_approving_reviews: rule.requires_approving_reviews,
            dismisses_stale_reviews: rule.dismisses_stale_reviews,
            requires_code_owner_reviews: rule.requires_code_owner_reviews,
            requires_status_checks: rule.requires_status_checks,
            requires_commit_signatures: rule.requires_commit_signatures,
            is_admin_enforced: rule.is_admin_enforced,
        }
    }
}

impl From<RepositoryNode> for RepositoryRecord {
    fn from(node: RepositoryNode) -> Self {
        Self {
            owner: node.owner.login,
            name: node.name,
            vulnerability_alerts_enabled: node.has_vulnerability_alerts_enabled,
            branch_protection: node
                .default_branch_ref
                .and_then(|branch| branch.branch_protection_rule)
                .map(BranchProtectionRule::from),
        }
    }
}
