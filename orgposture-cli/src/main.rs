#![deny(missing_docs)]
//! orgposture command-line interface.
//!
//! Collects the security posture of a GitHub organization and renders it as
//! text, Markdown, or JSON.

mod app_auth;
mod github;
mod progress;

use clap::{Args, Parser, Subcommand, ValueEnum};
use github::{ApiEndpoints, DEFAULT_API_URL, ReqwestGitHubClient};
use orgposture_core::{
    CancellationToken, Collector, CollectorConfig, Credentials, DEFAULT_SETTINGS_CONCURRENCY,
    PostureReport, SystemClock, render_json, render_posture_markdown, render_schema_json,
    two_factor_label,
};
use progress::TerminalProgress;
use serde::Deserialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "orgposture", version, about = "GitHub organization security posture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct AuthArgs {
    /// Personal access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// GitHub App ID.
    #[arg(long, env = "GITHUB_APP_ID")]
    app_id: Option<u64>,
    /// GitHub App installation ID for the organization.
    #[arg(long, env = "GITHUB_APP_INSTALLATION_ID")]
    installation_id: Option<u64>,
    /// GitHub App private key (PEM).
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
    /// Read the GitHub App private key from a file; wins over `--private-key`.
    #[arg(long)]
    private_key_path: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct ApiArgs {
    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// GitHub GraphQL endpoint; defaults to `<api-url>/graphql`.
    #[arg(long, env = "GITHUB_GRAPHQL_URL")]
    graphql_url: Option<String>,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Args, Clone, Debug)]
struct CollectArgs {
    /// Organization login to scan.
    #[arg(long, env = "GITHUB_ORG")]
    org: Option<String>,
    /// Repository name patterns to include (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    include: Vec<String>,
    /// Repository name patterns to exclude (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,
    /// JSON collector configuration; command-line values take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    auth: AuthArgs,
    #[command(flatten)]
    api: ApiArgs,
    /// Concurrent repository settings lookups.
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,
    /// Abort the collection after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,
    /// Disable the progress display.
    #[arg(long)]
    no_progress: bool,
    #[command(flatten)]
    report: OutputArgs,
}

#[derive(Args, Clone, Debug)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the security posture of an organization.
    Collect(CollectArgs),
    /// Print the OpenAPI schema of the posture report.
    Schema(SchemaArgs),
}

/// Collector configuration file, using the collector's snake_case keys.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    organization: Option<String>,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    app_id: Option<u64>,
    installation_id: Option<u64>,
    github_token: Option<String>,
    private_key: Option<String>,
    settings_concurrency: Option<usize>,
}

/// Fully resolved inputs for one collection.
#[derive(Debug)]
struct CollectPlan {
    config: CollectorConfig,
    credentials: Credentials,
    endpoints: ApiEndpoints,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect(args) => run_collect(args).await?,
        Commands::Schema(args) => run_schema(args).await?,
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_collect(args: CollectArgs) -> CliResult<()> {
    let plan = build_plan(&args).await?;
    log::debug!("resolved collection plan: {plan:?}");
    let client = ReqwestGitHubClient::new(plan.endpoints, plan.credentials, Arc::new(SystemClock))?;

    let progress = (!args.no_progress).then(|| Arc::new(TerminalProgress::new()));
    let mut collector = Collector::new(plan.config, Arc::new(client));
    if let Some(progress) = &progress {
        collector = collector.with_reporter(progress.clone());
    }

    let cancel = CancellationToken::new();
    let triggers = spawn_cancel_triggers(cancel.clone(), args.timeout.map(Duration::from_secs));
    let result = collector.collect_with_cancel(&cancel).await;
    triggers.abort();
    if let Some(progress) = &progress {
        progress.finish();
    }

    let report = result?;
    emit_report(&report, &args.report).await
}

async fn run_schema(args: SchemaArgs) -> CliResult<()> {
    let mut contents = render_schema_json()?;
    contents.push('\n');
    emit_output(args.report_output.as_deref(), contents).await
}

/// Merge command-line values over the optional config file.
async fn build_plan(args: &CollectArgs) -> CliResult<CollectPlan> {
    let file = match &args.config {
        Some(path) => load_file_config(path).await?,
        None => FileConfig::default(),
    };

    let private_key = match (&args.auth.private_key_path, &args.auth.private_key) {
        (Some(path), _) => Some(tokio::fs::read_to_string(path).await.map_err(|err| {
            format!("failed to read private key {}: {err}", path.display())
        })?),
        (None, Some(key)) => Some(key.clone()),
        (None, None) => file.private_key,
    };

    let organization = args.org.clone().or(file.organization).unwrap_or_default();
    let mut config = CollectorConfig::new(organization);
    config.include_patterns = prefer_args(&args.include, &file.include_patterns);
    config.exclude_patterns = prefer_args(&args.exclude, &file.exclude_patterns);
    config.settings_concurrency = args
        .concurrency
        .or(file.settings_concurrency)
        .unwrap_or(DEFAULT_SETTINGS_CONCURRENCY);
    config.validate()?;

    let credentials = Credentials::resolve(
        args.auth.token.as_deref().or(file.github_token.as_deref()),
        args.auth.app_id.or(file.app_id),
        args.auth.installation_id.or(file.installation_id),
        private_key.as_deref(),
    )?;

    Ok(CollectPlan {
        config,
        credentials,
        endpoints: ApiEndpoints::new(&args.api.api_url, args.api.graphql_url.as_deref()),
    })
}

fn prefer_args(args: &[String], file: &[String]) -> Vec<String> {
    let args = normalize_patterns(args);
    if args.is_empty() {
        normalize_patterns(file)
    } else {
        args
    }
}

fn normalize_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|pattern| pattern.trim())
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

async fn load_file_config(path: &Path) -> CliResult<FileConfig> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| format!("failed to read config {}: {err}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid config {}: {err}", path.display()))?;
    Ok(config)
}

/// Cancel `cancel` on Ctrl-C or once `timeout` elapses.
fn spawn_cancel_triggers(
    cancel: CancellationToken,
    timeout: Option<Duration>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::warn!("interrupt received, cancelling collection"),
            _ = deadline => log::warn!("timeout reached, cancelling collection"),
        }
        cancel.cancel();
    })
}

async fn emit_report(report: &PostureReport, output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_posture_text(report),
        OutputFormat::Markdown => render_posture_markdown(report),
        OutputFormat::Json => {
            let mut json = render_json(report)?;
            json.push('\n');
            json
        }
    };
    emit_output(output.report_output.as_deref(), contents).await
}

async fn emit_output(path: Option<&Path>, contents: String) -> CliResult<()> {
    if let Some(path) = path {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn render_posture_text(report: &PostureReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Organization: {}", report.organization);
    let _ = writeln!(output, "Collected at: {}", report.collected_at);
    let _ = writeln!(
        output,
        "Include patterns: {}",
        join_patterns(&report.scope.include_patterns)
    );
    let _ = writeln!(
        output,
        "Exclude patterns: {}",
        join_patterns(&report.scope.exclude_patterns)
    );
    let _ = writeln!(
        output,
        "Repositories in scope: {}%",
        report.scope.repositories_coverage
    );
    let _ = writeln!(
        output,
        "Branch protection coverage: {}%",
        report.posture.branch_protection_coverage
    );
    let _ = writeln!(
        output,
        "Security features coverage: {}%",
        report.posture.security_features_coverage
    );
    let _ = writeln!(
        output,
        "Two-factor required: {}",
        two_factor_label(report.access_control.two_factor_required)
    );

    let rules = &report.branch_protection_rules;
    let _ = writeln!(output, "Branch protection rules:");
    for (label, value) in [
        ("Pull request required", rules.pull_request_required),
        ("Approving reviews", rules.approving_reviews),
        ("Dismiss stale reviews", rules.dismiss_stale_reviews),
        ("Code owner reviews", rules.code_owner_reviews),
        ("Status checks", rules.status_checks),
        ("Signed commits", rules.signed_commits),
        ("Admin enforcement", rules.admin_enforcement),
    ] {
        let _ = writeln!(output, "  - {label}: {value}%");
    }

    let features = &report.security_features;
    let _ = writeln!(output, "Security features:");
    for (label, value) in [
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
    ] {
        let _ = writeln!(output, "  - {label}: {value}%");
    }
    output
}

fn join_patterns(patterns: &[String]) -> String {
    if patterns.is_empty() {
        "none".to_string()
    } else {
        patterns.join(", ")
    }
}
