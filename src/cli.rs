//! The `pcq` command line.
//!
//! Each subcommand is one reporting or administration task. Credentials come
//! from the environment (see [`crate::config`]); everything else is a flag
//! with the defaults the tasks have always used.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{error, info, warn};

use pcq_admin::{input, AdminClient, AzureAppRegistration, FeatureState};
use pcq_auth::{AuthScheme, LoginClient, Session};
use pcq_client::ClientConfig;
use pcq_query::{export, OffsetResult, QueryClient, QueryOptions};

use crate::config::{required_env, AppConfig, ENV_AZURE_APP_SECRET};
use crate::logging::{LogSink, LoggingConfig, DEFAULT_LOG_FILE};

/// Vulnerability search download endpoint (gzip CSV).
pub const VULN_DOWNLOAD_PATH: &str = "uve/api/v1/vulnerabilities/search/download";
/// Code issues endpoint for branch scans.
pub const APPSEC_ISSUES_PATH: &str = "code/api/v2/code-issues/branch_scan";
/// Defenders endpoint on the secondary service.
pub const DEFENDERS_PATH: &str = "api/v33.01/defenders";

/// Reporting and administration tasks for Prisma Cloud.
#[derive(Debug, Parser)]
#[command(name = "pcq", version, about)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    /// File the log is appended to.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log to the console only.
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// Read variables from this file instead of searching for `.env`.
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Logging settings selected by the global flags.
    pub fn logging_config(&self) -> LoggingConfig {
        let sink = if self.no_log_file {
            LogSink::Stderr
        } else {
            LogSink::Both(self.log_file.clone())
        };
        LoggingConfig::new(self.debug, sink)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download a vulnerability search as CSV.
    VulnDownload(VulnDownloadArgs),
    /// Export code license issues with errors.
    AppsecLicenses(AppsecLicensesArgs),
    /// Export defender details from the runtime (Compute) service.
    Defenders(DefendersArgs),
    /// Enable or disable agentless scanning for organization member accounts.
    AgentlessMembers(AgentlessMembersArgs),
    /// Onboard Azure subscriptions listed in a CSV file.
    OnboardAzure(OnboardAzureArgs),
    /// Add labels to the policies listed in a CSV file.
    LabelPolicies(LabelPoliciesArgs),
}

#[derive(Debug, Args)]
pub struct VulnDownloadArgs {
    /// Vulnerability search query; prompted for when omitted.
    #[arg(long)]
    pub query: Option<String>,

    /// Where the gzip download is saved. The CSV is written next to it.
    #[arg(long, default_value = "list-vuln.csv.gz")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct AppsecLicensesArgs {
    #[arg(long, default_value = "appsec_licenses.csv")]
    pub output: PathBuf,

    /// Page size.
    #[arg(long, default_value_t = 1000)]
    pub limit: u32,

    #[arg(long, default_value_t = pcq_query::QueryOptions::default().max_pages)]
    pub max_pages: usize,
}

#[derive(Debug, Args)]
pub struct DefendersArgs {
    /// Defender type filter.
    #[arg(long = "type", default_value = "serverLinux")]
    pub defender_type: String,

    /// Full details, one column per flattened field.
    #[arg(long, default_value = "filtered_output.csv")]
    pub output: PathBuf,

    /// Hostname and kernel version only.
    #[arg(long, default_value = "filtered_hostname_kernel.csv")]
    pub kernel_output: PathBuf,

    /// Page size (the endpoint caps it at 50).
    #[arg(long, default_value_t = 50)]
    pub page_size: u32,

    #[arg(long, default_value_t = pcq_query::QueryOptions::default().max_pages)]
    pub max_pages: usize,
}

#[derive(Debug, Args)]
pub struct AgentlessMembersArgs {
    /// AWS Org ID, Azure Tenant ID or GCP Org ID; prompted for when omitted.
    #[arg(long)]
    pub org_id: Option<String>,

    #[arg(long, default_value = "member_accounts.csv")]
    pub members_csv: PathBuf,

    #[arg(long, default_value = "member_account_id")]
    pub column: String,

    /// `enabled` or `disabled`.
    #[arg(long, default_value = "disabled")]
    pub state: FeatureState,

    #[arg(long, default_value = pcq_admin::AGENTLESS_SCANNING_FEATURE)]
    pub feature: String,
}

#[derive(Debug, Args)]
pub struct OnboardAzureArgs {
    #[arg(long)]
    pub tenant_id: String,

    /// Application (client) id of the app registration.
    #[arg(long)]
    pub client_id: String,

    /// Enterprise application object id.
    #[arg(long)]
    pub service_principal_id: String,

    /// CSV with `subscription_id` and `prisma_name` columns.
    #[arg(long, default_value = "azure_details.csv")]
    pub csv: PathBuf,

    /// Account group to attach; repeatable.
    #[arg(long = "group-id")]
    pub group_ids: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LabelPoliciesArgs {
    #[arg(long, default_value = "policy_ids.csv")]
    pub csv: PathBuf,

    #[arg(long, default_value = "PolicyIDs")]
    pub column: String,

    /// Label to set; repeatable.
    #[arg(long = "label", default_value = "Retain_Severity")]
    pub labels: Vec<String>,
}

/// Run one command.
///
/// `input` answers prompts for values not given as flags.
pub async fn run(command: Command, config: &AppConfig, input: &mut impl BufRead) -> anyhow::Result<()> {
    match command {
        Command::VulnDownload(args) => vuln_download(config, args, input).await,
        Command::AppsecLicenses(args) => appsec_licenses(config, args).await,
        Command::Defenders(args) => defenders(config, args).await,
        Command::AgentlessMembers(args) => agentless_members(config, args, input).await,
        Command::OnboardAzure(args) => {
            let secret = required_env(ENV_AZURE_APP_SECRET)?;
            onboard_azure(config, args, secret).await
        }
        Command::LabelPolicies(args) => label_policies(config, args).await,
    }
}

async fn primary_session(config: &AppConfig) -> anyhow::Result<Session> {
    let login = LoginClient::new()?;
    let session = login
        .authenticate(&config.credentials)
        .await
        .context("Unable to authenticate")?;
    Ok(session)
}

async fn secondary_session(config: &AppConfig) -> anyhow::Result<Session> {
    let login = LoginClient::new()?;
    let primary = login
        .authenticate(&config.credentials)
        .await
        .context("Unable to authenticate")?;
    let endpoint = login
        .resolve_secondary_endpoint(&primary)
        .await
        .context("Unable to find the Compute URL")?;
    let session = login
        .authenticate_secondary(&endpoint, &config.credentials)
        .await
        .context("Unable to authenticate with Compute")?;
    Ok(session)
}

fn prompt(input: &mut impl BufRead, message: &str) -> anyhow::Result<String> {
    println!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim().to_string();
    if answer.is_empty() {
        bail!("no answer given to: {message}");
    }
    Ok(answer)
}

pub async fn vuln_download(
    config: &AppConfig,
    args: VulnDownloadArgs,
    input: &mut impl BufRead,
) -> anyhow::Result<()> {
    let query = match args.query {
        Some(query) => query,
        None => prompt(
            input,
            "Enter your vulnerability investigate query i.e. vulnerability where asset.type IN ('Host') AND severity IN ('high', 'critical')",
        )?,
    };

    let session = primary_session(config).await?;
    let client = QueryClient::with_config(session, ClientConfig::for_downloads())?;

    let stream = client
        .run_streaming_query(VULN_DOWNLOAD_PATH, &json!({ "query": query }))
        .await
        .context("Vulnerability download failed")?;
    info!("File downloading");
    let bytes = export::persist_stream(stream, &args.output).await?;
    info!(path = %args.output.display(), bytes, "Wrote gzip to disk");

    let csv_path = export::decompress_gzip_file(&args.output)?;
    info!(path = %csv_path.display(), "Extracted CSV");
    Ok(())
}

pub async fn appsec_licenses(config: &AppConfig, args: AppsecLicensesArgs) -> anyhow::Result<()> {
    let session = primary_session(config)
        .await?
        .with_scheme(AuthScheme::RawAuthorization);
    let client = QueryClient::new(session)?
        .with_options(QueryOptions::default().with_max_pages(args.max_pages));

    let filters = json!({
        "filters": {
            "checkStatus": "Error",
            "codeCategories": ["Licenses"]
        }
    });
    let records = match client
        .run_paginated_query(APPSEC_ISSUES_PATH, &filters, args.limit)
        .await
    {
        Ok(records) => records,
        Err(e) => {
            let fetched = e.partial_records().len();
            return Err(e).with_context(|| format!("License issue query failed ({fetched} records fetched)"));
        }
    };

    write_full_csv(&args.output, &records)
}

pub async fn defenders(config: &AppConfig, args: DefendersArgs) -> anyhow::Result<()> {
    let session = secondary_session(config).await?;
    let client = QueryClient::new(session)?
        .with_options(QueryOptions::default().with_max_pages(args.max_pages));

    info!("Connect via the Prisma API");
    let OffsetResult { total, records } = client
        .run_offset_paged_query_with_total(
            DEFENDERS_PATH,
            &[("type", args.defender_type.as_str())],
            args.page_size,
        )
        .await
        .context("Defender query failed")?;
    println!("Total Number of Defenders {total}");

    if records.is_empty() {
        warn!("No defenders returned, nothing written");
        return Ok(());
    }

    write_full_csv(&args.output, &records)?;
    info!("Extract hostname and kernel data to csv");
    export::write_csv_columns(
        &args.kernel_output,
        &records,
        &["hostname", "systemInfo.kernelVersion"],
    )?;
    Ok(())
}

fn write_full_csv(path: &Path, records: &[serde_json::Value]) -> anyhow::Result<()> {
    if records.is_empty() {
        warn!("Query returned no records, nothing written");
        return Ok(());
    }
    info!("Normalize the data and output full details to csv");
    let rows = export::write_csv(path, records)?;
    info!(path = %path.display(), rows, "Wrote results");
    Ok(())
}

pub async fn agentless_members(
    config: &AppConfig,
    args: AgentlessMembersArgs,
    input: &mut impl BufRead,
) -> anyhow::Result<()> {
    let org_id = match args.org_id {
        Some(id) => id,
        None => prompt(input, "Enter your AWS Org ID, Azure Tenant ID or GCP Org ID")?,
    };
    let member_ids = input::read_column(&args.members_csv, &args.column)?;

    let session = primary_session(config).await?;
    let admin = AdminClient::new(session)?;
    let message = admin
        .update_member_features(&org_id, &member_ids, &args.feature, args.state)
        .await
        .context("Member account update failed")?;

    info!(%message, members = ?member_ids, "Member accounts updated");
    Ok(())
}

pub async fn onboard_azure(
    config: &AppConfig,
    args: OnboardAzureArgs,
    client_secret: String,
) -> anyhow::Result<()> {
    let subscriptions = input::read_azure_subscriptions(&args.csv)?;
    let app = AzureAppRegistration {
        tenant_id: args.tenant_id,
        client_id: args.client_id,
        client_secret,
        service_principal_id: args.service_principal_id,
    };

    let session = primary_session(config).await?;
    let admin = AdminClient::new(session)?;
    let outcome = if args.group_ids.is_empty() {
        admin.onboard_azure_subscriptions(&app, &subscriptions).await
    } else {
        admin
            .onboard_azure_subscriptions_with_groups(&app, &subscriptions, &args.group_ids)
            .await
    };

    for id in &outcome.succeeded {
        info!(subscription_id = %id, "Onboarded subscription");
    }
    report_batch("subscriptions", outcome)
}

pub async fn label_policies(config: &AppConfig, args: LabelPoliciesArgs) -> anyhow::Result<()> {
    let policy_ids = input::read_column(&args.csv, &args.column)?;

    let session = primary_session(config).await?;
    let admin = AdminClient::new(session)?;
    let outcome = admin.add_policy_labels(&policy_ids, &args.labels).await;

    report_batch("policies", outcome)
}

fn report_batch(what: &str, outcome: pcq_admin::BatchOutcome<pcq_admin::Error>) -> anyhow::Result<()> {
    for (id, err) in &outcome.failed {
        error!(id = %id, error = %err, "Item failed");
    }
    info!(
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "Batch finished"
    );
    if !outcome.is_complete_success() {
        bail!(
            "{} of {} {} failed",
            outcome.failed.len(),
            outcome.attempted(),
            what
        );
    }
    Ok(())
}
