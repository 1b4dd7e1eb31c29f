use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono_tz::Tz;
use clap::Args;
use dialoguer::Input;
use serde::Serialize;
use serde_json::{json, Value};

use crate::args::BaseArgs;
use crate::error::{FailureKind, SyncError};
use crate::http::ApiClient;
use crate::timefmt;
use crate::ui::{print_command_status, report_table, with_spinner, CommandStatus};
use crate::utils::count_label;

pub mod api;
pub mod poll;
pub mod report;

use api::{ProgressState, SyncTarget};
use poll::PollPolicy;
use report::{SyncOutcome, TableSyncRecord};

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// IANA timezone used to render per-table update times
    #[arg(long, env = "LAKESYNC_TIMEZONE", default_value = "Europe/Madrid")]
    timezone: String,

    /// Seconds between status checks while the refresh batch is running
    #[arg(long, default_value_t = 1)]
    poll_interval: u64,

    /// Give up after this many status checks (default: poll until terminal)
    #[arg(long)]
    max_polls: Option<u32>,
}

#[derive(Debug, Clone, Args)]
pub struct EndpointArgs {
    #[command(flatten)]
    target: TargetArgs,
}

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    /// SQL endpoint id the batch was submitted against
    #[arg(long)]
    endpoint: String,

    /// Batch id returned when the refresh was submitted
    #[arg(long)]
    batch: String,

    /// IANA timezone used to render per-table update times
    #[arg(long, env = "LAKESYNC_TIMEZONE", default_value = "Europe/Madrid")]
    timezone: String,
}

#[derive(Debug, Clone, Args)]
struct TargetArgs {
    /// Workspace id (or via LAKESYNC_WORKSPACE_ID)
    #[arg(short = 'w', long, env = "LAKESYNC_WORKSPACE_ID")]
    workspace: Option<String>,

    /// Lakehouse id (or via LAKESYNC_LAKEHOUSE_ID)
    #[arg(short = 'l', long, env = "LAKESYNC_LAKEHOUSE_ID")]
    lakehouse: Option<String>,
}

impl TargetArgs {
    fn resolve(&self) -> Result<SyncTarget> {
        Ok(SyncTarget {
            workspace_id: resolve_id(
                self.workspace.as_deref(),
                "Workspace id",
                "--workspace or LAKESYNC_WORKSPACE_ID",
            )?,
            lakehouse_id: resolve_id(
                self.lakehouse.as_deref(),
                "Lakehouse id",
                "--lakehouse or LAKESYNC_LAKEHOUSE_ID",
            )?,
        })
    }
}

fn resolve_id(value: Option<&str>, prompt: &str, hint: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => {
            if !std::io::stdin().is_terminal() {
                bail!("{} required. Use {hint}", prompt.to_lowercase());
            }
            Ok(Input::new().with_prompt(prompt).interact_text()?)
        }
    }
}

fn require_token(base: &BaseArgs) -> Result<String> {
    match &base.token {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => bail!("no API token configured. Pass --token or set LAKESYNC_TOKEN"),
    }
}

/// Knobs for one orchestration run.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub timezone: Tz,
    pub poll: PollPolicy,
}

/// Final word on one orchestration run. `Failure` covers both client faults
/// and server-reported outcomes, distinguished by `kind`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncReport {
    Success { tables: Vec<TableSyncRecord> },
    Failure { kind: FailureKind, detail: Value },
}

/// Runs resolve → initiate → poll → classify for one workspace/lakehouse
/// pair. Every stage fault is funneled into `SyncReport::Failure`; this
/// function never fails and submits exactly one refresh batch per call.
pub async fn sync_lakehouse(
    client: &ApiClient,
    target: &SyncTarget,
    opts: &SyncOptions,
) -> SyncReport {
    report_from(run_stages(client, target, opts).await)
}

async fn run_stages(
    client: &ApiClient,
    target: &SyncTarget,
    opts: &SyncOptions,
) -> Result<SyncOutcome, SyncError> {
    let sql_endpoint_id = api::fetch_sql_endpoint_id(client, target).await?;
    let job = api::initiate_sync(client, &sql_endpoint_id).await?;
    let status = poll::poll_until_terminal(opts.poll, || {
        api::fetch_batch_status(client, &sql_endpoint_id, &job.batch_id)
    })
    .await?;
    report::classify(&status, opts.timezone)
}

fn report_from(result: Result<SyncOutcome, SyncError>) -> SyncReport {
    match result {
        Ok(SyncOutcome::Completed { tables }) => SyncReport::Success { tables },
        Ok(SyncOutcome::Failed { detail }) => SyncReport::Failure {
            kind: FailureKind::RefreshFailed,
            detail,
        },
        Ok(SyncOutcome::Ambiguous { state }) => SyncReport::Failure {
            kind: FailureKind::AmbiguousState,
            detail: Value::String(format!("server reported unexpected terminal state {state:?}")),
        },
        Err(err) => SyncReport::Failure {
            kind: err.kind(),
            detail: Value::String(err.to_string()),
        },
    }
}

pub async fn run(base: BaseArgs, args: RunArgs) -> Result<()> {
    let client = ApiClient::new(&base.api_url, &require_token(&base)?)?;
    let target = args.target.resolve()?;
    let opts = SyncOptions {
        timezone: timefmt::parse_zone(&args.timezone)?,
        poll: PollPolicy {
            interval: Duration::from_secs(args.poll_interval.max(1)),
            max_attempts: args.max_polls,
        },
    };

    let report = with_spinner(
        "Synchronizing SQL endpoint metadata...",
        sync_lakehouse(&client, &target, &opts),
    )
    .await;
    render_report(&report, base.json)
}

pub async fn run_endpoint(base: BaseArgs, args: EndpointArgs) -> Result<()> {
    let client = ApiClient::new(&base.api_url, &require_token(&base)?)?;
    let target = args.target.resolve()?;

    let sql_endpoint_id = with_spinner(
        "Resolving SQL endpoint...",
        api::fetch_sql_endpoint_id(&client, &target),
    )
    .await?;

    if base.json {
        println!("{}", json!({ "sqlEndpointId": sql_endpoint_id }));
    } else {
        println!("{sql_endpoint_id}");
    }
    Ok(())
}

pub async fn run_status(base: BaseArgs, args: StatusArgs) -> Result<()> {
    let client = ApiClient::new(&base.api_url, &require_token(&base)?)?;
    let timezone = timefmt::parse_zone(&args.timezone)?;

    let status = with_spinner(
        "Checking refresh batch...",
        api::fetch_batch_status(&client, &args.endpoint, &args.batch),
    )
    .await?;

    if status.progress_state == ProgressState::InProgress {
        if base.json {
            println!("{}", json!({ "status": "in_progress" }));
        } else {
            print_command_status(CommandStatus::Warning, "Refresh batch is still running");
        }
        return Ok(());
    }

    let report = report_from(report::classify(&status, timezone));
    render_report(&report, base.json)
}

fn render_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match report {
        SyncReport::Success { tables } => {
            print_command_status(
                CommandStatus::Success,
                &format!(
                    "Metadata refresh completed ({} in sync)",
                    count_label(tables.len(), "table")
                ),
            );
            if !tables.is_empty() {
                let mut table = report_table(&["Table", "Last update", "Table sync", "SQL sync"]);
                for record in tables {
                    table.add_row(vec![
                        &record.table_name,
                        &record.last_update,
                        &record.table_sync_state,
                        &record.sql_sync_state,
                    ]);
                }
                println!("{table}");
            }
        }
        SyncReport::Failure { kind, detail } => {
            let status = if *kind == FailureKind::AmbiguousState {
                CommandStatus::Warning
            } else {
                CommandStatus::Error
            };
            print_command_status(
                status,
                &format!(
                    "Metadata refresh did not complete ({}): {}",
                    kind.as_str(),
                    detail_text(detail)
                ),
            );
        }
    }
    Ok(())
}

fn detail_text(detail: &Value) -> String {
    match detail {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
