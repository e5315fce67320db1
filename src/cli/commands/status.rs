//! Status command - show registration and cache partitions

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::error::ShellCacheResult;
use crate::host::{PartitionStatus, PartitionSummary, WorkerHost};
use crate::journal::JournalEntry;
use crate::ui::{self, UiContext};
use crate::worker::{Registration, VersionRecord};
use console::style;
use serde::Serialize;
use std::path::Path;

const RECENT_EVENTS: usize = 5;

#[derive(Serialize)]
struct StatusReport<'a> {
    state_dir: &'a Path,
    backend: &'static str,
    registration: Option<&'a Registration>,
    partitions: &'a [PartitionSummary],
    events: &'a [JournalEntry],
}

/// Execute the status command
pub async fn execute(args: StatusArgs, host: &WorkerHost) -> ShellCacheResult<()> {
    let registration = host.registration().await?;
    let partitions = host.partitions().await?;
    let events = host.recent_events(RECENT_EVENTS).await?;

    match args.format {
        OutputFormat::Json => {
            let report = StatusReport {
                state_dir: host.layout().root(),
                backend: host.storage().backend_name(),
                registration: registration.as_ref(),
                partitions: &partitions,
                events: &events,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            for partition in &partitions {
                println!("{}", partition.name);
            }
        }
        OutputFormat::Table => print_table(host, registration.as_ref(), &partitions, &events),
    }

    Ok(())
}

fn describe(record: Option<&VersionRecord>) -> String {
    match record {
        Some(record) => format!("v{} ({})", record.version, record.state),
        None => "none".to_string(),
    }
}

fn print_table(
    host: &WorkerHost,
    registration: Option<&Registration>,
    partitions: &[PartitionSummary],
    events: &[JournalEntry],
) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &format!("{} status", host.config().site.name));
    ui::key_value(&ctx, "State", &host.layout().root().display().to_string());

    ui::section(&ctx, "Registration");
    match registration {
        None => ui::step_warn_hint(&ctx, "Not registered", "Run: shellcache install"),
        Some(reg) => {
            ui::key_value(&ctx, "Origin", &reg.origin);
            ui::key_value(&ctx, "Scope", &reg.scope);
            ui::key_value(&ctx, "Script", &reg.script_path);
            ui::key_value_status(
                &ctx,
                "Active",
                &describe(reg.active.as_ref()),
                reg.active_version().is_some(),
            );
            ui::key_value(&ctx, "Waiting", &describe(reg.waiting.as_ref()));
        }
    }

    ui::section(
        &ctx,
        &format!("Cache partitions ({})", host.storage().backend_name()),
    );
    if partitions.is_empty() {
        ui::remark(&ctx, "No cache partitions");
    } else {
        print_partitions(partitions);
    }

    if !events.is_empty() {
        ui::section(&ctx, "Recent events");
        for entry in events {
            let version = entry
                .version
                .as_ref()
                .map(|v| format!(" v{}", v))
                .unwrap_or_default();
            println!(
                "  {}  {}{}",
                style(entry.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
                entry.event,
                version
            );
        }
    }
}

fn print_partitions(partitions: &[PartitionSummary]) {
    println!(
        "  {:<32} {:>8}  {}",
        style("NAME").bold(),
        style("ENTRIES").bold(),
        style("STATE").bold()
    );
    for partition in partitions {
        let state = match partition.status {
            PartitionStatus::Current => style(partition.status).green(),
            PartitionStatus::Stale => style(partition.status).yellow(),
            PartitionStatus::Foreign => style(partition.status).dim(),
        };
        println!("  {:<32} {:>8}  {}", partition.name, partition.entries, state);
    }
}
