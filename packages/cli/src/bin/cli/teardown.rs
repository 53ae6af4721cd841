use clap::Subcommand;
use colored::*;
use engage_cli::AppContext;
use engage_teardown::{IdentityCleanup, TeardownReport};

use super::utils::{new_table, print_warnings};

#[derive(Subcommand)]
pub enum TeardownCommands {
    /// Delete clients with all their data, then their identities
    Run {
        /// Client IDs to delete
        #[arg(required = true)]
        ids: Vec<String>,
        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },
    /// Retry identity deletions that failed after their client was removed
    RetryOrphans,
}

pub async fn handle_teardown_command(
    ctx: &AppContext,
    command: TeardownCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        TeardownCommands::Run { ids, yes } => {
            if !yes {
                return Err(format!(
                    "refusing to delete {} client(s) without --yes",
                    ids.len()
                )
                .into());
            }
            if ids.len() == 1 {
                teardown_one(ctx, &ids[0]).await
            } else {
                teardown_many(ctx, &ids).await
            }
        }
        TeardownCommands::RetryOrphans => {
            let report = ctx.teardown.retry_orphaned_identities().await?;
            println!(
                "Resolved {} orphaned identit(ies), {} still pending",
                report.resolved.len().to_string().green(),
                report.still_orphaned.len().to_string().yellow()
            );
            for id in &report.still_orphaned {
                println!("  {} {}", "·".dimmed(), id);
            }
            Ok(())
        }
    }
}

async fn teardown_one(ctx: &AppContext, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = ctx.teardown.teardown_client(id).await?;
    print_report(&outcome.value);
    print_warnings(&outcome.warnings);
    Ok(())
}

async fn teardown_many(ctx: &AppContext, ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let report = ctx.teardown.teardown_clients(ids).await;

    let mut table = new_table();
    table.set_header(vec!["Client", "Result", "Identity", "Detail"]);
    for outcome in &report.outcomes {
        let (result, identity) = match &outcome.report {
            Some(r) => ("deleted".to_string(), identity_label(r.identity).to_string()),
            None => ("failed".to_string(), String::new()),
        };
        let detail = match &outcome.error {
            Some(err) => err.clone(),
            None => outcome
                .warnings
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        };
        table.add_row(vec![outcome.client_id.clone(), result, identity, detail]);
    }

    println!("{}", table);
    println!(
        "Deleted {} client(s), {} failed",
        report.succeeded.to_string().green(),
        report.failed.to_string().red()
    );

    if report.failed > 0 {
        return Err(format!("{} teardown(s) failed", report.failed).into());
    }
    Ok(())
}

fn print_report(report: &TeardownReport) {
    let c = &report.cascade;
    println!("{} {}", "✓ Deleted client".green(), report.client_id.bold());
    println!(
        "  deliveries={} versions={} revisions={} progress={} history={} messages={} files={}",
        c.deliveries,
        c.delivery_versions,
        c.revision_requests,
        c.progress_records,
        c.history_entries,
        c.messages,
        c.files
    );
    println!("  identity: {}", identity_label(report.identity));
}

fn identity_label(cleanup: IdentityCleanup) -> &'static str {
    match cleanup {
        IdentityCleanup::NoIdentity => "none",
        IdentityCleanup::Deleted => "deleted",
        IdentityCleanup::AlreadyAbsent => "already absent",
        IdentityCleanup::Orphaned => "queued for retry",
    }
}
