use clap::Subcommand;
use colored::*;
use engage_cli::AppContext;
use engage_core::{FulfillRevisionInput, RevisionRequest, RevisionStatus};

use super::utils::{format_date, new_table, print_warnings, truncate};

#[derive(Subcommand)]
pub enum RevisionsCommands {
    /// Open revision requests for a client, soonest due first
    Open {
        /// Client ID
        client_id: String,
    },
    /// Show a revision request
    Show {
        /// Revision request ID
        id: String,
    },
    /// Move a revision request forward (in-progress, completed)
    Advance {
        /// Revision request ID
        id: String,
        /// Target status
        status: RevisionStatus,
    },
    /// Deliver the revised document and complete the request
    Fulfill {
        /// Revision request ID
        id: String,
        /// Stored file reference of the revised document
        #[arg(short, long)]
        file_url: String,
        /// File size in bytes
        #[arg(short = 's', long, default_value = "0")]
        file_size: i64,
        /// Title to version from (defaults to the current title)
        #[arg(short, long)]
        title: Option<String>,
        /// New document type
        #[arg(short, long)]
        document_type: Option<String>,
    },
}

pub async fn handle_revisions_command(
    ctx: &AppContext,
    command: RevisionsCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        RevisionsCommands::Open { client_id } => list_open(ctx, &client_id).await,
        RevisionsCommands::Show { id } => {
            let revision = ctx.deliveries.get_revision_request(&id).await?;
            print_revision(&revision);
            Ok(())
        }
        RevisionsCommands::Advance { id, status } => {
            let outcome = ctx.deliveries.advance_revision(&id, status).await?;
            println!("{} {} → {}", "✓".green(), outcome.value.id, outcome.value.status);
            print_warnings(&outcome.warnings);
            Ok(())
        }
        RevisionsCommands::Fulfill {
            id,
            file_url,
            file_size,
            title,
            document_type,
        } => {
            let input = FulfillRevisionInput {
                file_url,
                file_size,
                title,
                document_type,
            };
            let outcome = ctx.deliveries.fulfill_revision(&id, input).await?;
            println!(
                "{} {} (version {})",
                "✓ Redelivered".green(),
                outcome.value.title.bold(),
                outcome.value.current_version
            );
            print_warnings(&outcome.warnings);
            Ok(())
        }
    }
}

async fn list_open(ctx: &AppContext, client_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let revisions = ctx.deliveries.list_open_revisions_for_client(client_id).await?;

    if revisions.is_empty() {
        println!("{}", "No open revision requests".green());
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(vec!["ID", "Delivery", "Status", "Due", "Description"]);
    for revision in &revisions {
        table.add_row(vec![
            revision.id.clone(),
            revision.delivery_id.clone(),
            revision.status.to_string(),
            format_date(&revision.due_date),
            truncate(&revision.description, 40),
        ]);
    }

    println!("{}", table);
    Ok(())
}

fn print_revision(revision: &RevisionRequest) {
    println!("{}", format!("Revision - {}", revision.id).blue().bold());
    println!();
    println!("  {:<14} {}", "Delivery:".bold(), revision.delivery_id);
    println!("  {:<14} {}", "Status:".bold(), revision.status);
    println!("  {:<14} {}", "Due:".bold(), format_date(&revision.due_date));
    if !revision.reasons.is_empty() {
        let reasons: Vec<&str> = revision.reasons.iter().map(|r| r.label()).collect();
        println!("  {:<14} {}", "Reasons:".bold(), reasons.join(", "));
    }
    if let Some(custom) = &revision.custom_reason {
        println!("  {:<14} {}", "Other:".bold(), custom);
    }
    println!("  {:<14} {}", "Description:".bold(), revision.description);
    for attachment in &revision.attachments {
        println!("  {:<14} {}", "Attachment:".bold(), attachment);
    }
    if let Some(at) = revision.completed_at {
        println!("  {:<14} {}", "Completed:".bold(), format_date(&at));
    }
}
