use clap::Subcommand;
use colored::*;
use engage_cli::AppContext;
use engage_core::{Delivery, DeliveryCreateInput, DeliveryStatus, RevisionReason, RevisionRequestInput};

use super::utils::{format_date, new_table, print_warnings, truncate};

#[derive(Subcommand)]
pub enum DeliveriesCommands {
    /// List a client's deliveries
    List {
        /// Client ID
        client_id: String,
    },
    /// Submit a finished document for client review
    Submit {
        /// Client ID
        client_id: String,
        /// Document title
        #[arg(short, long)]
        title: String,
        /// Document type (resume, cover_letter, ...)
        #[arg(short, long)]
        document_type: String,
        /// Stored file reference
        #[arg(short, long)]
        file_url: String,
        /// File size in bytes
        #[arg(short = 's', long, default_value = "0")]
        file_size: i64,
    },
    /// Approve a delivered document
    Approve {
        /// Delivery ID
        id: String,
    },
    /// Request changes to a delivered document
    RequestRevision {
        /// Delivery ID
        id: String,
        /// What needs to change
        #[arg(short, long)]
        description: String,
        /// Preset reason, repeatable (e.g. "Missing information")
        #[arg(short, long = "reason")]
        reasons: Vec<RevisionReason>,
        /// Free-form reason
        #[arg(long)]
        custom_reason: Option<String>,
        /// Attachment file reference, repeatable
        #[arg(short, long = "attachment")]
        attachments: Vec<String>,
    },
    /// Show the version history of a delivery
    Versions {
        /// Delivery ID
        id: String,
    },
}

pub async fn handle_deliveries_command(
    ctx: &AppContext,
    command: DeliveriesCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        DeliveriesCommands::List { client_id } => list_deliveries(ctx, &client_id).await,
        DeliveriesCommands::Submit {
            client_id,
            title,
            document_type,
            file_url,
            file_size,
        } => {
            let input = DeliveryCreateInput {
                client_id,
                title,
                document_type,
                file_url,
                file_size,
            };
            let outcome = ctx.deliveries.submit_for_review(input).await?;
            println!(
                "{} {} ({})",
                "✓ Delivered".green(),
                outcome.value.title.bold(),
                outcome.value.id
            );
            print_warnings(&outcome.warnings);
            Ok(())
        }
        DeliveriesCommands::Approve { id } => {
            let outcome = ctx.deliveries.approve(&id).await?;
            println!("{} {}", "✓ Approved".green(), outcome.value.title.bold());
            print_warnings(&outcome.warnings);
            Ok(())
        }
        DeliveriesCommands::RequestRevision {
            id,
            description,
            reasons,
            custom_reason,
            attachments,
        } => {
            let input = RevisionRequestInput {
                reasons,
                custom_reason,
                description,
                attachments,
            };
            let outcome = ctx.deliveries.request_revision(&id, input).await?;
            println!(
                "{} {} due {}",
                "✓ Revision requested".green(),
                outcome.value.id.bold(),
                format_date(&outcome.value.due_date)
            );
            print_warnings(&outcome.warnings);
            Ok(())
        }
        DeliveriesCommands::Versions { id } => list_versions(ctx, &id).await,
    }
}

async fn list_deliveries(
    ctx: &AppContext,
    client_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let deliveries = ctx.deliveries.list_client_deliveries(client_id).await?;

    if deliveries.is_empty() {
        println!("{}", "No deliveries yet".yellow());
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(vec!["ID", "Title", "Type", "Status", "Version", "Delivered"]);

    for delivery in &deliveries {
        table.add_row(vec![
            delivery.id.clone(),
            truncate(&delivery.title, 40),
            delivery.document_type.clone(),
            status_label(delivery),
            delivery.current_version.to_string(),
            format_date(&delivery.delivered_at),
        ]);
    }

    println!("{}", table);
    Ok(())
}

async fn list_versions(ctx: &AppContext, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let delivery = ctx.deliveries.get_delivery(id).await?;
    let versions = ctx.deliveries.list_delivery_versions(id).await?;

    println!("{}", format!("Versions - {}", delivery.title).blue().bold());

    let mut table = new_table();
    table.set_header(vec!["#", "Title", "File", "Revision", "Delivered"]);
    for version in &versions {
        table.add_row(vec![
            version.version_number.to_string(),
            truncate(&version.title, 40),
            truncate(&version.file_url, 30),
            version.revision_request_id.clone().unwrap_or_default(),
            format_date(&version.delivered_at),
        ]);
    }

    println!("{}", table);
    Ok(())
}

fn status_label(delivery: &Delivery) -> String {
    match delivery.status {
        DeliveryStatus::Delivered => "delivered".to_string(),
        DeliveryStatus::RevisionRequested => "revision requested".to_string(),
        DeliveryStatus::Approved => match delivery.approved_at {
            Some(at) => format!("approved {}", format_date(&at)),
            None => "approved".to_string(),
        },
    }
}
