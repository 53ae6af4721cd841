use clap::Subcommand;
use colored::*;
use engage_cli::AppContext;
use engage_core::{Client, ClientCreateInput, ClientStatus};

use super::utils::{format_date, new_table, truncate};

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// List all clients
    List,
    /// Show client details and activity history
    Show {
        /// Client ID to show
        id: String,
    },
    /// Add a new client
    Add {
        /// Client display name
        #[arg(short, long)]
        name: String,
        /// Client email address
        #[arg(short, long)]
        email: String,
        /// Service tier identifier
        #[arg(long)]
        tier: Option<String>,
        /// Rush service (shorter revision turnaround)
        #[arg(long)]
        rush: bool,
        /// Identity provider user ID
        #[arg(long)]
        auth_user_id: Option<String>,
    },
    /// Set the status of one or more clients
    Status {
        /// New status (onboarding, in-production, in-review, completed, on-hold)
        status: ClientStatus,
        /// Client IDs to update
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

pub async fn handle_clients_command(
    ctx: &AppContext,
    command: ClientsCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ClientsCommands::List => list_clients(ctx).await,
        ClientsCommands::Show { id } => show_client(ctx, &id).await,
        ClientsCommands::Add {
            name,
            email,
            tier,
            rush,
            auth_user_id,
        } => {
            let input = ClientCreateInput {
                display_name: name,
                email,
                service_tier_id: tier,
                is_rush: rush,
                auth_user_id,
                ..Default::default()
            };
            add_client(ctx, input).await
        }
        ClientsCommands::Status { status, ids } => update_status(ctx, status, &ids).await,
    }
}

async fn list_clients(ctx: &AppContext) -> Result<(), Box<dyn std::error::Error>> {
    let clients = ctx.clients.list_clients().await?;

    if clients.is_empty() {
        println!("{}", "No clients found".yellow());
        println!("{}", "Use 'engage clients add' to create your first client".dimmed());
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(vec!["ID", "Name", "Email", "Status", "Rush", "Created"]);

    for client in &clients {
        table.add_row(vec![
            client.id.clone(),
            truncate(&client.display_name, 25),
            truncate(&client.email, 30),
            client.status.to_string(),
            if client.is_rush { "yes" } else { "" }.to_string(),
            format_date(&client.created_at),
        ]);
    }

    println!("{}", table);
    println!("Total: {} clients", clients.len().to_string().cyan());

    Ok(())
}

async fn show_client(ctx: &AppContext, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = ctx.clients.get_client(id).await?;
    print_client_details(&client);

    let history = ctx.clients.history(id).await?;
    if !history.is_empty() {
        println!();
        println!("{}", "History".bold());
        for entry in history {
            println!(
                "  {} {} {}",
                entry.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                entry.event_type.cyan(),
                entry.detail.unwrap_or_default()
            );
        }
    }

    Ok(())
}

async fn add_client(
    ctx: &AppContext,
    input: ClientCreateInput,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = ctx.clients.create_client(input).await?;
    println!("{} {}", "✓ Created client".green(), client.id.bold());
    Ok(())
}

async fn update_status(
    ctx: &AppContext,
    status: ClientStatus,
    ids: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let report = ctx.clients.bulk_update_status(ids, status).await;

    for id in &report.updated {
        println!("{} {} → {}", "✓".green(), id, status);
    }
    for failure in &report.failed {
        println!("{} {}: {}", "✗".red(), failure.client_id, failure.error);
    }

    if !report.failed.is_empty() {
        return Err(format!("{} of {} updates failed", report.failed.len(), ids.len()).into());
    }
    Ok(())
}

fn print_client_details(client: &Client) {
    println!("{}", format!("Client - {}", client.display_name).blue().bold());
    println!();
    println!("  {:<18} {}", "ID:".bold(), client.id);
    println!("  {:<18} {}", "Email:".bold(), client.email);
    println!("  {:<18} {}", "Status:".bold(), client.status);
    println!("  {:<18} {:?}", "Payment:".bold(), client.payment_status);
    if let Some(tier) = &client.service_tier_id {
        println!("  {:<18} {}", "Tier:".bold(), tier);
    }
    println!("  {:<18} {}", "Rush:".bold(), client.is_rush);
    if let Some(date) = client.estimated_delivery {
        println!("  {:<18} {}", "Est. delivery:".bold(), date);
    }
    println!(
        "  {:<18} intake={} resume={} session={}",
        "Milestones:".bold(),
        client.intake_submitted,
        client.resume_uploaded,
        client.session_booked
    );
    if let Some(auth) = &client.auth_user_id {
        println!("  {:<18} {}", "Identity:".bold(), auth);
    }
    println!("  {:<18} {}", "Created:".bold(), format_date(&client.created_at));
}
