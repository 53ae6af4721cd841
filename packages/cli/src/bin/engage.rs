use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use cli::clients::ClientsCommands;
use cli::deliveries::DeliveriesCommands;
use cli::progress::ProgressCommands;
use cli::revisions::RevisionsCommands;
use cli::teardown::TeardownCommands;
use engage_cli::{init_tracing, AppContext};
use engage_config::EngageConfig;

#[derive(Parser)]
#[command(name = "engage")]
#[command(about = "Engage - client deliverable portal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Migrate,
    /// Print the effective configuration (secrets redacted)
    Config,
    /// Manage clients
    #[command(subcommand)]
    Clients(ClientsCommands),
    /// Submit and review deliveries
    #[command(subcommand)]
    Deliveries(DeliveriesCommands),
    /// Work revision requests
    #[command(subcommand)]
    Revisions(RevisionsCommands),
    /// Inspect and record onboarding progress
    #[command(subcommand)]
    Progress(ProgressCommands),
    /// Delete clients and their identities
    #[command(subcommand)]
    Teardown(TeardownCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match handle_command(cli.command).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngageConfig::from_env()?;

    if let Commands::Config = command {
        println!("{:#?}", config.redacted());
        return Ok(());
    }

    let ctx = AppContext::open(config).await?;

    match command {
        Commands::Migrate => {
            println!(
                "{} {}",
                "✓ Database ready at".green(),
                ctx.config.storage.database_path.display()
            );
            Ok(())
        }
        Commands::Config => Ok(()),
        Commands::Clients(cmd) => cli::clients::handle_clients_command(&ctx, cmd).await,
        Commands::Deliveries(cmd) => cli::deliveries::handle_deliveries_command(&ctx, cmd).await,
        Commands::Revisions(cmd) => cli::revisions::handle_revisions_command(&ctx, cmd).await,
        Commands::Progress(cmd) => cli::progress::handle_progress_command(&ctx, cmd).await,
        Commands::Teardown(cmd) => cli::teardown::handle_teardown_command(&ctx, cmd).await,
    }
}
