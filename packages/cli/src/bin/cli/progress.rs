use clap::Subcommand;
use colored::*;
use engage_cli::AppContext;
use engage_core::Milestone;
use engage_progress::{MergedProgress, ProgressStep};

#[derive(Subcommand)]
pub enum ProgressCommands {
    /// Show reconciled progress for a client
    Show {
        /// Client ID
        client_id: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a step as completed in the local cache only
    Record {
        /// Client ID
        client_id: String,
        /// Step name or number (1-5)
        step: ProgressStep,
    },
    /// Confirm an onboarding milestone on the server
    Confirm {
        /// Client ID
        client_id: String,
        /// Milestone (intake, resume, session)
        milestone: Milestone,
    },
}

pub async fn handle_progress_command(
    ctx: &AppContext,
    command: ProgressCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ProgressCommands::Show { client_id, json } => {
            let progress = ctx.progress.get_merged_progress(&client_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                print_progress(&progress);
            }
            Ok(())
        }
        ProgressCommands::Record { client_id, step } => {
            let progress = ctx
                .progress
                .record_local_step_completion(&client_id, step)
                .await?;
            print_progress(&progress);
            Ok(())
        }
        ProgressCommands::Confirm {
            client_id,
            milestone,
        } => {
            let progress = ctx.progress.confirm_milestone(&client_id, milestone).await?;
            print_progress(&progress);
            Ok(())
        }
    }
}

fn print_progress(progress: &MergedProgress) {
    for (step, done) in ProgressStep::ALL.iter().zip(progress.steps) {
        let marker = if done {
            "✓".green()
        } else if step.number() == progress.current_step {
            "→".cyan()
        } else {
            "·".dimmed()
        };
        println!("  {} {}. {}", marker, step.number(), step.as_str());
    }
}
