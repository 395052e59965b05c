//! Robo Shop CLI - Database migrations, demo data and deployment checks.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! robo-cli migrate
//!
//! # Create the demo seller, buyer and products
//! robo-cli seed
//!
//! # Check that a checkout is ready to deploy
//! robo-cli check-deployment --root .
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with demo accounts and products
//! - `check-deployment` - Report deployment readiness

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "robo-cli")]
#[command(author, version, about = "Robo Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Create demo accounts and products (safe to run twice)
    Seed,
    /// Check files and environment before deploying
    CheckDeployment {
        /// Project root to inspect
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed => commands::seed::demo_data().await?,
        Commands::CheckDeployment { root } => {
            let report = commands::check_deployment::run(&root);
            report.print();
            if report.has_issues() {
                return Err(format!("{} deployment issue(s) found", report.issues().count()).into());
            }
        }
    }
    Ok(())
}
