//! Changeguard - Change Risk Assessment Service
//!
//! Forwards structured IT change requests to an LLM reasoning agent with
//! lookup tools and returns structured risk assessments.

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub use changeguard::*;

/// Changeguard - AI Change Risk Analyst
#[derive(Parser)]
#[command(name = "changeguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Assess a single change request from a JSON file and print the result
    Assess {
        /// Path to a ChangeRequest JSON document
        file: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let config = config::ServiceConfig::from_env()?;
            info!("🛡️ Starting change risk assessment service...");
            web::start_server(config, &host, port).await?;
        }
        Commands::Assess { file } => {
            let config = config::ServiceConfig::from_env()?;
            let raw = std::fs::read_to_string(&file)?;
            let change: ChangeRequest = serde_json::from_str(&raw)?;

            let state = web::build_state(&config)?;
            let query = web::routes::render_change_query(&change);
            let answer = tokio::time::timeout(
                state.request_timeout,
                state.orchestrator.run(&query),
            )
            .await
            .map_err(|_| anyhow::anyhow!("assessment timed out"))??;

            let assessment = assessment::build_assessment(&change, &answer)?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
    }

    Ok(())
}
