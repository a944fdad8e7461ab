//! Backend CLI - manages saved analyses
//!
//! Usage:
//!   backend signup --email me@example.com --password ...
//!   backend list --network instagram
//!   backend fetch --network instagram --id <uuid> --out analysis.json
//!   backend save --name "January" --file instagram-analytics-2024-01-31.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use backend::{open_store, BackendClient, Config};
use ingest::{ExportDocument, Network};

#[derive(Parser, Debug)]
#[command(name = "backend", about = "Manages saved analytics analyses")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account on the hosted backend
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List saved analyses of one platform, newest first
    List {
        #[arg(long)]
        network: Network,
    },
    /// Fetch one saved analysis
    Fetch {
        #[arg(long)]
        network: Network,
        #[arg(long)]
        id: Uuid,
        /// Write it as an export document instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Save an export document as a named analysis
    Save {
        #[arg(long)]
        name: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    println!("=== Analytics Backend ===");

    if let Command::Signup { email, password } = &args.command {
        let client = BackendClient::from_config(&config)?;
        match client.sign_up(email, password).await.context("Sign-up failed")? {
            Some(session) => println!("Signed up and signed in as {}", session.user.id),
            None => println!("Sign-up received; confirm the email before signing in"),
        }
        return Ok(());
    }

    let store = open_store(&config)
        .await
        .context("Failed to open analysis store")?
        .context("No store configured: set DB_URL or BACKEND_URL and BACKEND_ANON_KEY")?;

    match args.command {
        Command::Signup { .. } => {}
        Command::List { network } => {
            let analyses = store.list_analyses(network).await?;
            println!("{} saved {} analyses", analyses.len(), network);
            println!("{:-<60}", "");
            for analysis in &analyses {
                println!(
                    "  {} | {} | {}",
                    analysis.id,
                    analysis.created_at.format("%Y-%m-%d %H:%M"),
                    analysis.name
                );
            }
            println!("{:-<60}", "");
        }
        Command::Fetch { network, id, out } => {
            let aggregate = store.fetch_analysis(network, id).await?;
            let document = ExportDocument::new(aggregate);
            let json = document.to_json_pretty()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Save { name, file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let document = ExportDocument::from_json(&json).context("Not an export document")?;
            let saved = store
                .create_analysis(document.network, &name, &document.data)
                .await?;
            println!("Saved {} analysis \"{}\" as {}", document.network, saved.name, saved.id);
        }
    }

    println!("=== Done ===");
    Ok(())
}
