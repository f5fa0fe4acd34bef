use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idscan_core::ExportFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "idscan")]
#[command(version, about = "Read Aadhaar and Voter ID cards into structured records", long_about = None)]
struct Cli {
    /// Scan configuration (TOML). Defaults to idscan.toml in the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Result cache database. Defaults to idscan.db in the platform data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a card image and print the extracted fields
    Scan {
        /// Photo or scan of the card (JPEG, PNG, WEBP, …)
        image: PathBuf,

        /// Write the record into this directory
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Export format
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Do not save the result as the last scan
        #[arg(long)]
        no_cache: bool,

        /// Tesseract data directory (tessdata)
        #[arg(long)]
        tessdata: Option<String>,

        /// Use scripted OCR text instead of an engine (demos and dry runs)
        #[arg(long)]
        mock_text: Option<String>,
    },

    /// Show the last cached scan, if it has not expired
    Last {
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the last cached scan
    ClearCache,

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let dirs = directories::ProjectDirs::from("com", "idscan", "IdScan")
        .context("Failed to resolve application directories")?;
    let config = commands::load_config(cli.config.as_deref(), dirs.config_dir())?;
    let db_path = cli.db.unwrap_or_else(|| dirs.data_dir().join("idscan.db"));

    match cli.command {
        Commands::Scan { image, export, format, no_cache, tessdata, mock_text } => {
            let engine = commands::Engine::select(mock_text, tessdata)?;
            let cache = if no_cache {
                None
            } else {
                commands::open_cache(&db_path, &config).await
            };
            let options = commands::ScanOptions { image, export, format };
            commands::scan(engine, config, cache.as_ref(), options).await
        }
        Commands::Last { json } => {
            let cache = commands::open_cache(&db_path, &config).await;
            commands::show_last(cache.as_ref(), json).await
        }
        Commands::ClearCache => {
            if let Some(cache) = commands::open_cache(&db_path, &config).await {
                cache.clear().await;
            }
            println!("Cache cleared.");
            Ok(())
        }
        Commands::Config => {
            print!("{}", config.to_toml_string().context("Failed to encode configuration")?);
            Ok(())
        }
    }
}
