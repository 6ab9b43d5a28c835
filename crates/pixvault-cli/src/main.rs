//! pixvault CLI: ingest image batches into the catalog and resolve faces
//! against it.
//!
//! Configuration comes from the environment (and `.env`); see `Config`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pixvault_cli::{
    build_catalog, build_orchestrator, build_verification, encode_image, error_body, init_tracing,
    print_json,
};
use pixvault_core::{AppError, Config};
use pixvault_services::{setup_database, CatalogStore, IngestResponse, VerifyResponse};
use serde_json::json;

#[derive(Parser)]
#[command(name = "pixvault", about = "Image ingestion and face lookup CLI")]
struct Cli {
    /// Use an in-memory catalog instead of Postgres
    #[arg(long, global = true)]
    memory_catalog: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a zip, tar or tar.gz archive of images
    IngestArchive {
        /// Path to the archive
        file: PathBuf,
    },
    /// Ingest the image files at the top level of a folder
    IngestFolder {
        /// Folder to scan
        dir: PathBuf,
    },
    /// Run face verification for one image and resolve matches to URLs
    Verify {
        /// Image file to verify
        #[arg(required_unless_present = "base64")]
        image: Option<PathBuf>,
        /// Base64 image or data URL instead of a file
        #[arg(long, conflicts_with = "image")]
        base64: Option<String>,
    },
    /// Show the catalog entry for an identity key
    Lookup {
        /// Identity key (base file name), e.g. IMG_0001.jpg
        identity_key: String,
    },
    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let body = error_body(&err);
            tracing::debug!(error = %format!("{:#}", err), "Command failed");
            match serde_json::to_string(&body) {
                Ok(out) => eprintln!("{}", out),
                Err(_) => eprintln!("{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;
    init_tracing(&config)?;

    match cli.command {
        Commands::IngestArchive { file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read archive {}", file.display()))?;
            let catalog = build_catalog(&config, cli.memory_catalog).await?;
            let orchestrator = build_orchestrator(&config, catalog).await?;

            let result = orchestrator.ingest_archive(data).await?;
            print_json(&IngestResponse::from(&result))?;
        }
        Commands::IngestFolder { dir } => {
            let catalog = build_catalog(&config, cli.memory_catalog).await?;
            let orchestrator = build_orchestrator(&config, catalog).await?;

            let result = orchestrator.ingest_folder(&dir).await?;
            let response = IngestResponse::from(&result);
            print_json(&response)?;

            let summary = response.summary;
            eprintln!(
                "Total files: {}, skipped (not images): {}, already in catalog: {}, newly uploaded: {}, failed: {}",
                summary.total,
                summary.skipped,
                summary.already_present,
                summary.uploaded,
                summary.failed
            );
        }
        Commands::Verify { image, base64 } => {
            let payload = match (image, base64) {
                (_, Some(encoded)) => encoded,
                (Some(path), None) => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("Failed to read image {}", path.display()))?;
                    encode_image(&bytes)
                }
                (None, None) => {
                    return Err(AppError::InvalidInput(
                        "an image file or --base64 is required".to_string(),
                    )
                    .into())
                }
            };
            let catalog = build_catalog(&config, cli.memory_catalog).await?;
            let adapter = build_verification(&config, catalog)?;

            let urls = adapter.verify_and_resolve(&payload).await?;
            print_json(&VerifyResponse::success(urls))?;
        }
        Commands::Lookup { identity_key } => {
            let catalog = build_catalog(&config, cli.memory_catalog).await?;
            let entry = catalog.get(&identity_key).await?;
            print_json(&json!({
                "identity_key": identity_key,
                "found": entry.is_some(),
                "entry": entry,
            }))?;
        }
        Commands::Migrate => {
            if cli.memory_catalog {
                print_json(&json!({ "message": "In-memory catalog has no migrations" }))?;
                return Ok(());
            }
            let url = config
                .database_url()
                .map_err(|e| AppError::Config(e.to_string()))?;
            setup_database(&config.database, url)
                .await
                .map_err(|e| AppError::StoreUnavailable(format!("{:#}", e)))?;
            print_json(&json!({ "message": "Database migrations applied" }))?;
        }
    }

    Ok(())
}
