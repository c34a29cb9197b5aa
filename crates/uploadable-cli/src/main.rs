//! Uploadable CLI: validate a temporary upload against the configured
//! policies, or inspect the effective policy set.
//!
//! Set UPLOADABLE_WEB_ROOT (and optionally UPLOADABLE_POLICY_FILE,
//! UPLOADABLE_UPLOAD_TMP_DIR, UPLOADABLE_BATCH_MODE, UPLOADABLE_CONTENT_SNIFFING).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use uploadable_cli::{exit_status, init_tracing};
use uploadable_core::{FieldValue, UploadCandidate, UploaderConfig};
use uploadable_processing::UploadValidator;

#[derive(Parser)]
#[command(name = "uploadable", about = "Validate and store uploaded files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a temporary upload and move it into its destination
    Validate {
        /// Path of the temporary upload file
        temp_file: PathBuf,
        /// Filename the client supplied
        #[arg(long)]
        name: String,
        /// MIME type the client declared
        #[arg(long)]
        mime: String,
        /// Form field the file was submitted under
        #[arg(long, default_value = "file")]
        field: String,
    },
    /// Print the effective policy set
    Policies,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = UploaderConfig::from_env()
        .context("Failed to load configuration. Set UPLOADABLE_WEB_ROOT")?;

    match cli.command {
        Commands::Validate {
            temp_file,
            name,
            mime,
            field,
        } => {
            let validator = UploadValidator::from_config(&config);
            let policy = validator
                .policies()
                .policy_for(&field)
                .with_context(|| format!("No upload policy applies to field '{}'", field))?
                .clone();

            let candidate = UploadCandidate::new(&temp_file, mime, name);
            let value = FieldValue::Upload(candidate.clone());
            if !validator.looks_like_upload_candidate(&value).await {
                anyhow::bail!(
                    "{} is not an upload in {}",
                    temp_file.display(),
                    config.upload_tmp_dir.display()
                );
            }

            let result = validator.validate(&candidate, &policy).await;
            print_json(&result)?;
            Ok(exit_status(&result))
        }
        Commands::Policies => {
            print_json(&config.policies)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
