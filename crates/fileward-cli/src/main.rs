//! Fileward CLI: maintenance of one owner's stored files.
//!
//! Configuration comes from FILEWARD_* environment variables (a `.env` file is
//! honored). Results are printed as JSON.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fileward::{AttachmentManager, Lifecycle, Owner, RequestFiles, Settings, UploadedFile};
use fileward_cli::{init_tracing, owner_record};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fileward", about = "Manage files attached to owner records")]
struct Cli {
    #[command(flatten)]
    owner: OwnerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OwnerArgs {
    /// Owner type, e.g. post
    #[arg(long)]
    owner_type: String,
    /// Owner identifier
    #[arg(long)]
    owner_id: String,
    /// Current attribute value of the owner (its first file)
    #[arg(long)]
    primary: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored file names
    List {
        /// Variant name; primary files when omitted
        #[arg(long)]
        variant: Option<String>,
    },
    /// Map each stored file to its public link
    Links {
        /// Variant name; primary files when omitted
        #[arg(long)]
        variant: Option<String>,
    },
    /// Highest sequence number in use
    Count,
    /// Store local files as new uploads, generating every variant
    Import {
        /// Files to import; they are copied, not moved
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Rename a file in the primary and every variant directory
    Rename {
        name: String,
        new_name: String,
    },
    /// Delete a file from the primary and every variant directory
    Delete {
        name: String,
    },
    /// Remove all of the owner's files
    Purge,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = Settings::from_env()
        .and_then(Settings::into_config)
        .context("Invalid FILEWARD_* configuration")?;
    let field = config.file_field().to_string();
    let manager = AttachmentManager::new(config).context("Failed to create attachment manager")?;

    let mut owner = owner_record(
        &cli.owner.owner_type,
        &cli.owner.owner_id,
        &field,
        cli.owner.primary.as_deref(),
    );

    match cli.command {
        Commands::List { variant } => {
            let names = manager.file_list(&owner, variant.as_deref()).await?;
            print_json(&names)?;
        }
        Commands::Links { variant } => {
            let links = manager.link_list(&owner, variant.as_deref()).await?;
            print_json(&links)?;
        }
        Commands::Count => {
            let count = manager.file_count(&owner).await?;
            print_json(&serde_json::json!({ "count": count }))?;
        }
        Commands::Import { files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let upload = UploadedFile::copy_of(path)
                    .await
                    .with_context(|| format!("Cannot read {}", path.display()))?;
                uploads.push(upload);
            }
            let request = RequestFiles::new().multiple(&field, uploads);

            let mut lifecycle = Lifecycle::new();
            lifecycle.register(manager.clone());
            lifecycle.save(&mut owner, &request).await?;

            tracing::info!(count = files.len(), "Import finished");
            print_json(&serde_json::json!({
                "primary": owner.text(&field),
                "files": manager.file_list(&owner, None).await?,
            }))?;
        }
        Commands::Rename { name, new_name } => {
            manager.rename_file(&mut owner, &name, &new_name).await?;
            print_json(&serde_json::json!({
                "success": true,
                "primary": owner.text(&field),
            }))?;
        }
        Commands::Delete { name } => {
            manager.delete_file(&mut owner, &name).await?;
            print_json(&serde_json::json!({
                "success": true,
                "primary": owner.text(&field),
            }))?;
        }
        Commands::Purge => {
            let mut lifecycle = Lifecycle::new();
            lifecycle.register(manager.clone());
            lifecycle.delete(&mut owner).await?;
            print_json(&serde_json::json!({
                "success": true,
                "message": format!("Files of {} {} removed", owner.owner_type(), owner.owner_id()),
            }))?;
        }
    }

    Ok(())
}
