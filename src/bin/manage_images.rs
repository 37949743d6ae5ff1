use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use listing_images::audit;
use listing_images::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "manage-images",
    version,
    about = "Audit and repair the listing image directory"
)]
struct Cli {
    /// Listing image directory (defaults to <UPLOADS_DIR>/listings)
    #[arg(long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan all listing images and report naming consistency
    Analyze,
    /// Renumber one listing's images into a contiguous 1..N sequence
    FixSequence {
        user_id_hex: String,
        listing_code: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let dir = cli
        .dir
        .unwrap_or_else(|| AppConfig::from_env().listings_dir());

    match cli.command {
        Command::Analyze => {
            let report = audit::analyze(&dir)?;
            print!("{report}");
        }
        Command::FixSequence {
            user_id_hex,
            listing_code,
        } => {
            println!("Fixing sequence numbers for User: {user_id_hex}, Listing: {listing_code}");
            let outcome = audit::repair(&dir, &user_id_hex, &listing_code)?;
            if outcome.renames.is_empty() {
                println!("No files to fix");
            } else {
                for (old, new) in &outcome.renames {
                    println!("Renumbered: {old} -> {new}");
                }
                println!(
                    "Sequence numbers fixed successfully ({} of {} renamed)",
                    outcome.changed,
                    outcome.renames.len()
                );
            }
        }
    }

    Ok(())
}
