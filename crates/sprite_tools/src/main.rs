//! Sprite Pool - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sprite_core::config::PoolConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sprite-tools")]
#[command(about = "Development tools for the sprite pool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a RON pool config
    ValidateConfig {
        /// Path to the config file
        path: PathBuf,
    },
    /// Audit a saved pool, optionally repairing it
    Check {
        /// Path to the save blob
        save: PathBuf,
        /// Run the repair passes
        #[arg(long)]
        fix: bool,
        /// Where to write the (repaired) pool
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the built-in scenarios against a fresh pool
    Scenario {
        /// Pool config to use instead of the defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn run(command: Commands) -> sprite_tools::Result<bool> {
    match command {
        Commands::ValidateConfig { path } => {
            tracing::info!("Validating config: {}", path.display());
            let config = sprite_tools::validate::validate_config_file(&path)?;
            println!("{}", sprite_tools::validate::to_canonical_ron(&config)?);
            Ok(true)
        }
        Commands::Check { save, fix, out } => {
            tracing::info!("Checking save: {}", save.display());
            let report = sprite_tools::check::check_file(&save, fix, out.as_deref())?;
            for issue in &report.before.issues {
                println!("found: {issue}");
            }
            if fix {
                for issue in &report.after.issues {
                    println!("remaining: {issue}");
                }
                println!(
                    "repaired {} list cycle(s), {} bucket cycle(s), relinked {} orphan(s){}",
                    report.list_cycles_repaired.len(),
                    report.bucket_cycles_repaired.len(),
                    report.orphans_relinked,
                    if report.spatial_rebuilt { ", rebuilt grid" } else { "" },
                );
            }
            Ok(report.is_clean())
        }
        Commands::Scenario { config, json } => {
            let config = match config {
                Some(path) => sprite_tools::validate::validate_config_file(&path)?,
                None => PoolConfig::default(),
            };
            let reports = sprite_tools::scenario::run_all(config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    print!("{report}");
                }
            }
            Ok(reports.iter().all(|r| r.passed))
        }
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => tracing::info!("Done"),
        Ok(false) => {
            tracing::error!("Pool is inconsistent");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Failed: {e}");
            std::process::exit(1);
        }
    }
}
