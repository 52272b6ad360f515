//! metatag CLI: tag package versions, register packages and publish registry
//! changes.

mod commands;
mod config;

use std::process;

use clap::{Parser, Subcommand};

use config::MetatagConfig;

#[derive(Parser)]
#[command(name = "metatag", version, about = "Version tags and registry metadata, kept in sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a package and all of its version tags
    Register {
        /// Package name
        package: String,
        /// Repository URL (default: the package's configured remote)
        url: Option<String>,
    },
    /// Tag a package version and record it in the registry
    Tag {
        /// Package name
        package: String,
        /// Explicit version (e.g., 1.2.0) or selector (bump, patch, minor, major)
        version: String,
        /// Skip version checks and allow moving existing tags and entries
        #[arg(long)]
        force: bool,
        /// Commit to tag (default: HEAD)
        #[arg(long)]
        commit: Option<String>,
    },
    /// Check registry dependency consistency
    Check {
        /// Restrict installability checks to these packages
        packages: Vec<String>,
    },
    /// Push verified package tags and prepare a registry pull request
    Publish {
        /// Registry branch to publish (default from metatag.toml)
        branch: Option<String>,
        /// Branch name on the fork (default: pull-request/<commit>)
        #[arg(long)]
        pr_branch: Option<String>,
    },
    /// Prepare a pull request from a package against its registered URL
    Submit {
        /// Package name
        package: String,
        /// Commit to submit (default: HEAD)
        commit: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (config, base_dir) = MetatagConfig::load_or_default(&cwd)?;
    let ws = config.workspace(&base_dir);

    match cli.command {
        Commands::Register { package, url } => {
            commands::registry::register(&ws, &package, url.as_deref())
        }

        Commands::Tag {
            package,
            version,
            force,
            commit,
        } => commands::registry::tag(&ws, &package, &version, commit.as_deref(), force),

        Commands::Check { packages } => commands::registry::check(&ws, &packages),

        Commands::Publish { branch, pr_branch } => {
            let branch = branch.unwrap_or_else(|| config.registry.branch.clone());
            commands::publish::publish(&ws, &config, &branch, pr_branch.as_deref())
        }

        Commands::Submit { package, commit } => {
            commands::publish::submit(&ws, &config, &package, commit.as_deref())
        }
    }
}
