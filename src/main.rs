//! Drift CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drift_core::model::AnnotationStyle;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "drift")]
#[command(about = "GitHub repository Python change analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// GitHub API token (defaults to the GITHUB_TOKEN environment variable)
    #[arg(long)]
    token: Option<String>,

    /// Output directory for reports and file versions
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Annotation style: comment, inline, or markup
    #[arg(short, long)]
    style: Option<AnnotationStyle>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze repositories between two refs
    Compare {
        /// Repository names in owner/repo form
        #[arg(required = true)]
        repos: Vec<String>,

        /// Base reference for the comparison
        #[arg(long, default_value = "HEAD~1")]
        base: String,

        /// Head reference for the comparison
        #[arg(long, default_value = "HEAD")]
        head: String,

        /// Do not save individual file versions
        #[arg(long)]
        no_save_files: bool,

        /// Do not write per-definition diff files
        #[arg(long)]
        no_diffs: bool,
    },
    /// Analyze the recent history of one repository
    History {
        /// Repository name in owner/repo form
        repo: String,

        /// Number of days back to analyze
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "drift={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Drift v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    let style = match cli.style {
        Some(style) => style,
        None => match &config.style {
            Some(name) => name.parse::<AnnotationStyle>()?,
            None => AnnotationStyle::Comment,
        },
    };
    let output_dir = cli
        .output_dir
        .or(config.output_dir)
        .unwrap_or_else(|| PathBuf::from("drift_output"));

    match cli.command {
        Commands::Compare {
            repos,
            base,
            head,
            no_save_files,
            no_diffs,
        } => {
            let opts = commands::RunOptions {
                output_dir,
                style,
                token: cli.token,
                request_budget: config.max_requests_per_hour,
                save_files: !no_save_files,
                save_diffs: !no_diffs,
            };
            commands::compare(repos, base, head, opts).await
        }
        Commands::History { repo, days } => {
            let opts = commands::RunOptions {
                output_dir,
                style,
                token: cli.token,
                request_budget: config.max_requests_per_hour,
                save_files: false,
                save_diffs: false,
            };
            commands::history(repo, days, opts).await
        }
        Commands::Version => {
            println!("Drift v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
