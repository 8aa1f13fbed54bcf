//! cogscore CLI: score assessments and report on learner evolution.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "cogscore",
    version,
    about = "Assessment scoring and learner analytics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one submission against a template
    Score {
        /// Template file (.toml or .json)
        #[arg(long)]
        template: PathBuf,

        /// Responses JSON: an object mapping item id to raw answer
        #[arg(long)]
        responses: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate template files
    Validate {
        /// Path to template file or directory
        #[arg(long)]
        template: PathBuf,
    },

    /// Analyze a learner's score history
    Evolution {
        /// History JSON: array of evolution points, oldest first
        #[arg(long)]
        history: PathBuf,

        /// Periods to look back for variation (default from config)
        #[arg(long)]
        periods_back: Option<usize>,

        /// Attendance percentages, comma-separated (e.g. "90,80")
        #[arg(long)]
        attendance: Option<String>,

        /// Length of the summarized period in months
        #[arg(long, default_value = "6")]
        months: u32,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Seed for recommendation wording
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Suggest activities for the weakest domains
    Recommend {
        /// History JSON: array of evolution points, oldest first
        #[arg(long)]
        history: PathBuf,

        /// Number of recommendations (default from config)
        #[arg(long)]
        count: Option<usize>,

        /// Seed for recommendation wording
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example template
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cogscore=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            template,
            responses,
            format,
        } => commands::score::execute(template, responses, format),
        Commands::Validate { template } => commands::validate::execute(template),
        Commands::Evolution {
            history,
            periods_back,
            attendance,
            months,
            format,
            seed,
            config,
        } => commands::evolution::execute(
            history,
            periods_back,
            attendance,
            months,
            format,
            seed,
            config,
        ),
        Commands::Recommend {
            history,
            count,
            seed,
            config,
        } => commands::recommend::execute(history, count, seed, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
