use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod ui;

use commands::{AnalysisArgs, InputArgs};

#[derive(Parser)]
#[command(name = "sociogram")]
#[command(about = "Who talks to whom: interaction graphs from forums, repositories and mailing lists.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $SOCIOGRAM_CONFIG or the platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, consolidate and export the interaction graph
    Build {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Print the run report as JSON to stderr
        #[arg(long)]
        report: bool,

        /// Write the graph here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Project the graph into interaction time series
    Series {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// One global series, or one per actor (global, user)
        #[arg(long, value_parser = commands::parse_focus)]
        focus: Option<sociogram_graph::Focus>,

        /// "combined" for one interaction count, anything else for one column per type
        #[arg(long)]
        structure: Option<String>,

        /// Write the series here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Scan a local repository and print its per-file commit events
    #[cfg(feature = "local-git")]
    Git {
        /// Path to the repository
        #[arg(value_name = "REPO", default_value = ".")]
        repo: PathBuf,

        /// Only scan this many days of history
        #[arg(long)]
        days: Option<i64>,

        /// Write the events here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries graph and series JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Build {
            input,
            analysis,
            report,
            output,
        } => commands::build::run(config, &input, &analysis, report, output.as_deref()),
        Commands::Series {
            input,
            analysis,
            focus,
            structure,
            output,
        } => commands::series::run(
            config,
            &input,
            &analysis,
            focus,
            structure.as_deref(),
            output.as_deref(),
        ),
        #[cfg(feature = "local-git")]
        Commands::Git { repo, days, output } => commands::git::run(&repo, days, output.as_deref()),
    }
}
