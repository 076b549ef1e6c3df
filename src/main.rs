use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use lurebench::cli;
use lurebench::eval::EvalOptions;

#[derive(Parser)]
#[command(
    name = "lurebench",
    about = "Lurebench — phishing corpus builder and classifier robustness harness",
    version,
    after_help = "Run 'lurebench <command> --help' for details on each command."
)]
struct Cli {
    /// Root directory for stored artifacts, the corpus file, and the model
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate URL feeds, validate liveness, and write the labeled corpus
    Build {
        /// Maximum accepted phishing pages
        #[arg(long, default_value = "2500")]
        phish_quota: usize,
        /// Maximum accepted legitimate pages
        #[arg(long, default_value = "1500")]
        legit_quota: usize,
        /// Maximum in-flight renders
        #[arg(long, default_value = "15")]
        concurrency: usize,
        /// Per-URL render timeout in milliseconds
        #[arg(long, default_value = "8000")]
        timeout: u64,
        /// Minimum trimmed HTML length for a page to count as live
        #[arg(long, default_value = "80")]
        min_html: usize,
    },
    /// Train the text classifier from stored HTML artifacts
    Train,
    /// Score a corpus sample before and after HTML perturbation
    Technique1 {
        /// Number of corpus rows to sample
        #[arg(long, default_value = "200")]
        samples: usize,
        /// Per-URL render timeout in milliseconds
        #[arg(long, default_value = "15000")]
        timeout: u64,
        /// Post-navigation settle delay in milliseconds
        #[arg(long, default_value = "4000")]
        settle: u64,
    },
    /// Score a corpus sample as a distinct variant with similarity drop
    Technique2 {
        /// Number of corpus rows to sample
        #[arg(long, default_value = "200")]
        samples: usize,
        /// Per-URL render timeout in milliseconds
        #[arg(long, default_value = "15000")]
        timeout: u64,
        /// Post-navigation settle delay in milliseconds
        #[arg(long, default_value = "3000")]
        settle: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose {
        "lurebench=debug"
    } else {
        "lurebench=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse()?),
        )
        .init();

    std::fs::create_dir_all(&args.data_dir)?;

    match args.command {
        Commands::Build {
            phish_quota,
            legit_quota,
            concurrency,
            timeout,
            min_html,
        } => {
            cli::build_cmd::run(
                &args.data_dir,
                cli::build_cmd::BuildOptions {
                    phish_quota,
                    legit_quota,
                    concurrency,
                    timeout_ms: timeout,
                    min_html_len: min_html,
                },
            )
            .await
        }
        Commands::Train => cli::train_cmd::run(&args.data_dir),
        Commands::Technique1 {
            samples,
            timeout,
            settle,
        } => {
            cli::technique1_cmd::run(
                &args.data_dir,
                EvalOptions {
                    n_samples: samples,
                    timeout_ms: timeout,
                    settle_ms: settle,
                },
            )
            .await
        }
        Commands::Technique2 {
            samples,
            timeout,
            settle,
        } => {
            cli::technique2_cmd::run(
                &args.data_dir,
                EvalOptions {
                    n_samples: samples,
                    timeout_ms: timeout,
                    settle_ms: settle,
                },
            )
            .await
        }
    }
}
