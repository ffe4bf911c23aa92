//! Loraforge CLI - Command-line interface for launching QLoRA fine-tuning runs
//!
//! This CLI provides a `loraforge` command for configuring and running
//! supervised fine-tuning of causal-language-model checkpoints with
//! quantized low-rank adapters.

mod commands;
mod progress;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Loraforge - QLoRA supervised fine-tuning launcher
#[derive(Parser, Debug)]
#[command(
    name = "loraforge",
    author,
    version,
    about = "Loraforge - QLoRA supervised fine-tuning launcher",
    long_about = "Configures and launches supervised fine-tuning of a pretrained causal-language-model\ncheckpoint using quantized low-rank adaptation, then saves the adapter weights."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a supervised fine-tuning launch
    ///
    /// Validates the dataset, resolves the base model with 4-bit
    /// quantization, prepares it for adapter training, runs the trainer, and
    /// saves the adapter weights to a directory named after the adapter.
    Train {
        /// Launch config TOML file (CLI flags override its values)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Base model identifier (hub id or local path)
        #[arg(short, long)]
        model: Option<String>,

        /// Training dataset (JSONL, one record per line)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Output adapter name (also the output directory name)
        #[arg(short, long)]
        adapter: Option<String>,

        /// Configuration profile (compat, fast)
        #[arg(short, long)]
        profile: Option<String>,

        /// Record field holding the training text
        #[arg(long)]
        text_field: Option<String>,

        /// Adapter rank override
        #[arg(long)]
        rank: Option<u32>,

        /// Learning rate override
        #[arg(long)]
        learning_rate: Option<f64>,

        /// Epoch count override
        #[arg(long)]
        epochs: Option<u32>,

        /// Per-device batch size override
        #[arg(long)]
        batch_size: Option<u32>,

        /// Step limit (epoch-bounded when absent)
        #[arg(long)]
        max_steps: Option<u64>,

        /// Checkpoint/log output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the training manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// List previously trained adapters
    List {
        /// Directory to scan for adapter manifests
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a launch config template
    Config {
        /// Output path for the TOML template
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration profile (compat, fast)
        #[arg(short, long, default_value = "compat")]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = args.log_level.parse::<Level>().unwrap_or(Level::INFO);
    // Logs go to stderr so `--json` stdout stays machine-readable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train {
            config,
            model,
            dataset,
            adapter,
            profile,
            text_field,
            rank,
            learning_rate,
            epochs,
            batch_size,
            max_steps,
            output_dir,
            json,
        } => {
            let overrides = commands::train::Overrides {
                model,
                dataset,
                adapter,
                profile,
                text_field,
                rank,
                learning_rate,
                epochs,
                batch_size,
                max_steps,
                output_dir,
            };
            commands::train::execute(config, overrides, json).await
        }
        Command::List { dir, json } => commands::list::execute(&dir, json),
        Command::Config { output, profile } => commands::template::execute(&output, &profile),
    }
}
