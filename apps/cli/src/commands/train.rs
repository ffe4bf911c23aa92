//! Training command implementation.

use crate::progress::ProgressBarSink;
use colored::Colorize;
use loraforge_core::{LocalBackend, LocalRegistry};
use loraforge_training::{DatasetSpec, LaunchConfig, LaunchError, Launcher, Profile};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI flag overrides applied on top of the config file (or its defaults).
#[derive(Debug, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub dataset: Option<PathBuf>,
    pub adapter: Option<String>,
    pub profile: Option<String>,
    pub text_field: Option<String>,
    pub rank: Option<u32>,
    pub learning_rate: Option<f64>,
    pub epochs: Option<u32>,
    pub batch_size: Option<u32>,
    pub max_steps: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

pub async fn execute(config_path: Option<PathBuf>, overrides: Overrides, json: bool) -> anyhow::Result<()> {
    match run(config_path, overrides, json).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("{} {}", "error:".bold().red(), e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(config_path: Option<PathBuf>, overrides: Overrides, json: bool) -> Result<(), LaunchError> {
    let config = build_config(config_path, overrides)?;

    let root = std::env::current_dir()?;
    let launcher = Launcher::new(Arc::new(LocalRegistry), Arc::new(LocalBackend), root);

    if !json {
        print_summary(&config);
    }

    let sink = ProgressBarSink::new(json);
    let report = launcher.run(&config, &sink).await?;
    sink.finish();

    if json {
        println!("{}", serde_json::to_string_pretty(&report.manifest)?);
        return Ok(());
    }

    println!();
    println!("{}", "Fine-tuning complete".bold().green());
    println!("  Run: {}", report.manifest.run_id.0.cyan());
    if let Some(loss) = report.manifest.metrics.train_loss {
        println!("  Train loss: {loss:.4}");
    }
    println!("  Adapter: {}", report.adapter_dir.display().to_string().cyan());
    println!();
    Ok(())
}

fn build_config(config_path: Option<PathBuf>, overrides: Overrides) -> Result<LaunchConfig, LaunchError> {
    let mut config = match config_path {
        Some(path) => LaunchConfig::from_toml_file(&path)?,
        None => {
            let model = overrides.model.clone().ok_or_else(|| {
                LaunchError::InvalidConfig("--model is required without --config".to_string())
            })?;
            let dataset = overrides.dataset.clone().ok_or_else(|| {
                LaunchError::InvalidConfig("--dataset is required without --config".to_string())
            })?;
            let adapter = overrides.adapter.clone().ok_or_else(|| {
                LaunchError::InvalidConfig("--adapter is required without --config".to_string())
            })?;
            LaunchConfig::new(model, adapter, DatasetSpec::jsonl(dataset))
        }
    };

    // Profile first, individual overrides after, so flags beat the profile.
    if let Some(profile) = overrides.profile.as_deref() {
        let profile: Profile = profile.parse().map_err(LaunchError::InvalidConfig)?;
        config.apply_profile(profile);
    }
    if let Some(model) = overrides.model {
        config.model_id = model;
    }
    if let Some(dataset) = overrides.dataset {
        config.dataset.path = dataset;
    }
    if let Some(adapter) = overrides.adapter {
        config.adapter_name = adapter;
    }
    if let Some(text_field) = overrides.text_field {
        config.dataset.text_field = text_field;
    }
    if let Some(rank) = overrides.rank {
        config.adapter.rank = rank;
    }
    if let Some(learning_rate) = overrides.learning_rate {
        config.training.learning_rate = learning_rate;
    }
    if let Some(epochs) = overrides.epochs {
        config.training.num_train_epochs = epochs;
    }
    if let Some(batch_size) = overrides.batch_size {
        config.training.per_device_train_batch_size = batch_size;
    }
    if let Some(max_steps) = overrides.max_steps {
        config.training.max_steps = Some(max_steps);
    }
    if let Some(output_dir) = overrides.output_dir {
        config.training.output_dir = output_dir;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(config: &LaunchConfig) {
    println!();
    println!("{}", "Launch configuration".bold().cyan());
    println!("  Model: {}", config.model_id.cyan());
    println!("  Adapter: {} (rank {})", config.adapter_name.cyan(), config.adapter.rank);
    println!("  Dataset: {}", config.dataset.path.display().to_string().dimmed());
    println!(
        "  Quantization: 4-bit {:?}, compute {:?}",
        config.quantization.quant_type, config.quantization.compute_dtype
    );
    println!(
        "  Schedule: {} epoch(s), batch {}, lr {:.1e}, {:?} scheduler",
        config.training.num_train_epochs,
        config.training.per_device_train_batch_size,
        config.training.learning_rate,
        config.training.lr_scheduler_type
    );
    println!();
}
