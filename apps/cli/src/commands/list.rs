//! Adapter listing command.

use colored::Colorize;
use loraforge_training::discover_adapters;
use serde_json::json;
use std::path::Path;

pub fn execute(dir: &Path, json_output: bool) -> anyhow::Result<()> {
    let adapters = discover_adapters(dir)?;

    if json_output {
        let out: Vec<_> = adapters
            .into_iter()
            .map(|a| {
                json!({
                    "adapter": a.adapter_name,
                    "base_model": a.base_model,
                    "weights_path": a.weights_path,
                    "run_id": a.manifest.run_id.0,
                    "created_at": a.manifest.created_at,
                    "rank": a.manifest.adapter.rank,
                    "dataset_id": a.manifest.dataset_id.0,
                    "train_loss": a.manifest.metrics.train_loss,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Trained Adapters ({})", adapters.len()).bold().cyan());
    println!();

    if adapters.is_empty() {
        println!("  {}", "No trained adapters found in this directory.".dimmed());
        println!();
        println!("  {}", "Tip: run `loraforge train --model <id> --dataset <file> --adapter <name>`.".dimmed());
        return Ok(());
    }

    println!("{:<28} {:<32} {:>6}  {}", "Adapter", "Base model", "Rank", "Weights");
    println!("{}", "─".repeat(90));
    for a in adapters {
        println!(
            "{:<28} {:<32} {:>6}  {}",
            a.adapter_name.cyan(),
            a.base_model.dimmed(),
            a.manifest.adapter.rank,
            a.weights_path.display().to_string().dimmed()
        );
    }
    println!();
    Ok(())
}
