//! Launch config template generation.

use colored::Colorize;
use loraforge_training::{DatasetSpec, LaunchConfig, Profile};
use std::path::Path;

pub fn execute(output: &Path, profile: &str) -> anyhow::Result<()> {
    let profile: Profile = profile.parse().map_err(anyhow::Error::msg)?;
    let config = LaunchConfig::with_profile(
        "Qwen/Qwen2.5-1.5B-Instruct",
        "my-adapter",
        DatasetSpec::jsonl("dataset.jsonl"),
        profile,
    );

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, config.to_toml()?)?;

    println!();
    println!("{}", "Config template written".bold().green());
    println!("  Path: {}", output.display().to_string().cyan());
    println!("  {}", "Edit model_id, adapter_name and dataset.path, then run `loraforge train --config <path>`.".dimmed());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_round_trips_through_loader() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("launch.toml");
        execute(&path, "fast").unwrap();

        let config = LaunchConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.adapter.rank, 16);
        assert!(config.training.fp16);
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let temp = TempDir::new().unwrap();
        assert!(execute(&temp.path().join("launch.toml"), "turbo").is_err());
    }
}
