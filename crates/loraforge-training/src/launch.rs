use crate::artifacts::{TrainingManifest, make_artifact};
use crate::config::{AdapterAttachment, LaunchConfig};
use crate::dataset::{ensure_dataset_exists, read_jsonl_dataset};
use crate::error::{LaunchError, LaunchResult};
use crate::layout::OutputLayout;
use crate::model::{ModelRegistry, PaddingSide, prepare_for_kbit_training};
use crate::progress::ProgressSink;
use crate::trainer::SftTrainer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Identifier for one launch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of a successful launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReport {
    pub manifest: TrainingManifest,
    pub adapter_dir: PathBuf,
}

/// Configures and drives one supervised fine-tuning run end to end:
/// precondition check, model acquisition, k-bit preparation, tokenizer
/// setup, dataset load, training, and adapter persistence.
pub struct Launcher {
    registry: Arc<dyn ModelRegistry>,
    trainer: Arc<dyn SftTrainer>,
    root: PathBuf,
}

impl Launcher {
    #[must_use]
    pub fn new(registry: Arc<dyn ModelRegistry>, trainer: Arc<dyn SftTrainer>, root: PathBuf) -> Self {
        Self { registry, trainer, root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn run(&self, config: &LaunchConfig, progress: &dyn ProgressSink) -> LaunchResult<LaunchReport> {
        config.validate()?;

        // Fail fast before any model resources are allocated.
        ensure_dataset_exists(&config.dataset)?;

        let run_id = RunId::new();
        info!(run_id = %run_id, model = %config.model_id, "starting fine-tuning launch");

        let layout = OutputLayout::new(&self.root, &config.training.output_dir, &config.adapter_name);
        layout.ensure_dirs()?;

        let (mut model, mut tokenizer) = self
            .registry
            .resolve(&config.model_id, &config.quantization, config.device)
            .await
            .map_err(|e| match e {
                e @ LaunchError::Acquisition(_) => e,
                other => LaunchError::Acquisition(other.to_string()),
            })?;

        // Caching is incompatible with gradient checkpointing during training.
        model.disable_cache();
        model.set_single_device_tp();

        prepare_for_kbit_training(&mut model);

        if config.adapter.attachment == AdapterAttachment::Explicit {
            model.attach_adapter(&config.adapter)?;
        }

        tokenizer.ensure_pad_token();
        tokenizer.padding_side = PaddingSide::Right;

        let dataset = read_jsonl_dataset(&config.dataset)?;
        info!(examples = dataset.len(), "dataset loaded");

        self.trainer.prepare(config, &layout).await?;

        info!(trainer = self.trainer.id(), "starting training loop");
        let trained = self
            .trainer
            .run(&run_id, config, model, &tokenizer, &dataset, &layout, progress)
            .await
            .map_err(|e| match e {
                e @ LaunchError::Training(_) => e,
                other => LaunchError::Training(other.to_string()),
            })?;

        // Persist only after the training loop returned without error.
        let mut artifacts = self.trainer.save_adapter(&trained, &layout).await?;

        let config_path = layout.adapter_config_path();
        std::fs::write(&config_path, serde_json::to_string_pretty(&config.adapter)?)?;
        artifacts.push(make_artifact(crate::artifacts::ArtifactKind::AdapterConfig, config_path)?);

        let manifest = TrainingManifest {
            run_id: run_id.clone(),
            created_at: chrono::Utc::now(),
            base_model: config.model_id.clone(),
            adapter_name: config.adapter_name.clone(),
            dataset_id: dataset.id.clone(),
            quantization: config.quantization.clone(),
            adapter: config.adapter.clone(),
            metrics: trained.metrics.clone(),
            artifacts,
        };
        std::fs::write(layout.manifest_path(), serde_json::to_string_pretty(&manifest)?)?;

        info!(run_id = %run_id, adapter_dir = %layout.adapter_dir().display(), "adapter saved");
        Ok(LaunchReport { manifest, adapter_dir: layout.adapter_dir().to_path_buf() })
    }
}
