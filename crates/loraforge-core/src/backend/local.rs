use loraforge_training::{
    ArtifactKind, Dataset, DevicePlacement, LaunchConfig, LaunchError, LaunchResult, ModelHandle,
    ModelRegistry, OutputLayout, PaddingSide, ProgressEvent, ProgressSink, QuantizationConfig,
    RunId, SftTrainer, TokenizerHandle, TrainedAdapter, TrainingArtifact, TrainingMetrics,
    artifacts::make_artifact,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Local stand-in for a model hub: resolves any non-empty identifier into
/// fresh handles without touching the network. Device placement `auto`
/// lands on the CPU.
#[derive(Debug, Clone, Default)]
pub struct LocalRegistry;

#[async_trait]
impl ModelRegistry for LocalRegistry {
    fn id(&self) -> &'static str {
        "local"
    }

    async fn resolve(
        &self,
        model_id: &str,
        quantization: &QuantizationConfig,
        device: DevicePlacement,
    ) -> LaunchResult<(ModelHandle, TokenizerHandle)> {
        if model_id.trim().is_empty() {
            return Err(LaunchError::Acquisition("model id is empty".to_string()));
        }

        let placement = match device {
            DevicePlacement::Auto | DevicePlacement::Cpu => DevicePlacement::Cpu,
            DevicePlacement::Cuda => {
                return Err(LaunchError::Acquisition(
                    "local backend has no CUDA support".to_string(),
                ));
            }
        };

        let model = ModelHandle::new(model_id, placement, quantization.clone());
        // This model family defines no pad token; the launcher aliases it.
        let tokenizer = TokenizerHandle {
            model_id: model_id.to_string(),
            eos_token: "</s>".to_string(),
            pad_token: None,
            padding_side: PaddingSide::Left,
        };
        Ok((model, tokenizer))
    }
}

/// A minimal local trainer that fits a character-level bigram model over the
/// training texts and saves it as the adapter payload.
///
/// It honors the launch schedule (epochs, batch size, step limit, checkpoint
/// and logging cadence) so the full pipeline can be exercised on CPU.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BigramAdapter {
    vocab: Vec<String>,
    transitions: Vec<Vec<f32>>,
    rank: u32,
}

fn fit_bigram(corpus: &str, rank: u32) -> LaunchResult<(BigramAdapter, f64)> {
    if corpus.is_empty() {
        return Err(LaunchError::Training("training text is empty".to_string()));
    }

    // Stable vocab ordering
    let mut set = BTreeSet::new();
    for ch in corpus.chars() {
        set.insert(ch);
    }
    let vocab: Vec<char> = set.into_iter().collect();
    let n = vocab.len();

    let mut index = HashMap::new();
    for (i, ch) in vocab.iter().enumerate() {
        index.insert(*ch, i);
    }

    // Count transitions with Laplace smoothing
    let mut counts = vec![vec![1f32; n]; n];
    let mut prev: Option<usize> = None;
    for ch in corpus.chars() {
        let cur = *index
            .get(&ch)
            .ok_or_else(|| LaunchError::Training("failed to index char".to_string()))?;
        if let Some(p) = prev {
            counts[p][cur] += 1.0;
        }
        prev = Some(cur);
    }

    // Mean negative log-likelihood of the observed transitions.
    let row_sums: Vec<f32> = counts.iter().map(|row| row.iter().sum()).collect();
    let mut nll = 0f64;
    let mut observed = 0u64;
    let mut prev: Option<usize> = None;
    for ch in corpus.chars() {
        let cur = index[&ch];
        if let Some(p) = prev {
            let prob = f64::from(counts[p][cur]) / f64::from(row_sums[p]);
            nll -= prob.ln();
            observed += 1;
        }
        prev = Some(cur);
    }
    let loss = if observed == 0 { 0.0 } else { nll / observed as f64 };

    let adapter = BigramAdapter {
        vocab: vocab.into_iter().map(|c| c.to_string()).collect(),
        transitions: counts,
        rank,
    };
    Ok((adapter, loss))
}

#[async_trait]
impl SftTrainer for LocalBackend {
    fn id(&self) -> &'static str {
        "local-bigram"
    }

    async fn prepare(&self, config: &LaunchConfig, layout: &OutputLayout) -> LaunchResult<()> {
        config.validate()?;
        layout.ensure_dirs()?;
        Ok(())
    }

    async fn run(
        &self,
        run_id: &RunId,
        config: &LaunchConfig,
        mut model: ModelHandle,
        _tokenizer: &TokenizerHandle,
        dataset: &Dataset,
        layout: &OutputLayout,
        progress: &dyn ProgressSink,
    ) -> LaunchResult<TrainedAdapter> {
        if model.use_cache {
            return Err(LaunchError::Training(
                "model cache must be disabled before training".to_string(),
            ));
        }

        if model.adapter.is_none() {
            model.attach_adapter(&config.adapter)?;
        }

        progress.on_event(ProgressEvent::Started { run_id: run_id.clone() });

        // Joining prompt-formatted texts is enough for a character model;
        // packing stays off, so examples are separated by newlines.
        let mut corpus = String::new();
        for ex in &dataset.examples {
            corpus.push_str(ex);
            corpus.push('\n');
        }

        let (weights, loss) = fit_bigram(&corpus, config.adapter.rank)?;

        let batch = u64::from(config.training.per_device_train_batch_size);
        let steps_per_epoch = (dataset.len() as u64).div_ceil(batch);
        let mut total_steps = steps_per_epoch * u64::from(config.training.num_train_epochs);
        if let Some(limit) = config.training.max_steps {
            total_steps = total_steps.min(limit);
        }

        for step in 1..=total_steps {
            if step % config.training.logging_steps == 0 || step == total_steps {
                progress.on_event(ProgressEvent::Step {
                    run_id: run_id.clone(),
                    step,
                    total: Some(total_steps),
                    loss: Some(loss),
                });
            }
            if step % config.training.save_steps == 0 {
                let dir = layout.checkpoint_dir(step);
                std::fs::create_dir_all(&dir)?;
                std::fs::write(dir.join("trainer_state.json"), serde_json::to_string(&weights)?)?;
                debug!(step, "checkpoint written");
            }
        }

        progress.on_event(ProgressEvent::Finished { run_id: run_id.clone() });

        Ok(TrainedAdapter {
            model,
            metrics: TrainingMetrics {
                train_loss: Some(loss),
                steps: Some(total_steps),
                examples: Some(dataset.len() as u64),
            },
            weights: serde_json::to_value(&weights)?,
        })
    }

    async fn save_adapter(
        &self,
        trained: &TrainedAdapter,
        layout: &OutputLayout,
    ) -> LaunchResult<Vec<TrainingArtifact>> {
        let path = layout.adapter_weights_path();
        std::fs::write(&path, serde_json::to_string_pretty(&trained.weights)?)?;
        Ok(vec![make_artifact(ArtifactKind::AdapterWeights, path)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loraforge_training::{DatasetSpec, Launcher, Profile, StdoutProgressSink, dataset};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_dataset(dir: &std::path::Path, lines: usize) -> DatasetSpec {
        let path = dir.join("dataset.jsonl");
        let examples: Vec<String> =
            (0..lines).map(|i| format!("example number {i} with some text")).collect();
        dataset::write_jsonl_dataset(&path, "text", &examples).unwrap();
        DatasetSpec::jsonl(path)
    }

    #[test]
    fn test_fit_bigram_rejects_empty_corpus() {
        assert!(fit_bigram("", 64).is_err());
    }

    #[test]
    fn test_fit_bigram_loss_is_finite_and_positive() {
        let (adapter, loss) = fit_bigram(&"hello world\n".repeat(20), 64).unwrap();
        assert!(!adapter.vocab.is_empty());
        assert!(loss.is_finite());
        assert!(loss > 0.0);
    }

    #[tokio::test]
    async fn test_local_run_writes_adapter_and_manifest() {
        let temp = TempDir::new().unwrap();
        let launcher = Launcher::new(
            Arc::new(LocalRegistry),
            Arc::new(LocalBackend),
            temp.path().to_path_buf(),
        );

        let config = LaunchConfig::new("local/test-model", "test-adapter", write_dataset(temp.path(), 8));
        let report = launcher.run(&config, &StdoutProgressSink).await.unwrap();

        assert!(report.adapter_dir.join("adapter_model.json").exists());
        assert!(report.adapter_dir.join("adapter_manifest.json").exists());
        assert!(report.manifest.metrics.train_loss.unwrap() > 0.0);
        // 8 examples, batch 4, one epoch
        assert_eq!(report.manifest.metrics.steps, Some(2));
    }

    #[tokio::test]
    async fn test_checkpoints_written_at_save_cadence() {
        let temp = TempDir::new().unwrap();
        let launcher = Launcher::new(
            Arc::new(LocalRegistry),
            Arc::new(LocalBackend),
            temp.path().to_path_buf(),
        );

        let mut config =
            LaunchConfig::new("local/test-model", "ckpt-adapter", write_dataset(temp.path(), 12));
        config.training.per_device_train_batch_size = 1;
        config.training.save_steps = 5;
        config.training.logging_steps = 3;
        launcher.run(&config, &StdoutProgressSink).await.unwrap();

        let results = temp.path().join("results");
        assert!(results.join("checkpoint-5").join("trainer_state.json").exists());
        assert!(results.join("checkpoint-10").join("trainer_state.json").exists());
        assert!(!results.join("checkpoint-15").exists());
    }

    #[tokio::test]
    async fn test_max_steps_caps_the_schedule() {
        let temp = TempDir::new().unwrap();
        let launcher = Launcher::new(
            Arc::new(LocalRegistry),
            Arc::new(LocalBackend),
            temp.path().to_path_buf(),
        );

        let mut config =
            LaunchConfig::new("local/test-model", "capped-adapter", write_dataset(temp.path(), 12));
        config.training.per_device_train_batch_size = 1;
        config.training.max_steps = Some(4);
        let report = launcher.run(&config, &StdoutProgressSink).await.unwrap();
        assert_eq!(report.manifest.metrics.steps, Some(4));
    }

    #[tokio::test]
    async fn test_fast_profile_records_explicit_attachment() {
        let temp = TempDir::new().unwrap();
        let launcher = Launcher::new(
            Arc::new(LocalRegistry),
            Arc::new(LocalBackend),
            temp.path().to_path_buf(),
        );

        let config = LaunchConfig::with_profile(
            "local/test-model",
            "fast-adapter",
            write_dataset(temp.path(), 4),
            Profile::Fast,
        );
        let report = launcher.run(&config, &StdoutProgressSink).await.unwrap();
        assert_eq!(report.manifest.adapter.rank, 16);
        let weights: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(report.adapter_dir.join("adapter_model.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(weights["rank"], 16);
    }

    #[tokio::test]
    async fn test_cuda_placement_is_an_acquisition_failure() {
        let registry = LocalRegistry;
        let err = registry
            .resolve("local/test-model", &QuantizationConfig::default(), DevicePlacement::Cuda)
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::Acquisition(_)));
    }
}
