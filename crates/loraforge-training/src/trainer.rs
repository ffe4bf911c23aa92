use crate::artifacts::{TrainingArtifact, TrainingMetrics};
use crate::config::LaunchConfig;
use crate::dataset::Dataset;
use crate::error::LaunchResult;
use crate::launch::RunId;
use crate::layout::OutputLayout;
use crate::model::{ModelHandle, TokenizerHandle};
use crate::progress::ProgressSink;
use async_trait::async_trait;

/// Trained adapter state handed back by a trainer backend, ready to be
/// persisted by `save_adapter`.
#[derive(Debug, Clone)]
pub struct TrainedAdapter {
    pub model: ModelHandle,
    pub metrics: TrainingMetrics,
    /// Backend-defined adapter weights payload.
    pub weights: serde_json::Value,
}

/// Supervised fine-tuning backend.
///
/// All gradient-accumulation, mixed-precision, and optimizer-stepping logic
/// lives behind this trait; the launcher's contract is limited to these
/// signatures.
#[async_trait]
pub trait SftTrainer: Send + Sync {
    fn id(&self) -> &'static str;

    /// Validate the job and set up output directories before any work.
    async fn prepare(&self, config: &LaunchConfig, layout: &OutputLayout) -> LaunchResult<()>;

    /// Run the training loop synchronously to completion.
    ///
    /// When the adapter attachment policy is `ByTrainer`, the backend must
    /// attach the configured adapter to the model before optimizing.
    async fn run(
        &self,
        run_id: &RunId,
        config: &LaunchConfig,
        model: ModelHandle,
        tokenizer: &TokenizerHandle,
        dataset: &Dataset,
        layout: &OutputLayout,
        progress: &dyn ProgressSink,
    ) -> LaunchResult<TrainedAdapter>;

    /// Persist only the adapter weights (not the base model) into the
    /// adapter directory, returning the written artifacts.
    async fn save_adapter(
        &self,
        trained: &TrainedAdapter,
        layout: &OutputLayout,
    ) -> LaunchResult<Vec<TrainingArtifact>>;
}
