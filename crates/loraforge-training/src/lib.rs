//! Loraforge Training
//!
//! Backend-agnostic primitives for launching QLoRA supervised fine-tuning:
//! - Describing a run (`LaunchConfig` with quantization/adapter/training records)
//! - Reading JSONL datasets
//! - Resolving models and tokenizers (`ModelRegistry`)
//! - Running a trainer backend (`SftTrainer`) and persisting adapter artifacts

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod launch;
pub mod layout;
pub mod model;
pub mod progress;
pub mod registry;
pub mod trainer;

pub use artifacts::{ArtifactKind, TrainingArtifact, TrainingManifest, TrainingMetrics};
pub use config::{
    AdapterAttachment, AdapterConfig, BiasMode, ComputeDtype, DatasetSpec, DevicePlacement,
    LaunchConfig, OptimizerKind, Profile, QuantScheme, QuantizationConfig, SchedulerKind,
    TaskType, TrainingConfig,
};
pub use dataset::{Dataset, DatasetId, compute_dataset_id, ensure_dataset_exists, read_jsonl_dataset};
pub use error::{LaunchError, LaunchResult};
pub use launch::{LaunchReport, Launcher, RunId};
pub use layout::OutputLayout;
pub use model::{ModelHandle, ModelRegistry, PaddingSide, TokenizerHandle, prepare_for_kbit_training};
pub use progress::{ProgressEvent, ProgressSink, StdoutProgressSink};
pub use registry::{AdapterEntry, discover_adapters};
pub use trainer::{SftTrainer, TrainedAdapter};
