use crate::error::{LaunchError, LaunchResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compute precision used for the quantized matmuls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeDtype {
    F32,
    F16,
    Bf16,
}

/// 4-bit weight quantization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantScheme {
    Nf4,
    Fp4,
}

/// How model weights are compressed at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantizationConfig {
    pub load_in_4bit: bool,
    pub quant_type: QuantScheme,
    pub compute_dtype: ComputeDtype,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self { load_in_4bit: true, quant_type: QuantScheme::Nf4, compute_dtype: ComputeDtype::F32 }
    }
}

/// Whether the launcher attaches the low-rank adapter itself or hands the
/// adapter config to the trainer and lets it attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterAttachment {
    Explicit,
    ByTrainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasMode {
    None,
    All,
    LoraOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    CausalLm,
}

/// Low-rank adapter hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub alpha: f64,
    pub dropout: f64,
    pub rank: u32,
    pub bias: BiasMode,
    pub task_type: TaskType,
    pub target_modules: Vec<String>,
    pub attachment: AdapterAttachment,
}

impl AdapterConfig {
    /// Attention + feed-forward projection targets (the rank-64 profile).
    #[must_use]
    pub fn full_targets() -> Vec<String> {
        ["q_proj", "k_proj", "v_proj", "o_proj", "gate_proj", "up_proj", "down_proj"]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    /// Attention projection targets only.
    #[must_use]
    pub fn attention_targets() -> Vec<String> {
        ["q_proj", "k_proj", "v_proj", "o_proj"].iter().map(|s| (*s).to_string()).collect()
    }

    pub fn validate(&self) -> LaunchResult<()> {
        if self.rank == 0 {
            return Err(LaunchError::InvalidConfig("adapter.rank must be >= 1".to_string()));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(LaunchError::InvalidConfig("adapter.alpha must be > 0".to_string()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(LaunchError::InvalidConfig("adapter.dropout must be in [0, 1)".to_string()));
        }
        if self.target_modules.is_empty() {
            return Err(LaunchError::InvalidConfig(
                "adapter.target_modules must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            alpha: 16.0,
            dropout: 0.1,
            rank: 64,
            bias: BiasMode::None,
            task_type: TaskType::CausalLm,
            target_modules: Self::full_targets(),
            attachment: AdapterAttachment::ByTrainer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    PagedAdamw32bit,
    AdamW,
}

impl OptimizerKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PagedAdamw32bit => "paged_adamw_32bit",
            Self::AdamW => "adamw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    Constant,
    Linear,
    Cosine,
}

/// Optimization schedule and I/O cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub output_dir: PathBuf,
    pub num_train_epochs: u32,
    pub per_device_train_batch_size: u32,
    pub gradient_accumulation_steps: u32,
    pub optim: OptimizerKind,
    pub save_steps: u64,
    pub logging_steps: u64,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub fp16: bool,
    pub bf16: bool,
    pub max_grad_norm: f64,
    /// Epoch-bounded when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,
    pub warmup_ratio: f64,
    pub group_by_length: bool,
    pub lr_scheduler_type: SchedulerKind,
    pub packing: bool,
    /// Experiment-tracking integration; `None` disables reporting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_to: Option<String>,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./results"),
            num_train_epochs: 1,
            per_device_train_batch_size: 4,
            gradient_accumulation_steps: 1,
            optim: OptimizerKind::PagedAdamw32bit,
            save_steps: 50,
            logging_steps: 10,
            learning_rate: 2e-4,
            weight_decay: 0.001,
            fp16: false,
            bf16: false,
            max_grad_norm: 0.3,
            max_steps: None,
            warmup_ratio: 0.03,
            group_by_length: true,
            lr_scheduler_type: SchedulerKind::Constant,
            packing: false,
            report_to: None,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> LaunchResult<()> {
        if self.num_train_epochs == 0 {
            return Err(LaunchError::InvalidConfig("training.num_train_epochs must be >= 1".to_string()));
        }
        if self.per_device_train_batch_size == 0 {
            return Err(LaunchError::InvalidConfig(
                "training.per_device_train_batch_size must be >= 1".to_string(),
            ));
        }
        if self.gradient_accumulation_steps == 0 {
            return Err(LaunchError::InvalidConfig(
                "training.gradient_accumulation_steps must be >= 1".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(LaunchError::InvalidConfig("training.learning_rate must be > 0".to_string()));
        }
        if self.save_steps == 0 || self.logging_steps == 0 {
            return Err(LaunchError::InvalidConfig(
                "training.save_steps and training.logging_steps must be >= 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.warmup_ratio) {
            return Err(LaunchError::InvalidConfig("training.warmup_ratio must be in [0, 1]".to_string()));
        }
        if self.max_grad_norm <= 0.0 {
            return Err(LaunchError::InvalidConfig("training.max_grad_norm must be > 0".to_string()));
        }
        if self.fp16 && self.bf16 {
            return Err(LaunchError::InvalidConfig(
                "training.fp16 and training.bf16 are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the training examples come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Line-delimited JSON file, one record per example.
    pub path: PathBuf,
    /// Field holding the pre-formatted training text.
    pub text_field: String,
}

impl DatasetSpec {
    #[must_use]
    pub fn jsonl(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), text_field: "text".to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePlacement {
    Auto,
    Cpu,
    Cuda,
}

/// Named configuration profiles covering the two observed launch behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Full-precision compute, rank 64, attention + feed-forward targets,
    /// adapter attached by the trainer. Safe on older accelerators.
    Compat,
    /// Half-precision compute, rank 16, attention targets only, adapter
    /// attached explicitly before the trainer runs.
    Fast,
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compat" => Ok(Self::Compat),
            "fast" => Ok(Self::Fast),
            other => Err(format!("unknown profile: {other} (expected compat|fast)")),
        }
    }
}

/// Complete description of one fine-tuning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Hub identifier or local path of the base model.
    pub model_id: String,
    /// Name of the output adapter; also the output directory name.
    pub adapter_name: String,
    pub dataset: DatasetSpec,
    pub device: DevicePlacement,
    pub quantization: QuantizationConfig,
    pub adapter: AdapterConfig,
    pub training: TrainingConfig,
}

impl LaunchConfig {
    #[must_use]
    pub fn new(model_id: impl Into<String>, adapter_name: impl Into<String>, dataset: DatasetSpec) -> Self {
        Self {
            model_id: model_id.into(),
            adapter_name: adapter_name.into(),
            dataset,
            device: DevicePlacement::Auto,
            quantization: QuantizationConfig::default(),
            adapter: AdapterConfig::default(),
            training: TrainingConfig::default(),
        }
    }

    /// Build a config from a named profile.
    #[must_use]
    pub fn with_profile(
        model_id: impl Into<String>,
        adapter_name: impl Into<String>,
        dataset: DatasetSpec,
        profile: Profile,
    ) -> Self {
        let mut config = Self::new(model_id, adapter_name, dataset);
        config.apply_profile(profile);
        config
    }

    pub fn apply_profile(&mut self, profile: Profile) {
        match profile {
            Profile::Compat => {
                self.quantization.compute_dtype = ComputeDtype::F32;
                self.training.fp16 = false;
                self.training.bf16 = false;
                self.adapter.rank = 64;
                self.adapter.target_modules = AdapterConfig::full_targets();
                self.adapter.attachment = AdapterAttachment::ByTrainer;
            }
            Profile::Fast => {
                self.quantization.compute_dtype = ComputeDtype::F16;
                self.training.fp16 = true;
                self.training.bf16 = false;
                self.adapter.rank = 16;
                self.adapter.target_modules = AdapterConfig::attention_targets();
                self.adapter.attachment = AdapterAttachment::Explicit;
            }
        }
    }

    pub fn validate(&self) -> LaunchResult<()> {
        if self.model_id.trim().is_empty() {
            return Err(LaunchError::InvalidConfig("model_id is required".to_string()));
        }
        if self.adapter_name.trim().is_empty() {
            return Err(LaunchError::InvalidConfig("adapter_name is required".to_string()));
        }
        if self.dataset.text_field.trim().is_empty() {
            return Err(LaunchError::InvalidConfig("dataset.text_field is required".to_string()));
        }
        self.adapter.validate()?;
        self.training.validate()?;
        Ok(())
    }

    /// Load a launch config from a TOML file.
    pub fn from_toml_file(path: &Path) -> LaunchResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| LaunchError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Serialize to TOML, e.g. for `loraforge config` templates.
    pub fn to_toml(&self) -> LaunchResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LaunchError::InvalidConfig(format!("failed to serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> LaunchConfig {
        LaunchConfig::new("Qwen/Qwen2.5-1.5B-Instruct", "raise-qwen-adapter", DatasetSpec::jsonl("dataset.jsonl"))
    }

    #[test]
    fn test_defaults_match_compat_launch_values() {
        let config = base_config();
        assert!(config.quantization.load_in_4bit);
        assert_eq!(config.quantization.quant_type, QuantScheme::Nf4);
        assert_eq!(config.quantization.compute_dtype, ComputeDtype::F32);
        assert_eq!(config.adapter.rank, 64);
        assert_eq!(config.adapter.alpha, 16.0);
        assert_eq!(config.adapter.dropout, 0.1);
        assert_eq!(config.adapter.target_modules.len(), 7);
        assert_eq!(config.training.num_train_epochs, 1);
        assert_eq!(config.training.per_device_train_batch_size, 4);
        assert_eq!(config.training.learning_rate, 2e-4);
        assert_eq!(config.training.weight_decay, 0.001);
        assert_eq!(config.training.save_steps, 50);
        assert_eq!(config.training.logging_steps, 10);
        assert_eq!(config.training.max_grad_norm, 0.3);
        assert_eq!(config.training.warmup_ratio, 0.03);
        assert_eq!(config.training.lr_scheduler_type, SchedulerKind::Constant);
        assert_eq!(config.training.max_steps, None);
        assert!(config.training.group_by_length);
        assert!(!config.training.packing);
        assert!(config.training.report_to.is_none());
    }

    #[test]
    fn test_fast_profile_differs_in_precision_rank_and_attachment() {
        let mut config = base_config();
        config.apply_profile(Profile::Fast);
        assert_eq!(config.quantization.compute_dtype, ComputeDtype::F16);
        assert!(config.training.fp16);
        assert_eq!(config.adapter.rank, 16);
        assert_eq!(config.adapter.target_modules, AdapterConfig::attention_targets());
        assert_eq!(config.adapter.attachment, AdapterAttachment::Explicit);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_model_id() {
        let mut config = base_config();
        config.model_id = "  ".to_string();
        assert!(matches!(config.validate(), Err(LaunchError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_rank_and_bad_dropout() {
        let mut config = base_config();
        config.adapter.rank = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.adapter.dropout = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_fp16_and_bf16_together() {
        let mut config = base_config();
        config.training.fp16 = true;
        config.training.bf16 = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LaunchConfig::with_profile(
            "Qwen/Qwen2.5-1.5B-Instruct",
            "my-adapter",
            DatasetSpec::jsonl("data/train.jsonl"),
            Profile::Fast,
        );
        let toml_text = config.to_toml().unwrap();
        let parsed: LaunchConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(parsed, config);
    }
}
