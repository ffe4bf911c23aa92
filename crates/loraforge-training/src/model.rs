use crate::config::{AdapterConfig, DevicePlacement, QuantizationConfig};
use crate::error::{LaunchError, LaunchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingSide {
    Left,
    Right,
}

/// In-memory text encoder paired with the model.
///
/// The launcher owns this exclusively for the run and mutates it in place:
/// pad-token aliasing and right-side padding are required for correct
/// causal-LM batching with model families that define no pad token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerHandle {
    pub model_id: String,
    pub eos_token: String,
    pub pad_token: Option<String>,
    pub padding_side: PaddingSide,
}

impl TokenizerHandle {
    /// Alias the pad token to EOS when the tokenizer defines none.
    pub fn ensure_pad_token(&mut self) {
        if self.pad_token.is_none() {
            self.pad_token = Some(self.eos_token.clone());
        }
    }
}

/// In-memory loaded network, owned exclusively by the launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHandle {
    pub model_id: String,
    pub device: DevicePlacement,
    pub quantization: QuantizationConfig,
    /// Inference-time key/value caching; incompatible with gradient
    /// checkpointing during training.
    pub use_cache: bool,
    /// Tensor-parallel degree; 1 is the single-device value.
    pub pretraining_tp: u32,
    pub gradient_checkpointing: bool,
    pub kbit_prepared: bool,
    pub adapter: Option<AdapterConfig>,
}

impl ModelHandle {
    #[must_use]
    pub fn new(model_id: impl Into<String>, device: DevicePlacement, quantization: QuantizationConfig) -> Self {
        Self {
            model_id: model_id.into(),
            device,
            quantization,
            use_cache: true,
            pretraining_tp: 0,
            gradient_checkpointing: false,
            kbit_prepared: false,
            adapter: None,
        }
    }

    pub fn disable_cache(&mut self) {
        self.use_cache = false;
    }

    pub fn set_single_device_tp(&mut self) {
        self.pretraining_tp = 1;
    }

    /// Attach the low-rank adapter. Attaching twice is a launcher bug.
    pub fn attach_adapter(&mut self, adapter: &AdapterConfig) -> LaunchResult<()> {
        if self.adapter.is_some() {
            return Err(LaunchError::Training("adapter already attached".to_string()));
        }
        self.adapter = Some(adapter.clone());
        Ok(())
    }
}

/// Prepare a quantized model for gradient-based adapter training: enables
/// gradient checkpointing and marks the training-safe layer casts done.
pub fn prepare_for_kbit_training(model: &mut ModelHandle) {
    model.gradient_checkpointing = true;
    model.kbit_prepared = true;
}

/// Resolves a model identifier into a loaded model-and-tokenizer pair.
///
/// Implementations are opaque providers (a hub client, a local backend, a
/// test stub); the launcher's contract is limited to this signature.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    fn id(&self) -> &'static str;

    async fn resolve(
        &self,
        model_id: &str,
        quantization: &QuantizationConfig,
        device: DevicePlacement,
    ) -> LaunchResult<(ModelHandle, TokenizerHandle)>;
}
