use crate::error::LaunchResult;
use std::path::{Path, PathBuf};

/// Filesystem layout for a run's outputs.
///
/// Periodic checkpoints go under the results root (`./results` by default);
/// the finished adapter goes into its own directory named after the adapter.
/// Relative paths resolve against the working root so tests can run inside
/// a temp directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    results_root: PathBuf,
    adapter_dir: PathBuf,
}

impl OutputLayout {
    #[must_use]
    pub fn new(root: &Path, results_dir: &Path, adapter_name: &str) -> Self {
        let results_root =
            if results_dir.is_absolute() { results_dir.to_path_buf() } else { root.join(results_dir) };
        Self { results_root, adapter_dir: root.join(adapter_name) }
    }

    #[must_use]
    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    #[must_use]
    pub fn adapter_dir(&self) -> &Path {
        &self.adapter_dir
    }

    #[must_use]
    pub fn checkpoint_dir(&self, step: u64) -> PathBuf {
        self.results_root.join(format!("checkpoint-{step}"))
    }

    #[must_use]
    pub fn adapter_weights_path(&self) -> PathBuf {
        self.adapter_dir.join("adapter_model.json")
    }

    #[must_use]
    pub fn adapter_config_path(&self) -> PathBuf {
        self.adapter_dir.join("adapter_config.json")
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.adapter_dir.join("adapter_manifest.json")
    }

    pub fn ensure_dirs(&self) -> LaunchResult<()> {
        std::fs::create_dir_all(&self.results_root)?;
        std::fs::create_dir_all(&self.adapter_dir)?;
        Ok(())
    }
}
