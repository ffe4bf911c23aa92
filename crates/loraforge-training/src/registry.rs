use crate::artifacts::{ArtifactKind, TrainingManifest};
use crate::error::{LaunchError, LaunchResult};
use std::path::{Path, PathBuf};

/// A previously trained adapter discovered on disk.
#[derive(Debug, Clone)]
pub struct AdapterEntry {
    pub adapter_name: String,
    pub base_model: String,
    pub weights_path: PathBuf,
    pub manifest: TrainingManifest,
}

fn read_manifest(path: &Path) -> LaunchResult<TrainingManifest> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice::<TrainingManifest>(&bytes)?)
}

/// Discover trained adapters by scanning `<root>/*/adapter_manifest.json`.
pub fn discover_adapters(root: &Path) -> LaunchResult<Vec<AdapterEntry>> {
    let mut out = Vec::new();

    let dir = match std::fs::read_dir(root) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e.into()),
    };

    for entry in dir {
        let entry = entry?;
        let adapter_dir = entry.path();
        if !adapter_dir.is_dir() {
            continue;
        }
        let manifest_path = adapter_dir.join("adapter_manifest.json");
        if !manifest_path.exists() {
            continue;
        }
        let manifest = read_manifest(&manifest_path)?;

        let weights = manifest
            .artifacts
            .iter()
            .find(|a| a.kind == ArtifactKind::AdapterWeights)
            .map(|a| a.path.clone())
            .ok_or_else(|| {
                LaunchError::Artifact(format!(
                    "adapter manifest for {} has no weights artifact",
                    manifest.adapter_name
                ))
            })?;

        out.push(AdapterEntry {
            adapter_name: manifest.adapter_name.clone(),
            base_model: manifest.base_model.clone(),
            weights_path: weights,
            manifest,
        });
    }

    out.sort_by(|a, b| a.adapter_name.cmp(&b.adapter_name));
    Ok(out)
}
