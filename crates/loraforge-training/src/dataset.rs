use crate::config::DatasetSpec;
use crate::error::{LaunchError, LaunchResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Stable identifier for a dataset (content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

/// In-memory training split: one pre-formatted text per example.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub examples: Vec<String>,
    pub id: DatasetId,
}

impl Dataset {
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Fail-fast precondition: the dataset file must exist before any model
/// resources are allocated.
pub fn ensure_dataset_exists(spec: &DatasetSpec) -> LaunchResult<()> {
    if !spec.path.is_file() {
        return Err(LaunchError::MissingDataset(spec.path.clone()));
    }
    Ok(())
}

pub fn compute_dataset_id(examples: &[String]) -> DatasetId {
    let mut hasher = Sha256::new();
    for ex in examples {
        hasher.update(ex.as_bytes());
        hasher.update(b"\n");
    }
    DatasetId(hex::encode(hasher.finalize()))
}

/// Read a JSONL dataset, selecting the full file as a single training split.
///
/// Each line must be a JSON object carrying the configured text field with a
/// non-empty string value.
pub fn read_jsonl_dataset(spec: &DatasetSpec) -> LaunchResult<Dataset> {
    ensure_dataset_exists(spec)?;
    let contents = std::fs::read_to_string(&spec.path)?;

    let mut examples = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            LaunchError::Dataset(format!("failed to parse jsonl line {}: {}", idx + 1, e))
        })?;
        let text = record
            .get(&spec.text_field)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                LaunchError::Dataset(format!(
                    "line {} has no string field '{}'",
                    idx + 1,
                    spec.text_field
                ))
            })?;
        if text.trim().is_empty() {
            return Err(LaunchError::Dataset(format!("line {} text is empty", idx + 1)));
        }
        examples.push(text.to_string());
    }

    if examples.is_empty() {
        return Err(LaunchError::Dataset("dataset must not be empty".to_string()));
    }

    let id = compute_dataset_id(&examples);
    Ok(Dataset { examples, id })
}

/// Write examples back out as JSONL (used by tests and config templates).
pub fn write_jsonl_dataset(path: &Path, text_field: &str, examples: &[String]) -> LaunchResult<()> {
    let mut out = String::new();
    for ex in examples {
        let mut record = serde_json::Map::new();
        record.insert(text_field.to_string(), serde_json::Value::String(ex.clone()));
        out.push_str(&serde_json::to_string(&serde_json::Value::Object(record))?);
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}
