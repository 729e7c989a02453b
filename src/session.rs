use crate::dataset::Dataset;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Writes one snapshot of the enriched dataset per iteration
pub struct SessionWriter {
    output_dir: PathBuf,
}

impl SessionWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Serialize the dataset to `experiment_<epoch-millis>.json`.
    ///
    /// Sub-millisecond iterations collide on the timestamp; a counter
    /// suffix keeps every snapshot on its own file.
    pub fn write_snapshot(&self, dataset: &Dataset) -> Result<PathBuf> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the Unix epoch")?
            .as_millis();

        let path = self.next_free_path(millis);

        let json_content = serde_json::to_string_pretty(dataset)
            .context("Failed to serialize dataset to JSON")?;

        self.ensure_output_dir()?;
        std::fs::write(&path, json_content)
            .with_context(|| format!("Failed to write snapshot to: {}", path.display()))?;

        Ok(path)
    }

    fn next_free_path(&self, millis: u128) -> PathBuf {
        let base = self.output_dir.join(format!("experiment_{millis}.json"));
        if !base.exists() {
            return base;
        }

        let mut counter = 1u32;
        loop {
            let candidate = self
                .output_dir
                .join(format!("experiment_{millis}_{counter}.json"));
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
        }
    }

    fn ensure_output_dir(&self) -> Result<()> {
        if self.output_dir != Path::new("") {
            std::fs::create_dir_all(&self.output_dir).with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.output_dir.display()
                )
            })?;
        }
        Ok(())
    }
}
