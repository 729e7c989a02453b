use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// One row of the evaluation dataset: substitution fields plus the
/// output and scores injected during an iteration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioEntry {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faithfulness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faithfulness_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevancy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevancy_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hallucination: Option<f64>,
}

impl ScenarioEntry {
    /// Build the reference-context list from the entry's `right` field
    pub fn reference_context(&self) -> Result<Vec<String>> {
        let right = match self.fields.get("right") {
            Some(value) => value,
            None => bail!("Scenario entry has no `right` field"),
        };

        match right.as_array() {
            Some(items) => Ok(items
                .iter()
                .map(|item| match item.as_str() {
                    Some(s) => s.to_string(),
                    None => item.to_string(),
                })
                .collect()),
            None => bail!("Scenario entry field `right` is not a list"),
        }
    }

    /// Substitution key names, in entry order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

/// The full evaluation dataset: scenario entries plus the last-used template
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub data: Vec<ScenarioEntry>,
}

impl Dataset {
    /// Load the dataset from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset JSON: {}", path.display()))
    }
}
