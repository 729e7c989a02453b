use anyhow::{Result, bail};

/// Scores for one metric across an iteration, in scenario order, with the
/// median and mean appended at the end (in that order). Keeping the summary
/// in the same sequence lets one tabular line show raw values plus summary.
#[derive(Debug, Clone)]
pub struct MetricSummary {
    pub label: &'static str,
    pub scores: Vec<f64>,
}

impl MetricSummary {
    /// Aggregate one metric's per-scenario scores.
    ///
    /// Fails explicitly on an empty score list; mean and median are
    /// undefined there and must never come out as NaN or zero.
    pub fn aggregate(label: &'static str, mut scores: Vec<f64>) -> Result<Self> {
        if scores.is_empty() {
            bail!("Cannot aggregate {label}: no scenario scores");
        }

        let median = median(&scores);
        let mean = mean(&scores);
        scores.push(median);
        scores.push(mean);

        Ok(Self { label, scores })
    }

    /// One tab-separated report line; `suffix` carries the template string
    /// on the faithfulness line
    pub fn format_line(&self, suffix: Option<&str>) -> String {
        let rendered: Vec<String> = self
            .scores
            .iter()
            .map(|score| format!("{:10.3}", score))
            .collect();

        let mut line = format!("{}\t{}", self.label, rendered.join("\t"));
        if let Some(suffix) = suffix {
            line.push('\t');
            line.push_str(suffix);
        }
        line
    }
}

fn mean(scores: &[f64]) -> f64 {
    let sum: f64 = scores.iter().sum();
    sum / scores.len() as f64
}

fn median(scores: &[f64]) -> f64 {
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
