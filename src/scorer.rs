use crate::client::CompletionClient;
use anyhow::{Context, Result, bail};
use serde_json::Value;

/// One formatted request, the model's answer, and the reference context
#[derive(Debug, Clone)]
pub struct EvalCase {
    pub input: String,
    pub actual_output: String,
    pub context: Vec<String>,
}

/// The three text-quality metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Faithfulness,
    Relevancy,
    Hallucination,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Faithfulness => "Faith",
            Metric::Relevancy => "Rel",
            Metric::Hallucination => "Hal",
        }
    }

    /// Hallucination is scored without a justification
    pub fn includes_reason(&self) -> bool {
        !matches!(self, Metric::Hallucination)
    }

    fn judge_instructions(&self) -> &'static str {
        match self {
            Metric::Faithfulness => {
                "Judge whether every claim in the answer is supported by the reference context. \
                 Score 1.0 when the answer is fully supported and 0.0 when nothing is."
            }
            Metric::Relevancy => {
                "Judge whether the answer directly addresses the question it was given. \
                 Score 1.0 when the answer is fully on topic and 0.0 when it ignores the question."
            }
            Metric::Hallucination => {
                "Judge how much of the answer is fabricated or contradicts the reference context. \
                 Score 0.0 when nothing is fabricated and 1.0 when the answer is entirely unsupported."
            }
        }
    }
}

/// Numeric verdict for one metric over one case
#[derive(Debug, Clone)]
pub struct Measurement {
    pub score: f64,
    pub reason: Option<String>,
    pub passed: bool,
}

/// A single metric scorer backed by an LLM judge.
///
/// Stateless per call: each `measure` builds one judge prompt, makes one
/// completion call, and parses one JSON verdict. The threshold is recorded
/// on the measurement for downstream interpretation and never gates output.
pub struct Scorer {
    metric: Metric,
    threshold: f64,
}

impl Scorer {
    pub fn new(metric: Metric, threshold: f64) -> Self {
        Self { metric, threshold }
    }

    /// Score one case with the given judge client
    pub async fn measure(&self, judge: &CompletionClient, case: &EvalCase) -> Result<Measurement> {
        let prompt = self.build_judge_prompt(case);

        let verdict = judge
            .complete(&prompt)
            .await
            .with_context(|| format!("{} judge call failed", self.metric.label()))?;

        self.parse_verdict(&verdict)
            .with_context(|| format!("{} judge returned an unusable verdict", self.metric.label()))
    }

    fn build_judge_prompt(&self, case: &EvalCase) -> String {
        let reason_field = if self.metric.includes_reason() {
            r#", "reason": "<one sentence>""#
        } else {
            ""
        };

        format!(
            "{}\n\nQuestion: {}\nAnswer: {}\nReference context:\n{}\n\n\
             Respond with JSON only: {{\"score\": <number between 0.0 and 1.0>{}}}",
            self.metric.judge_instructions(),
            case.input,
            case.actual_output,
            case.context.join("\n"),
            reason_field
        )
    }

    /// Parse the judge's JSON verdict into a measurement
    fn parse_verdict(&self, response: &str) -> Result<Measurement> {
        let parsed = parse_json_response(response)?;

        let score = match parsed.get("score").and_then(|s| s.as_f64()) {
            Some(score) => score.clamp(0.0, 1.0),
            None => bail!("No numeric `score` field in judge response"),
        };

        let reason = if self.metric.includes_reason() {
            parsed
                .get("reason")
                .and_then(|r| r.as_str())
                .map(str::to_string)
        } else {
            None
        };

        let passed = match self.metric {
            // For hallucination a low score is the good outcome
            Metric::Hallucination => score <= self.threshold,
            _ => score >= self.threshold,
        };

        Ok(Measurement {
            score,
            reason,
            passed,
        })
    }
}

/// Parse JSON from the response, tolerating surrounding prose
fn parse_json_response(response: &str) -> Result<Value> {
    match serde_json::from_str(response) {
        Ok(parsed) => Ok(parsed),
        Err(_) => try_extract_embedded_json(response),
    }
}

/// Try to extract JSON that might be embedded in text
fn try_extract_embedded_json(response: &str) -> Result<Value> {
    match response.find('{') {
        Some(start) => match response.rfind('}') {
            Some(end) => serde_json::from_str(&response[start..=end])
                .context("Failed to parse extracted JSON"),
            None => bail!("Found opening brace but no closing brace in judge response"),
        },
        None => bail!("No JSON found in judge response"),
    }
}
