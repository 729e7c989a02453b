use crate::client::CompletionClient;
use crate::config::{Credentials, Settings};
use crate::dataset::Dataset;
use crate::report::MetricSummary;
use crate::scorer::{EvalCase, Metric, Scorer};
use crate::session::SessionWriter;
use crate::template::{self, TemplateError};
use anyhow::{Context, Result, bail};
use std::io::Write;
use tokio::io::AsyncBufReadExt;

/// What to do with one line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The exact sentinel line `exit`: terminate the loop
    Exit,
    /// Blank input: back to the prompt with no side effects
    Skip,
    /// Anything else drives one full evaluation iteration
    Template(String),
}

/// Classify one input line; the sentinel is matched before trimming so
/// that a padded `exit` still counts as a template
pub fn classify(line: &str) -> Command {
    if line == "exit" {
        Command::Exit
    } else if line.trim().is_empty() {
        Command::Skip
    } else {
        Command::Template(line.to_string())
    }
}

/// Interactive driver: owns the dataset and runs one full evaluation
/// iteration per entered template
pub struct Repl {
    dataset: Dataset,
    completion: CompletionClient,
    judge: CompletionClient,
    faithfulness: Scorer,
    relevancy: Scorer,
    hallucination: Scorer,
    writer: SessionWriter,
    verbose: bool,
}

impl Repl {
    pub fn new(
        settings: &Settings,
        credentials: &Credentials,
        dataset: Dataset,
        verbose: bool,
    ) -> Self {
        let completion =
            CompletionClient::new(&settings.api_endpoint, &credentials.api_key, &settings.model);
        let judge = CompletionClient::new(
            &settings.judge_api_endpoint,
            &credentials.judge_api_key,
            &settings.judge_model,
        );

        Self {
            dataset,
            completion,
            judge,
            faithfulness: Scorer::new(Metric::Faithfulness, settings.faithfulness_threshold),
            relevancy: Scorer::new(Metric::Relevancy, settings.relevancy_threshold),
            hallucination: Scorer::new(Metric::Hallucination, settings.hallucination_threshold),
            writer: SessionWriter::new(settings.output_dir.clone()),
            verbose,
        }
    }

    /// Read templates from stdin until `exit`, running one iteration per line.
    ///
    /// Template errors abort the iteration and are reported; remote-service
    /// and I/O errors propagate and end the session.
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("\nEnter text: ");
            std::io::stdout().flush().context("Failed to flush stdout")?;

            let line = match lines.next_line().await.context("Failed to read input")? {
                Some(line) => line,
                None => break,
            };

            match classify(&line) {
                Command::Exit => break,
                Command::Skip => continue,
                Command::Template(query) => {
                    if let Err(err) = self.run_iteration(&query).await {
                        if err.downcast_ref::<TemplateError>().is_some() {
                            eprintln!("Iteration aborted: {err:#}");
                            continue;
                        }
                        return Err(err);
                    }
                }
            }
        }

        Ok(())
    }

    /// List the substitution keys the dataset offers, with an example
    fn print_banner(&self) {
        match self.dataset.data.first() {
            Some(entry) => {
                let keys: Vec<String> = entry
                    .field_names()
                    .iter()
                    .map(|name| format!("'{{{name}}}'"))
                    .collect();
                println!("Available keys: {}", keys.join(", "));
            }
            None => println!("Warning: dataset contains no scenario entries."),
        }
        println!("Sample request: 'As a lawyer describe how {{wrong}} is related to {{request}}'");
        println!("Type 'exit' to stop.");
    }

    /// One full pass: render, complete, and score every scenario, then
    /// print the summary lines and write a snapshot
    async fn run_iteration(&mut self, query: &str) -> Result<()> {
        if self.dataset.data.is_empty() {
            bail!("Dataset contains no scenario entries; nothing to evaluate");
        }

        self.dataset.prompt = Some(query.to_string());
        let total = self.dataset.data.len();

        for (index, entry) in self.dataset.data.iter_mut().enumerate() {
            let request = template::render(query, &entry.fields)?;

            if self.verbose {
                println!("Generating response for scenario {}/{}", index + 1, total);
            }

            let output = self
                .completion
                .complete(&request)
                .await
                .with_context(|| format!("Completion failed for scenario {}", index + 1))?;

            println!("{output}");
            entry.output = Some(output.clone());

            let case = EvalCase {
                input: request,
                actual_output: output,
                context: entry.reference_context()?,
            };

            if self.verbose {
                println!("Scoring scenario {}/{}", index + 1, total);
            }

            let faithfulness = self.faithfulness.measure(&self.judge, &case).await?;
            println!("{}", faithfulness.score);
            if let Some(reason) = &faithfulness.reason {
                println!("{reason}");
            }
            entry.faithfulness = Some(faithfulness.score);
            entry.faithfulness_reason = faithfulness.reason;

            let relevancy = self.relevancy.measure(&self.judge, &case).await?;
            println!("{}", relevancy.score);
            if let Some(reason) = &relevancy.reason {
                println!("{reason}");
            }
            entry.relevancy = Some(relevancy.score);
            entry.relevancy_reason = relevancy.reason;

            let hallucination = self.hallucination.measure(&self.judge, &case).await?;
            println!("{}", hallucination.score);
            entry.hallucination = Some(hallucination.score);

            println!("\n\n");
        }

        self.print_summary(query)?;

        let path = self.writer.write_snapshot(&self.dataset)?;
        println!("result saved to '{}'", path.display());

        Ok(())
    }

    /// Aggregate and print one tab-separated line per metric; the
    /// faithfulness line carries the template that produced the scores
    fn print_summary(&self, query: &str) -> Result<()> {
        let faith = MetricSummary::aggregate(
            Metric::Faithfulness.label(),
            self.dataset
                .data
                .iter()
                .filter_map(|e| e.faithfulness)
                .collect(),
        )?;
        let rel = MetricSummary::aggregate(
            Metric::Relevancy.label(),
            self.dataset
                .data
                .iter()
                .filter_map(|e| e.relevancy)
                .collect(),
        )?;
        let hal = MetricSummary::aggregate(
            Metric::Hallucination.label(),
            self.dataset
                .data
                .iter()
                .filter_map(|e| e.hallucination)
                .collect(),
        )?;

        println!("{}", faith.format_line(Some(query)));
        println!("{}", rel.format_line(None));
        println!("{}", hal.format_line(None));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ScenarioEntry;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_dataset(entries: usize) -> Dataset {
        let data = (0..entries)
            .map(|i| {
                serde_json::from_value::<ScenarioEntry>(json!({
                    "wrong": format!("wrong answer {i}"),
                    "request": format!("subject {i}"),
                    "right": [format!("reference fact {i}")],
                    "intermediate": "some reasoning"
                }))
                .unwrap()
            })
            .collect();

        Dataset { prompt: None, data }
    }

    fn test_repl(server_url: &str, output_dir: &str, dataset: Dataset) -> Repl {
        let mut settings = Settings::default();
        settings.api_endpoint = server_url.to_string();
        settings.judge_api_endpoint = server_url.to_string();
        settings.output_dir = output_dir.to_string();

        let credentials = Credentials {
            api_key: "test-key".to_string(),
            judge_api_key: "test-judge-key".to_string(),
        };

        Repl::new(&settings, &credentials, dataset, false)
    }

    /// A body that works for both roles: the completion output is the JSON
    /// verdict string, which the judge path then parses as a verdict
    fn dual_purpose_body() -> String {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "test-model",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "{\"score\": 0.5, \"reason\": \"test reason\"}"
                    },
                    "finish_reason": "stop"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_classify_exit() {
        assert_eq!(classify("exit"), Command::Exit);
    }

    #[test]
    fn test_classify_blank() {
        assert_eq!(classify(""), Command::Skip);
        assert_eq!(classify("   "), Command::Skip);
        assert_eq!(classify("\t"), Command::Skip);
    }

    #[test]
    fn test_classify_template() {
        assert_eq!(
            classify("Describe {wrong} vs {request}"),
            Command::Template("Describe {wrong} vs {request}".to_string())
        );
        // Padded sentinel is treated as a template, matching the exact-line rule
        assert_eq!(
            classify(" exit "),
            Command::Template(" exit ".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_iteration_enriches_every_entry() {
        let mut server = mockito::Server::new_async().await;
        // 2 scenarios x (1 completion + 3 judge calls)
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(dual_purpose_body())
            .expect(8)
            .create_async()
            .await;

        let temp_dir = tempdir().unwrap();
        let mut repl = test_repl(
            &server.url(),
            temp_dir.path().to_str().unwrap(),
            sample_dataset(2),
        );

        repl.run_iteration("Describe {wrong} vs {request}")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            repl.dataset.prompt.as_deref(),
            Some("Describe {wrong} vs {request}")
        );
        for entry in &repl.dataset.data {
            assert_eq!(entry.output.as_deref(), Some("{\"score\": 0.5, \"reason\": \"test reason\"}"));
            assert_eq!(entry.faithfulness, Some(0.5));
            assert_eq!(entry.faithfulness_reason.as_deref(), Some("test reason"));
            assert_eq!(entry.relevancy, Some(0.5));
            assert_eq!(entry.relevancy_reason.as_deref(), Some("test reason"));
            assert_eq!(entry.hallucination, Some(0.5));
        }

        // One snapshot file written for the iteration
        let files: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_run_iteration_two_passes_write_distinct_files() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(dual_purpose_body())
            .expect_at_least(8)
            .create_async()
            .await;

        let temp_dir = tempdir().unwrap();
        let mut repl = test_repl(
            &server.url(),
            temp_dir.path().to_str().unwrap(),
            sample_dataset(1),
        );

        repl.run_iteration("First pass on {request}").await.unwrap();
        repl.run_iteration("Second pass on {request}").await.unwrap();

        let files: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 2);
        // The in-memory prompt records the latest template
        assert_eq!(repl.dataset.prompt.as_deref(), Some("Second pass on {request}"));
    }

    #[tokio::test]
    async fn test_run_iteration_empty_dataset_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let temp_dir = tempdir().unwrap();
        let mut repl = test_repl(
            &server.url(),
            temp_dir.path().to_str().unwrap(),
            sample_dataset(0),
        );

        let result = repl.run_iteration("Describe {request}").await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("no scenario entries")
        );

        // No network calls, no snapshot
        mock.assert_async().await;
        let files: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 0);
    }

    #[tokio::test]
    async fn test_run_iteration_unknown_placeholder_aborts_before_any_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let temp_dir = tempdir().unwrap();
        let mut repl = test_repl(
            &server.url(),
            temp_dir.path().to_str().unwrap(),
            sample_dataset(1),
        );

        let result = repl.run_iteration("Describe {nonexistent}").await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .downcast_ref::<TemplateError>()
                .is_some()
        );

        mock.assert_async().await;
        let files: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 0);
    }

    #[tokio::test]
    async fn test_run_iteration_service_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let temp_dir = tempdir().unwrap();
        let mut repl = test_repl(
            &server.url(),
            temp_dir.path().to_str().unwrap(),
            sample_dataset(1),
        );

        let result = repl.run_iteration("Describe {request}").await;
        assert!(result.is_err());
        // Not a template error, so the session would end
        assert!(
            result
                .unwrap_err()
                .downcast_ref::<TemplateError>()
                .is_none()
        );
    }
}
