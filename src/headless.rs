use anyhow::{Result, anyhow};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::controller::{RequestState, UIController};
use crate::orchestrator::{RequestOrchestrator, SpecificationResult};

/// Output shape of a one-shot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

/// Generate once for `description` and print the result to stdout.
pub async fn run_once(
    controller: &mut UIController,
    orchestrator: &RequestOrchestrator,
    description: &str,
    format: OutputFormat,
) -> Result<()> {
    controller.set_description(description);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Generating specifications with {}...", orchestrator.model()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    controller.generate(orchestrator).await;
    spinner.finish_and_clear();

    match controller.state() {
        RequestState::Succeeded(result) => {
            println!("{}", render(result, format)?);
            Ok(())
        }
        _ => {
            let message = controller
                .error_message()
                .unwrap_or("Generation did not complete");
            Err(anyhow!("{}", message))
        }
    }
}

fn render(result: &SpecificationResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Terminal => Ok(format!(
            "{}\n{}\n\n{}\n{}",
            "English Specifications".bright_white().bold(),
            result.english_specs,
            "المواصفات بالعربية".bright_white().bold(),
            result.arabic_specs
        )),
    }
}
