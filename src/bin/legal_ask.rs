use anyhow::{Context, Result, bail};
use clap::Parser;
use legal_assistant::agents::StructuredAnswer;
use legal_assistant::assistant::{AssistantApi, LegalAssistant};
use legal_assistant::{config, logging};
use std::fmt::Write as _;

#[derive(Parser)]
#[command(
    name = "legal-ask",
    about = "Ask the legal assistant a single question from the command line"
)]
struct Cli {
    /// Question to ask; multiple words are joined with spaces.
    #[arg(required = true)]
    query: Vec<String>,
    /// Print the structured answer as JSON instead of formatted text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli_tracing();

    let query = cli.query.join(" ");
    if query.trim().is_empty() {
        bail!("Query must not be empty");
    }

    let config = config::init_config().context("Failed to load configuration")?;
    let assistant = LegalAssistant::start(config)
        .await
        .context("Failed to initialize the legal assistant")?;
    let answer = assistant
        .answer(query.trim())
        .await
        .context("Failed to answer the question")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print!("{}", format_answer(&answer));
    }
    Ok(())
}

fn format_answer(answer: &StructuredAnswer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", answer.simple_explanation);

    if !answer.key_points.is_empty() {
        let _ = writeln!(out, "Key points:");
        for point in &answer.key_points {
            let _ = writeln!(out, "  - {point}");
        }
        out.push('\n');
    }
    if !answer.important_terms.is_empty() {
        let _ = writeln!(out, "Important terms:");
        for term in &answer.important_terms {
            let _ = writeln!(out, "  {}: {}", term.term, term.definition);
        }
        out.push('\n');
    }
    if !answer.warnings_and_deadlines.is_empty() {
        let _ = writeln!(out, "Warnings and deadlines:");
        for warning in &answer.warnings_and_deadlines {
            match &warning.deadline {
                Some(deadline) => {
                    let _ = writeln!(out, "  ! {} (deadline: {deadline})", warning.warning);
                }
                None => {
                    let _ = writeln!(out, "  ! {}", warning.warning);
                }
            }
        }
        out.push('\n');
    }
    if let Some(steps) = answer.step_by_step_guide.as_ref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "Step-by-step guide:");
        for (number, step) in steps.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", number + 1, step.title);
            if !step.description.is_empty() {
                let _ = writeln!(out, "     {}", step.description);
            }
            for requirement in &step.requirements {
                let _ = writeln!(out, "     * {requirement}");
            }
        }
        out.push('\n');
    }
    if !answer.sources.is_empty() {
        let _ = writeln!(out, "Sources:");
        for source in &answer.sources {
            if source.description.is_empty() {
                let _ = writeln!(out, "  - {}", source.title);
            } else {
                let _ = writeln!(out, "  - {}: {}", source.title, source.description);
            }
        }
    }
    out
}
