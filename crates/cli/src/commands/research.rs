//! `researchflow research` — interactive session or single query.

use std::io::Write;
use std::sync::Arc;

use researchflow_config::AppConfig;
use researchflow_core::event::{DomainEvent, EventBus};
use researchflow_providers::build_from_config;
use researchflow_workflow::{PipelineOrchestrator, PipelineResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info};

const RULE: &str = "============================================================";

pub async fn run(
    config: AppConfig,
    query: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = match config.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!(error = %e, "Missing credentials");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let providers = build_from_config(&config, &credentials);
    let event_bus = Arc::new(EventBus::default());
    if verbose {
        spawn_progress_printer(&event_bus);
    }

    let orchestrator =
        PipelineOrchestrator::from_config(&config, providers.generation, providers.search, event_bus);

    match query {
        Some(query) => {
            let result = orchestrator.run(query.trim()).await;
            println!("{}", summary(query.trim(), &result));
        }
        None => interactive(&orchestrator).await?,
    }

    Ok(())
}

/// What a line typed at the prompt means.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Skip,
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else if line.is_empty() {
        Input::Skip
    } else {
        Input::Query(line)
    }
}

async fn interactive(orchestrator: &PipelineOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("🔍 Research Assistant (type 'exit' to quit)");
    println!("-----------------------------------------");
    println!("Note: Both exact queries and common variations will be searched");
    println!("-----------------------------------------");
    info!("Starting interactive session");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nEnter your research question: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Session ended by keyboard interrupt");
                println!("\nSession ended");
                break;
            }
        };

        // EOF (Ctrl+D)
        let Some(line) = line else {
            println!();
            break;
        };

        match classify(&line) {
            Input::Exit => {
                info!("Session ended by user");
                break;
            }
            Input::Skip => continue,
            Input::Query(query) => {
                println!("\n🔄 Processing your request...");
                let result = orchestrator.run(query).await;
                println!("\n{}", summary(query, &result));
            }
        }
    }

    if let Some(path) = orchestrator.save_gallery() {
        println!("📊 Session charts saved to: {}", path.display());
    }

    Ok(())
}

/// The text printed after each run.
fn summary(query: &str, result: &PipelineResult) -> String {
    let mut out = vec![RULE.to_string()];
    if result.success {
        out.push(format!("📝 Research Question: {query}"));
        out.push(String::new());
        out.push("🔎 Findings:".into());
        out.push(result.answer.clone());
        out.push(String::new());
        out.push(format!("📄 Report saved to: {}", result.path.display()));
        out.push(format!("🔗 Sources used: {}", result.sources));
        if result.visualization {
            out.push("📊 Reliability visualization included".into());
        }
        if result.query_variations.len() > 1 {
            out.push(String::new());
            out.push(format!(
                "ℹ️ Note: Searched variations: {}",
                result.query_variations.join(", ")
            ));
        }
    } else {
        out.push("❌ Research failed".into());
        out.push(format!("Details: {}", result.answer));
    }
    out.push(RULE.to_string());
    out.join("\n")
}

fn spawn_progress_printer(event_bus: &EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = progress_line(&event) {
                        eprintln!("  {line}");
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn progress_line(event: &DomainEvent) -> Option<String> {
    match event {
        DomainEvent::StageStarted { stage, .. } => Some(format!("▶ {stage}")),
        DomainEvent::StageCompleted {
            stage,
            duration_ms,
            error,
            ..
        } => Some(match error {
            Some(e) => format!("⚠ {stage} ({duration_ms} ms): {e}"),
            None => format!("✓ {stage} ({duration_ms} ms)"),
        }),
        DomainEvent::SearchExecuted {
            query,
            records,
            retry,
            ..
        } => Some(format!(
            "  search{} \"{query}\": {records} record(s)",
            if *retry { " (retry)" } else { "" }
        )),
        DomainEvent::ReportExported { .. } | DomainEvent::PipelineFailed { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn success(variations: &[&str], visualization: bool) -> PipelineResult {
        PipelineResult {
            success: true,
            answer: "# Findings\nAll good.".into(),
            path: PathBuf::from("research_outputs/report_20260101_120000.docx"),
            sources: 3,
            visualization,
            query_variations: variations.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn classify_input() {
        assert_eq!(classify("exit"), Input::Exit);
        assert_eq!(classify("  QUIT "), Input::Exit);
        assert_eq!(classify("   "), Input::Skip);
        assert_eq!(classify(" climate policy "), Input::Query("climate policy"));
        assert_eq!(classify("exit strategy"), Input::Query("exit strategy"));
    }

    #[test]
    fn success_summary() {
        let text = summary("climate policy", &success(&["climate policy"], true));
        assert!(text.contains("📝 Research Question: climate policy"));
        assert!(text.contains("# Findings\nAll good."));
        assert!(text.contains("📄 Report saved to: research_outputs/report_20260101_120000.docx"));
        assert!(text.contains("🔗 Sources used: 3"));
        assert!(text.contains("Reliability visualization included"));
        assert!(!text.contains("Searched variations"));
        assert!(text.starts_with(RULE) && text.ends_with(RULE));
    }

    #[test]
    fn success_summary_lists_variations() {
        let text = summary("travily api", &success(&["travily api", "tavily api"], false));
        assert!(text.contains("Searched variations: travily api, tavily api"));
        assert!(!text.contains("visualization included"));
    }

    #[test]
    fn failure_summary() {
        let result = PipelineResult::failure(PathBuf::from("out/error_report_x.txt"));
        let text = summary("q", &result);
        assert!(text.contains("❌ Research failed"));
        assert!(text.contains("Details: Research failed. Error report saved to out/error_report_x.txt"));
        assert!(!text.contains("Sources used"));
    }

    #[test]
    fn progress_lines() {
        let now = chrono::Utc::now();
        let line = progress_line(&DomainEvent::StageCompleted {
            stage: "visualize".into(),
            duration_ms: 12,
            error: Some("Visualization failed: chart could not be rendered".into()),
            timestamp: now,
        });
        assert_eq!(
            line.as_deref(),
            Some("⚠ visualize (12 ms): Visualization failed: chart could not be rendered")
        );

        let line = progress_line(&DomainEvent::SearchExecuted {
            query: "tavily".into(),
            records: 2,
            retry: true,
            timestamp: now,
        });
        assert_eq!(line.as_deref(), Some("  search (retry) \"tavily\": 2 record(s)"));
    }
}
