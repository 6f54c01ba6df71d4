//! `veracity`: run the evidence consensus pipeline from the command line.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use veracity_core::{AnalysisResult, ClassifierVerdict, Label, StaticClassifier};
use veracity_runtime::{CrossCheckAdapter, PipelineConfig, PipelineOrchestrator, ProviderRegistry};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one piece of news text
    Analyze {
        /// Pipeline config (YAML, or JSON by extension). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Classifier label; derived from --probability-real when omitted
        #[arg(long)]
        label: Option<Label>,
        /// Classifier probability that the text is real, in [0, 1]
        #[arg(long)]
        probability_real: f64,
        /// Text to analyze
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse and validate a config file, then list providers in order
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config,
            label,
            probability_real,
            text,
            file,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let verdict = match label {
                Some(label) => ClassifierVerdict::new(label, probability_real),
                None => ClassifierVerdict::from_probability_real(probability_real),
            }
            .context("Invalid classifier verdict")?;
            let text = read_text(text, file.as_deref())?;

            let orchestrator = PipelineOrchestrator::from_config(
                &config,
                Arc::new(StaticClassifier::new(verdict)),
                &ProviderRegistry::with_defaults(),
            )
            .context("Failed to build pipeline")?;

            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            let result = runtime
                .block_on(orchestrator.analyze(&text))
                .context("Analysis failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::CheckConfig { config, json } => {
            let config = PipelineConfig::from_file(&config)
                .with_context(|| format!("Invalid config {}", config.display()))?;
            let report = check_config(&config)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading config");
            PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => {
            tracing::debug!("No config given, using defaults");
            Ok(PipelineConfig::default())
        }
    }
}

fn read_text(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read text from stdin")?;
    Ok(buffer)
}

fn print_result(result: &AnalysisResult) {
    let verdict = &result.verdict;
    println!("Verdict:    {} ({:.0}% confidence)", verdict.label, verdict.confidence * 100.0);
    println!("Rationale:  {}", verdict.rationale);
    println!(
        "Classifier: {} (p_real = {:.2})",
        result.classifier.label(),
        result.classifier.probability_real()
    );

    let corroboration = &result.corroboration;
    println!(
        "Sources:    {:?}, {} result(s) for \"{}\"",
        corroboration.status, corroboration.total_results, corroboration.query
    );
    for outcome in &corroboration.provider_outcomes {
        match &outcome.error_detail {
            Some(detail) => println!("  - {}: {:?} ({})", outcome.provider_id, outcome.status, detail),
            None => println!("  - {}: {:?}", outcome.provider_id, outcome.status),
        }
    }
    for article in &corroboration.top_articles {
        println!("  * {} [{}] {}", article.title, article.source, article.url);
    }

    let cross_check = &result.cross_check;
    match (cross_check.available, cross_check.label) {
        (false, _) => println!("Cross-check: unavailable"),
        (true, Some(label)) => println!(
            "Cross-check: {} ({:.0}%)",
            label,
            cross_check.confidence.unwrap_or_default() * 100.0
        ),
        (true, None) => println!("Cross-check: uncertain"),
    }
    println!("Elapsed:    {}ms", result.elapsed_ms);
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    overall_deadline_ms: u64,
    providers: Vec<ProviderReport>,
    cross_check: String,
    cache: String,
}

#[derive(Debug, Serialize)]
struct ProviderReport {
    id: String,
    kind: String,
    status: &'static str,
}

fn check_config(config: &PipelineConfig) -> Result<ConfigReport> {
    let registry = ProviderRegistry::with_defaults();
    let adapters = registry
        .build_adapters(&config.aggregation.providers)
        .context("Failed to build providers")?;

    let providers = config
        .aggregation
        .providers
        .iter()
        .zip(&adapters)
        .map(|(provider, adapter)| ProviderReport {
            id: provider.id.clone(),
            kind: provider.kind.clone(),
            status: match (provider.enabled, adapter.is_enabled()) {
                (false, _) => "disabled",
                (true, false) => "skipped (missing credentials)",
                (true, true) => "enabled",
            },
        })
        .collect();

    let cross_check = CrossCheckAdapter::from_config(&config.cross_check)
        .context("Failed to build cross-check")?;

    Ok(ConfigReport {
        overall_deadline_ms: config.overall_deadline().as_millis() as u64,
        providers,
        cross_check: if cross_check.is_enabled() {
            format!("{} ({}, timeout {:?})", config.cross_check.provider, config.cross_check.model, config.cross_check.timeout)
        } else {
            "disabled".to_string()
        },
        cache: if config.cache.enabled {
            format!("{} entries, ttl {:?}", config.cache.max_entries, config.cache.ttl)
        } else {
            "disabled".to_string()
        },
    })
}

fn print_report(report: &ConfigReport) {
    println!("Config OK");
    println!("Overall deadline: {}ms", report.overall_deadline_ms);
    println!("Providers (in precedence order):");
    for (i, provider) in report.providers.iter().enumerate() {
        println!("  {}. {} [{}]: {}", i + 1, provider.id, provider.kind, provider.status);
    }
    println!("Cross-check: {}", report.cross_check);
    println!("Cache: {}", report.cache);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::try_parse_from([
            "veracity",
            "analyze",
            "--label",
            "fake",
            "--probability-real",
            "0.13",
            "--text",
            "The moon is made of cheese.",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze { label, probability_real, text, .. } => {
                assert_eq!(label, Some(Label::Fake));
                assert_eq!(probability_real, 0.13);
                assert_eq!(text.as_deref(), Some("The moon is made of cheese."));
            }
            _ => panic!("Expected analyze"),
        }
    }

    #[test]
    fn test_text_and_file_conflict() {
        let result = Cli::try_parse_from([
            "veracity",
            "analyze",
            "--probability-real",
            "0.5",
            "--text",
            "x",
            "--file",
            "y.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_config_report_keeps_order() {
        let config = PipelineConfig::from_yaml(
            r#"
aggregation:
  providers:
    - id: rss
      type: google-news-rss
    - id: off
      type: google-news-rss
      enabled: false
"#,
        )
        .unwrap();

        let report = check_config(&config).unwrap();
        let ids: Vec<_> = report.providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["rss", "off"]);
        assert_eq!(report.providers[0].status, "enabled");
        assert_eq!(report.providers[1].status, "disabled");
        assert_eq!(report.cross_check, "disabled");
    }
}
