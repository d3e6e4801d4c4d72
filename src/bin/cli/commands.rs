//! Command Execution Logic
//!
//! One function per subcommand. Each loads configuration, applies CLI
//! overrides and drives the library.

use crate::cli::args::*;
use crate::cli::output::*;
use anyhow::Context;
use dialoguer::Confirm;
use docsmith::core::config::DocsmithConfig;
use docsmith::core::scanner::discover_sources;
use docsmith::io::reports::{render_csv, write_report};
use docsmith::validation::{MetricsProvider, PydocstyleValidator, RadonMetrics, StyleValidator};
use docsmith::ReviewEngine;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Implicit configuration files, in lookup order.
const IMPLICIT_CONFIG_FILES: &[&str] = &[".docsmith.yml", ".docsmith.yaml"];

/// Load configuration from `config_path`, an implicit file in the working
/// directory, or defaults.
pub fn load_configuration(config_path: Option<&Path>) -> anyhow::Result<DocsmithConfig> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => IMPLICIT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file()),
    };

    let config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            DocsmithConfig::from_yaml_file(&path)
                .with_context(|| format!("Invalid configuration file {}", path.display()))?
        }
        None => DocsmithConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Engine for commands that may call the completion service.
fn build_engine(config: DocsmithConfig, offline: bool) -> anyhow::Result<ReviewEngine> {
    if offline {
        return Ok(ReviewEngine::offline(config)?);
    }
    let key_env = config.generator.api_key_env.clone();
    ReviewEngine::with_oracle(config).with_context(|| {
        format!("Set {key_env} or pass --offline to render placeholder docstrings")
    })
}

/// Scan a tree and report coverage.
pub async fn scan_command(args: ScanArgs, mut config: DocsmithConfig) -> anyhow::Result<()> {
    if let Some(threshold) = args.threshold {
        config.coverage.threshold = threshold;
    }
    if let Some(mode) = args.mode {
        config.coverage.mode = mode.into();
    }
    if args.no_recursive {
        config.scan.recursive = false;
    }

    let engine = if args.generate_docs {
        build_engine(config, args.offline)?
    } else {
        ReviewEngine::offline(config)?
    };

    let mut units = engine.scan(&args.path)?;
    if args.generate_docs {
        let progress = spinner("Generating docstring previews...");
        let attached = engine.attach_previews(&mut units).await;
        if let Some(pb) = progress {
            pb.finish_with_message(format!("{attached} previews generated"));
        }
    }

    let report = engine.coverage(&units);
    write_report(&report, &args.out)?;

    match args.format {
        OutputFormat::Text => {
            display_coverage(&report);
            println!();
            println!(
                "{} {}",
                "📁 Report saved to:".bold(),
                args.out.display().to_string().cyan()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print!("{}", render_csv(&units)),
    }

    if args.strict && !report.aggregate.meets_threshold {
        eprintln!(
            "{} {:.2}% < {:.2}%",
            "❌ Coverage below threshold:".red(),
            report.aggregate.coverage_percent,
            report.aggregate.threshold
        );
        std::process::exit(1);
    }
    Ok(())
}

/// List incomplete routines for a layout.
pub async fn review_command(args: ReviewArgs, mut config: DocsmithConfig) -> anyhow::Result<()> {
    if let Some(style) = args.style {
        config.docstring.style = style.into();
    }
    let engine = ReviewEngine::offline(config)?;
    let units = engine.scan(&args.path)?;
    let listings = engine.review(
        &units,
        args.search.as_deref(),
        args.status.map(Into::into),
    );

    match args.format {
        OutputFormat::Text => display_review(&listings, engine.style().display_name()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&review_json(&listings))?),
        OutputFormat::Csv => {
            println!("File,Function,Line,Status");
            for listing in &listings {
                let line = listing
                    .entry
                    .as_routine()
                    .map(|r| r.start_line.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{}",
                    listing.file_path,
                    listing.entry.name(),
                    line,
                    listing_status(listing)
                );
            }
        }
    }
    Ok(())
}

/// Render a docstring and show the rewrite it would make.
pub async fn generate_command(args: RoutineArgs, mut config: DocsmithConfig) -> anyhow::Result<()> {
    args.apply_overrides(&mut config);
    let engine = build_engine(config, args.offline)?;

    let routine = engine.locate(&args.file, &args.routine)?;
    let text = engine.preview(&routine).await;

    println!(
        "{} {} ({})",
        "📝 Generated docstring for".bold(),
        routine.name.cyan(),
        engine.style().display_name()
    );
    println!();
    println!("{text}");
    println!();

    match engine.plan_rewrite(&args.file, &routine, &text) {
        Ok(outcome) => print_diff(&outcome.diff),
        Err(err) => eprintln!("{} {}", "⚠️  Cannot rewrite in place:".yellow(), err),
    }
    Ok(())
}

/// Render a docstring and write it into the file.
pub async fn apply_command(args: ApplyArgs, mut config: DocsmithConfig) -> anyhow::Result<()> {
    args.routine.apply_overrides(&mut config);
    if args.backup {
        config.rewrite.backup = true;
    }
    let engine = build_engine(config, args.routine.offline)?;

    let file = &args.routine.file;
    let routine = engine.locate(file, &args.routine.routine)?;
    let text = engine.preview(&routine).await;
    let planned = engine.plan_rewrite(file, &routine, &text)?;
    print_diff(&planned.diff);
    println!();

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Write this docstring into {}?", file.display()))
            .default(false)
            .interact()
            .context("Confirmation prompt failed; pass --yes to skip it")?;
        if !confirmed {
            println!("{}", "Aborted, file unchanged.".yellow());
            return Ok(());
        }
    }

    let outcome = engine.apply(file, &routine, &text)?;
    println!(
        "{} {} in {}",
        "✅ Updated docstring of".bright_green().bold(),
        outcome.routine.cyan(),
        outcome.file_path.display()
    );
    if let Some(backup) = &outcome.backup_path {
        println!("   Backup: {}", backup.display());
    }

    let units = engine.scan(file)?;
    let report = engine.coverage(&units);
    println!(
        "{} {:.2}% ({})",
        "📊 File coverage now:".bold(),
        report.aggregate.coverage_percent,
        grade_label(report.aggregate.coverage_percent)
    );
    Ok(())
}

/// Run pydocstyle over every discovered file.
pub async fn validate_command(args: ValidateArgs, config: DocsmithConfig) -> anyhow::Result<()> {
    let files = discover_sources(&args.path, &config.scan)?;
    let validator = PydocstyleValidator::default();

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let violations = validator.validate(&file).await?;
        results.push((file.display().to_string(), violations));
    }

    match args.format {
        OutputFormat::Text => display_violations(&results),
        OutputFormat::Json => {
            let json: serde_json::Map<String, serde_json::Value> = results
                .into_iter()
                .map(|(file, violations)| -> anyhow::Result<(String, serde_json::Value)> {
                    Ok((file, serde_json::to_value(violations)?))
                })
                .collect::<anyhow::Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            println!("File,Line,Code,Message");
            for (file, violations) in &results {
                for violation in violations {
                    println!(
                        "{},{},{},\"{}\"",
                        file,
                        violation.line.map(|l| l.to_string()).unwrap_or_default(),
                        violation.code,
                        violation.message.replace('"', "\"\"")
                    );
                }
            }
        }
    }
    Ok(())
}

/// Run radon on one file.
pub async fn metrics_command(args: MetricsArgs) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let radon = RadonMetrics::default();
    let blocks = radon.complexity(&source).await?;
    let maintainability = radon.maintainability(&source).await?;

    match args.format {
        OutputFormat::Text => display_metrics(&args.file, &blocks, maintainability),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "file": args.file.display().to_string(),
                "complexity": blocks,
                "maintainability": maintainability,
            }))?
        ),
        OutputFormat::Csv => {
            println!("Name,Line,Complexity");
            for block in &blocks {
                println!("{},{},{}", block.name, block.line, block.complexity);
            }
        }
    }
    Ok(())
}

/// Print default configuration
pub fn print_default_config() -> anyhow::Result<()> {
    println!("# Default docsmith configuration");
    println!("# Save this to .docsmith.yml and customize as needed");
    println!();
    print!("{}", serde_yaml::to_string(&DocsmithConfig::default())?);
    Ok(())
}

/// Initialize configuration file
pub fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        eprintln!(
            "{} {}",
            "❌ Configuration file already exists:".red(),
            args.output.display()
        );
        eprintln!("   Use --force to overwrite or choose a different name with --output");
        std::process::exit(1);
    }

    DocsmithConfig::default().to_yaml_file(&args.output)?;
    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    Ok(())
}
