// Declare modules
pub mod cli;
pub mod config;
pub mod content;
pub mod discovery;
pub mod formatter;
pub mod ignore_matcher;
pub mod models;
pub mod patterns;
pub mod scanner;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use self::cli::{Cli, Command};
use self::config::{load_user_defaults, resolve_config, resolve_root, ProjectConfig};
use self::discovery::Discovery;
use self::formatter::OutputGenerator;
use self::scanner::Scanner;

/// Parses arguments and dispatches the subcommand.
pub fn run() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Command::Init { project, no_scan } => init(project.dir.as_deref(), &args.config, no_scan),
        Command::Discover { project } => discover(project.dir.as_deref(), &args.config),
        Command::Start { project, output } => {
            start(project.dir.as_deref(), &args.config, output.as_deref())
        }
        Command::Count { file } => {
            let words = OutputGenerator::count_words(&file)
                .with_context(|| format!("Failed to count words in {}", file.display()))?;
            println!("File: {}\nWord Count: {}", file.display(), words);
            Ok(())
        }
    }
}

fn init(dir: Option<&Path>, config_name: &str, no_scan: bool) -> Result<()> {
    let root = resolve_root(dir)?;
    let config_path = root.join(config_name);
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    let defaults = load_user_defaults()?;
    let mut project = ProjectConfig::seeded(&defaults);
    if !no_scan {
        log::info!("🔍 Scanning directory structure to generate configuration...");
        let runtime = resolve_config(root, config_name, Some(&project), &defaults, None);
        let report = Discovery::new(&runtime.root, runtime.exclusions()).run(&mut project.dirs)?;
        log::info!("Proposed rules for {} top-level directories", report.added.len());
    }

    project.save(&config_path)?;
    log::info!("✔ Initialization complete. Created {}", config_path.display());
    log::info!("  1. Edit the file to configure extensions and inclusions.");
    log::info!("  2. Run 'codetext start' to generate your output file.");
    Ok(())
}

fn discover(dir: Option<&Path>, config_name: &str) -> Result<()> {
    let root = resolve_root(dir)?;
    let config_path = root.join(config_name);
    let mut project = ProjectConfig::load(&config_path)
        .context("Hint: run 'codetext init' to create a config")?;

    let defaults = load_user_defaults()?;
    let runtime = resolve_config(root, config_name, Some(&project), &defaults, None);
    let report = Discovery::new(&runtime.root, runtime.exclusions()).run(&mut project.dirs)?;

    if report.root_filled {
        log::info!("Filled root extensions");
    }
    for name in &report.added {
        log::info!("Added rule for {}", name);
    }
    if !report.root_filled && report.added.is_empty() {
        log::info!("Nothing new to add; existing rules left untouched");
        return Ok(());
    }

    project.save(&config_path)
}

fn start(dir: Option<&Path>, config_name: &str, output: Option<&Path>) -> Result<()> {
    let root = resolve_root(dir)?;
    let project = ProjectConfig::load(&root.join(config_name))
        .context("Hint: run 'codetext init' to create a config")?;
    let defaults = load_user_defaults()?;
    let runtime = resolve_config(root, config_name, Some(&project), &defaults, output);

    let file = File::create(&runtime.output_file)
        .with_context(|| format!("Failed to create {}", runtime.output_file.display()))?;
    let mut writer = BufWriter::new(file);

    log::info!(
        "Textifying {} -> {}",
        runtime.root.display(),
        runtime.output_file.display()
    );

    let scanner = Scanner::new(&runtime.root, &project.dirs, runtime.exclusions());
    let summary = scanner.write_to(&mut writer).context("Walk failed")?;
    writer.flush().context("Failed to flush output")?;

    if summary.files_emitted == 0 {
        log::warn!("⚠️ No content found for the configured rules.");
    }
    log::info!(
        "✔ Done! {} files, {} bytes ({} binary, {} unreadable skipped)",
        summary.files_emitted,
        summary.bytes_emitted,
        summary.binary_skipped,
        summary.unreadable_skipped
    );
    match OutputGenerator::count_words(&runtime.output_file) {
        Ok(words) => log::info!("Total Word Count: {}", words),
        Err(err) => log::warn!("Could not calculate word count: {}", err),
    }
    Ok(())
}
