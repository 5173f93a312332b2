//! CLI application for template-driven invoice data extraction.

mod output;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

use invex_core::{Config, ExtractedFields, Template, actions, input, loader, resolve};
use output::OutputFormat;

/// Extract structured data from invoices using declarative YAML templates
#[derive(Parser)]
#[command(name = "invex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input files or glob patterns
    #[arg(required = true)]
    input_files: Vec<String>,

    /// Output format for the accumulated results
    #[arg(long, value_enum, default_value = "none")]
    output_format: OutputFormat,

    /// Base name for the output file; the extension follows the format
    #[arg(short = 'o', long, default_value = "invoices-output")]
    output_name: String,

    /// Date format for output files and formatted filenames [default: %Y-%m-%d]
    #[arg(long)]
    output_date_format: Option<String>,

    /// Folder with additional templates, tried before the built-in set
    #[arg(short = 't', long)]
    template_folder: Option<PathBuf>,

    /// Do not load the built-in template set
    #[arg(long)]
    exclude_built_in_templates: bool,

    /// Force a template by name, skipping the keyword match
    #[arg(long)]
    template: Option<String>,

    /// Copy renamed source files into this folder
    #[arg(short = 'c', long)]
    copy: Option<PathBuf>,

    /// Move renamed source files into this folder
    #[arg(short = 'm', long = "move")]
    move_to: Option<PathBuf>,

    /// Filename pattern for copied or moved files
    /// [default: {date} {invoice_number} {desc}.pdf]
    #[arg(long)]
    filename_format: Option<String>,

    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let date_format = cli
        .output_date_format
        .clone()
        .unwrap_or_else(|| config.output.date_format.clone());
    let filename_format = cli
        .filename_format
        .clone()
        .unwrap_or_else(|| config.output.filename_format.clone());

    // Template problems are startup-fatal: processing a batch against a
    // partial template set would misclassify files silently.
    let templates = load_templates(&cli, &config)?;
    anyhow::ensure!(!templates.is_empty(), "no templates loaded");
    debug!("loaded {} templates", templates.len());

    let forced = match &cli.template {
        Some(name) => Some(find_template(&templates, name)?),
        None => None,
    };

    let files = expand_inputs(&cli.input_files)?;
    println!(
        "{} Processing {} files against {} templates",
        style("ℹ").blue(),
        files.len(),
        templates.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut records: Vec<ExtractedFields> = Vec::new();
    let mut failures: Vec<(PathBuf, String)> = Vec::new();

    for path in &files {
        if let Err(e) = process_file(
            path,
            &templates,
            forced,
            &cli,
            &filename_format,
            &date_format,
            &mut records,
        ) {
            error!("{}: {e:#}", path.display());
            failures.push((path.clone(), format!("{e:#}")));
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if let Some(written) =
        output::write_records(&records, cli.output_format, &cli.output_name, &date_format)?
    {
        println!(
            "{} Results written to {}",
            style("✓").green(),
            written.display()
        );
    }

    println!(
        "{} Processed {} files: {} extracted, {} failed",
        style("✓").green(),
        files.len(),
        records.len(),
        failures.len()
    );

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, reason) in &failures {
            println!("  - {}: {}", path.display(), reason);
        }
        anyhow::bail!("{} of {} input files failed", failures.len(), files.len());
    }

    Ok(())
}

/// Process one input file; failures are file-local and reported by the caller.
fn process_file(
    path: &Path,
    templates: &[Template],
    forced: Option<&Template>,
    cli: &Cli,
    filename_format: &str,
    date_format: &str,
    records: &mut Vec<ExtractedFields>,
) -> anyhow::Result<()> {
    let extractor = input::for_path(path)?;
    let text = extractor.extract_text(path)?;
    anyhow::ensure!(!text.trim().is_empty(), "no text extracted");

    let Some(resolution) = resolve(&text, templates, forced) else {
        anyhow::bail!("no template matched");
    };
    debug!(
        "{}: template {} extracted {} fields",
        path.display(),
        resolution.template.name,
        resolution.fields.len()
    );

    records.push(resolution.fields.clone());

    if cli.copy.is_some() || cli.move_to.is_some() {
        let name = actions::format_filename(filename_format, &resolution.fields, date_format)?;
        if let Some(dir) = &cli.copy {
            actions::copy_renamed(path, dir, &name)?;
        }
        if let Some(dir) = &cli.move_to {
            actions::move_renamed(path, dir, &name)?;
        }
    }

    Ok(())
}

/// Load external templates first, then the built-in set.
///
/// External templates come before built-ins in the list, so they win
/// first-match resolution against them.
fn load_templates(cli: &Cli, config: &Config) -> anyhow::Result<Vec<Template>> {
    let mut templates = Vec::new();

    if let Some(folder) = &cli.template_folder {
        templates.extend(
            loader::load(folder)
                .with_context(|| format!("loading templates from {}", folder.display()))?,
        );
    }

    if !cli.exclude_built_in_templates {
        let dir = builtin_template_dir(config)?;
        templates.extend(
            loader::load(&dir)
                .with_context(|| format!("loading built-in templates from {}", dir.display()))?,
        );
    }

    Ok(templates)
}

/// Resolve the built-in template directory once, at startup.
fn builtin_template_dir(config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &config.templates.builtin_dir {
        return Ok(dir.clone());
    }
    if let Ok(dir) = std::env::var("INVEX_TEMPLATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("invex").join("templates"))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no built-in template location; set INVEX_TEMPLATE_DIR or pass --exclude-built-in-templates"
            )
        })
}

fn find_template<'t>(templates: &'t [Template], name: &str) -> anyhow::Result<&'t Template> {
    templates
        .iter()
        .find(|t| t.name == name || t.name == format!("{name}.yml"))
        .ok_or_else(|| anyhow::anyhow!("template {name} not found in the loaded set"))
}

/// Expand input arguments: literal paths as-is, otherwise glob patterns.
fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = PathBuf::from(pattern);
        if path.exists() {
            files.push(path);
            continue;
        }

        let mut matched = false;
        for entry in glob::glob(pattern)
            .with_context(|| format!("invalid input pattern {pattern}"))?
        {
            files.push(entry?);
            matched = true;
        }
        anyhow::ensure!(matched, "no files match {pattern}");
    }
    Ok(files)
}
