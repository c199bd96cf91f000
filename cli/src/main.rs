//! wpadjust CLI - document page layout and font adjustment tool

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use crossbeam_channel::{bounded, RecvTimeoutError};
use indicatif::{ProgressBar, ProgressStyle};

use wpadjust::{
    adapter::ignored_settings, detect, DocumentFormat, DocumentMetadata, DocumentProperties,
    LineSpacingPreset, MarginSide, ModificationSettings, PagePreset,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "wpadjust")]
#[command(version)]
#[command(about = "Inspect and adjust page size, margins and fonts of DOCX and RTF documents", long_about = None)]
struct Cli {
    /// Document to inspect
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Enable debug logging
    #[arg(
        long,
        global = true,
        env = "APP_DEBUG",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document properties
    #[command(alias = "info")]
    Inspect {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print properties as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a modified copy of a document
    Apply {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        changes: ChangeArgs,

        /// Print the modified document's properties as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported extensions and media types
    Formats,

    /// Show version information
    Version,
}

/// Named page sizes accepted by `--page-size`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PageSizeArg {
    A4,
    Letter,
    Legal,
}

impl From<PageSizeArg> for PagePreset {
    fn from(arg: PageSizeArg) -> Self {
        match arg {
            PageSizeArg::A4 => PagePreset::A4,
            PageSizeArg::Letter => PagePreset::Letter,
            PageSizeArg::Legal => PagePreset::Legal,
        }
    }
}

/// Accepts a preset name (single, 1.15, 1.5, double) or any multiplier.
fn parse_line_spacing(value: &str) -> Result<f64, String> {
    if let Some(preset) = LineSpacingPreset::from_name(value) {
        return Ok(preset.multiplier());
    }
    value.trim().parse::<f64>().map_err(|_| {
        let names: Vec<&str> = LineSpacingPreset::ALL.iter().map(|p| p.name()).collect();
        format!("expected a number or one of: {}", names.join(", "))
    })
}

/// Requested changes. Flags override values loaded from `--settings`.
#[derive(Args, Debug, Default)]
struct ChangeArgs {
    /// JSON file with modification settings
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Named page size
    #[arg(long, value_enum, value_name = "NAME", conflicts_with_all = ["width", "height"])]
    page_size: Option<PageSizeArg>,

    /// Page width in inches
    #[arg(long, requires = "height")]
    width: Option<f64>,

    /// Page height in inches
    #[arg(long, requires = "width")]
    height: Option<f64>,

    /// Top margin in inches
    #[arg(long)]
    top: Option<f64>,

    /// Bottom margin in inches
    #[arg(long)]
    bottom: Option<f64>,

    /// Left margin in inches
    #[arg(long)]
    left: Option<f64>,

    /// Right margin in inches
    #[arg(long)]
    right: Option<f64>,

    /// Font family for every run
    #[arg(long, value_name = "FAMILY")]
    font: Option<String>,

    /// Font size in points (6-72)
    #[arg(long, value_name = "POINTS")]
    font_size: Option<f64>,

    /// Line spacing: single, 1.15, 1.5, double or a multiplier (0.5-5.0)
    #[arg(long, value_name = "SPACING", value_parser = parse_line_spacing)]
    line_spacing: Option<f64>,
}

impl ChangeArgs {
    fn into_settings(self) -> CliResult<ModificationSettings> {
        let base = match &self.settings {
            Some(path) => ModificationSettings::from_json(&fs::read_to_string(path)?)?,
            None => ModificationSettings::new(),
        };

        let mut flags = ModificationSettings::new();
        if let Some(preset) = self.page_size {
            flags = flags.with_page_preset(preset.into());
        }
        if let (Some(width), Some(height)) = (self.width, self.height) {
            flags = flags.with_page_size(width, height);
        }
        for (side, value) in [
            (MarginSide::Top, self.top),
            (MarginSide::Bottom, self.bottom),
            (MarginSide::Left, self.left),
            (MarginSide::Right, self.right),
        ] {
            if let Some(inches) = value {
                flags = flags.with_margin(side, inches);
            }
        }
        if let Some(family) = self.font {
            flags = flags.with_font_family(family);
        }
        if let Some(points) = self.font_size {
            flags = flags.with_font_size(points);
        }
        if let Some(multiplier) = self.line_spacing {
            flags = flags.with_line_spacing(multiplier);
        }

        Ok(base.merge(flags))
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command {
        Some(Commands::Inspect { input, json }) => cmd_inspect(&input, json),
        Some(Commands::Apply {
            input,
            changes,
            json,
        }) => cmd_apply(&input, changes, json),
        Some(Commands::Formats) => {
            cmd_formats();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: inspect if input is provided
            if let Some(input) = cli.input {
                cmd_inspect(&input, false)
            } else {
                println!("{}", "Usage: wpadjust <FILE>".yellow());
                println!("       wpadjust apply <FILE> [--top 1.0 ...]");
                println!("       wpadjust --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Run one engine call on its own worker thread while a spinner ticks.
fn run_in_worker<T, F>(message: &str, job: F) -> CliResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> wpadjust::Result<T> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    let worker = thread::spawn(move || {
        // The receiver only goes away if the main thread has already failed.
        let _ = tx.send(job());
    });

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());

    let outcome = loop {
        match rx.recv_timeout(Duration::from_millis(80)) {
            Ok(result) => break result,
            Err(RecvTimeoutError::Timeout) => pb.tick(),
            Err(RecvTimeoutError::Disconnected) => {
                pb.finish_and_clear();
                return Err("worker thread stopped without a result".into());
            }
        }
    };
    pb.finish_and_clear();
    worker
        .join()
        .map_err(|_| "worker thread panicked".to_string())?;

    Ok(outcome?)
}

fn inspect_in_worker(input: &Path) -> CliResult<DocumentMetadata> {
    detect::validate_file(input)?;
    let path = input.to_path_buf();
    run_in_worker("Reading document...", move || wpadjust::inspect(path))
}

fn cmd_inspect(input: &Path, json: bool) -> CliResult<()> {
    let metadata = inspect_in_worker(input)?;

    if json {
        println!("{}", to_json(&metadata)?);
    } else {
        print_overview(metadata.source_path(), metadata.format(), &metadata.properties);
    }
    Ok(())
}

fn cmd_apply(input: &Path, changes: ChangeArgs, json: bool) -> CliResult<()> {
    let settings = changes.into_settings()?;
    settings.validate()?;
    if settings.is_empty() {
        println!(
            "{}",
            "No changes requested; writing an unmodified copy.".yellow()
        );
    }

    let metadata = inspect_in_worker(input)?;
    if metadata.format() == DocumentFormat::ControlWord {
        let ignored = ignored_settings(&settings);
        if !ignored.is_empty() {
            println!(
                "{} {} cannot be changed in RTF documents and will be left as is",
                "Note:".yellow().bold(),
                ignored.join(", ")
            );
        }
    }

    let output = run_in_worker("Applying changes...", move || {
        wpadjust::apply(metadata, &settings)
    })?;
    println!("{} {}", "Saved to".green(), output.display());

    let modified = run_in_worker("Reading modified document...", {
        let output = output.clone();
        move || wpadjust::inspect(output)
    })?;

    if json {
        println!("{}", to_json(&modified)?);
    } else {
        println!();
        print_overview(modified.source_path(), modified.format(), &modified.properties);
    }
    Ok(())
}

fn to_json(metadata: &DocumentMetadata) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "path": metadata.source_path(),
        "format": metadata.format(),
        "page_preset": metadata.properties.page_dimensions.preset().map(PagePreset::name),
        "properties": &metadata.properties,
    }))
}

fn print_overview(path: &Path, format: DocumentFormat, props: &DocumentProperties) {
    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Title".bold(), props.title);
    println!("{}: {}", "Author".bold(), props.author);
    println!("{}: {}", "Type".bold(), format);
    println!(
        "{}: {}",
        "File".bold(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    println!();
    println!("{}", "Page Settings".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    let preset = props
        .page_dimensions
        .preset()
        .map(|preset| format!(" ({preset})"))
        .unwrap_or_default();
    println!(
        "{}: {:.2}″ × {:.2}″{}",
        "Size".bold(),
        props.page_dimensions.width,
        props.page_dimensions.height,
        preset.as_str().dimmed()
    );
    println!("{}:", "Margins".bold());
    println!("  {} Top: {:.1}″", "•".dimmed(), props.margins.top);
    println!("  {} Bottom: {:.1}″", "•".dimmed(), props.margins.bottom);
    println!("  {} Left: {:.1}″", "•".dimmed(), props.margins.left);
    println!("  {} Right: {:.1}″", "•".dimmed(), props.margins.right);

    println!();
    println!("{}", "Fonts Used".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    let fonts = props.fonts_by_usage();
    if fonts.is_empty() {
        println!("{}", "No font information available".dimmed());
    }
    for (name, count) in fonts {
        println!("{}: {} occurrences", name.bold(), count);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Words".bold(), props.word_count);
    println!("{}: {}", "Paragraphs".bold(), props.paragraph_count);
    println!("{}: {}", "Pages".bold(), props.page_count);
    println!("{}: {}", "Tables".bold(), props.table_count);
    if props.heading_total() > 0 {
        println!("{}:", "Headings".bold());
        for (level, count) in props.heading_counts.iter().filter(|(_, c)| *c > 0) {
            println!("  {} {}: {}", "•".dimmed(), level, count);
        }
    }
}

fn cmd_formats() {
    println!("{}", "Supported Formats".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for format in DocumentFormat::ALL {
        println!(
            "{} .{}  {}",
            format.to_string().bold(),
            format.extension(),
            format.media_types().join(", ").dimmed()
        );
    }
}

fn cmd_version() {
    println!("{} {}", "wpadjust".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document page layout and font adjustment tool");
    println!();
    println!("License: MIT");
}
