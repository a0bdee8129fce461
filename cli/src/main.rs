//! pdfharvest CLI - PDF text, table and OCR extraction tool

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfharvest::{
    Error, ImageExtractor, JsonFormat, PdfDocument, Pipeline, PipelineOptions, Result,
    ResultStore, RunStats, Stage, TesseractEngine,
};

const DEFAULT_OUTPUT_DIR: &str = "outputs";

#[derive(Parser)]
#[command(name = "pdfharvest")]
#[command(version)]
#[command(about = "Extract PDF text, tables and image OCR into JSON", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT_DIR")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a PDF and store the result as JSON
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        args: ExtractArgs,
    },

    /// Print a stored result
    Get {
        /// Name of the processed file (e.g. report.pdf)
        #[arg(value_name = "NAME")]
        name: String,

        /// Result directory
        #[arg(short, long, value_name = "DIR", env = "PDFHARVEST_OUTPUT_DIR")]
        dir: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args, Default)]
struct ExtractArgs {
    /// Result directory
    #[arg(short, long, value_name = "DIR", env = "PDFHARVEST_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Print the result instead of storing it
    #[arg(long)]
    stdout: bool,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,

    /// Fail on the first unreadable page
    #[arg(long)]
    strict: bool,

    /// Run OCR on all cores
    #[arg(long)]
    parallel: bool,

    /// Abort the whole run after SECS seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Abort OCR of one image after SECS seconds
    #[arg(long, value_name = "SECS")]
    ocr_timeout: Option<f64>,

    /// Path to the tesseract executable
    #[arg(long, value_name = "PATH", env = "PDFHARVEST_TESSERACT")]
    tesseract: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract { input, args }) => cmd_extract(&input, &args),
        Some(Commands::Get { name, dir }) => cmd_get(&name, dir),
        Some(Commands::Info { input, json }) => cmd_info(&input, json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: extract if input is provided
            if let Some(input) = cli.input {
                let args = ExtractArgs {
                    output: cli.output,
                    ..Default::default()
                };
                cmd_extract(&input, &args)
            } else {
                println!("{}", "Usage: pdfharvest <FILE> [OUTPUT_DIR]".yellow());
                println!("       pdfharvest --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!(
            "{} [{}]: {}",
            "Error".red().bold(),
            e.kind().as_str(),
            e
        );
        std::process::exit(1);
    }
}

fn cmd_extract(input: &Path, args: &ExtractArgs) -> Result<()> {
    let name = source_name(input)?;
    let engine = engine_for(args)?;
    let options = options_for(args)?;
    let format = if args.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Opening PDF...");
    let doc = PdfDocument::open(input).inspect_err(|_| pb.finish_and_clear())?;

    let pipeline = Pipeline::new(engine).with_options(options);
    let report = pipeline
        .run_observed(&doc, |stage| pb.set_message(stage_message(stage)))
        .inspect_err(|_| pb.finish_and_clear())?;
    pb.finish_and_clear();

    let json = pdfharvest::render::to_json(&report.result, format)?;
    if args.stdout {
        println!("{}", json);
        return Ok(());
    }

    let store = ResultStore::new(output_dir(args.output.clone()));
    let path = store.save(name, &report.result, format)?;

    println!("{} {}", "Saved to".green(), path.display());
    print_stats(&report.stats);
    Ok(())
}

fn cmd_get(name: &str, dir: Option<PathBuf>) -> Result<()> {
    let store = ResultStore::new(output_dir(dir));
    println!("{}", store.load(name)?);
    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> Result<()> {
    let doc = PdfDocument::open(input)?;
    let info = doc.info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), info.pdf_version);
    println!("{}: {}", "Pages".bold(), info.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if info.encrypted { "Yes" } else { "No" }
    );
    println!("{}: {}", "Title".bold(), info.display_title());

    if let Some(ref author) = info.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = info.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = info.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = info.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = info.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let images = ImageExtractor::new().count(&doc);
    println!("{}: {}", "Images".bold(), images);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfharvest".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF text, table and OCR extraction tool");
    println!();
    println!("OCR engine: {}", "tesseract (external program)".dimmed());
    println!("License: MIT");
}

fn print_stats(stats: &RunStats) {
    println!("\n{}", "Run summary:".green().bold());
    println!("  {} pages visited: {}", "├─".dimmed(), stats.pages_visited);
    println!("  {} tables found: {}", "├─".dimmed(), stats.tables_found);
    println!(
        "  {} images decoded: {} ({} skipped)",
        "├─".dimmed(),
        stats.images_decoded,
        stats.images_skipped
    );
    println!("  {} images recognized: {}", "├─".dimmed(), stats.images_recognized);
    println!(
        "  {} elapsed: {:.2}s",
        "└─".dimmed(),
        stats.elapsed.as_secs_f64()
    );
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Start => "Extracting text and tables...",
        Stage::TextExtracted => "Extracting images...",
        Stage::ImagesExtracted => "Running OCR...",
        Stage::OcrApplied => "Assembling result...",
        Stage::Assembled => "Done",
    }
}

/// The uploaded file's name, used as the store key.
fn source_name(input: &Path) -> Result<&str> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidName(input.display().to_string()))
}

fn output_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

fn engine_for(args: &ExtractArgs) -> Result<TesseractEngine> {
    let mut engine = TesseractEngine::new();
    if let Some(ref binary) = args.tesseract {
        engine = engine.with_binary(binary);
    }
    if let Some(secs) = args.ocr_timeout {
        engine = engine.with_timeout(seconds(secs, "--ocr-timeout")?);
    }
    Ok(engine)
}

fn options_for(args: &ExtractArgs) -> Result<PipelineOptions> {
    let mut options = PipelineOptions::new().with_parallel(args.parallel);
    if args.strict {
        options = options.strict();
    }
    if let Some(secs) = args.timeout {
        options = options.with_deadline(seconds(secs, "--timeout")?);
    }
    Ok(options)
}

fn seconds(secs: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} expects a non-negative number of seconds, got {}", flag, secs),
        ))
    })
}
