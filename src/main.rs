//! txt2epub - web novel folder to EPUB converter

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use txt2epub::{EpubConfig, NovelFolder, convert};

#[derive(Parser)]
#[command(name = "txt2epub")]
#[command(version, about = "Convert a web novel folder into an EPUB 3 book", long_about = None)]
#[command(after_help = "EXAMPLES:
    txt2epub novels/n0001aa             Write the book next to its sources
    txt2epub novels/n0001aa -o books    Write the book into books/")]
struct Cli {
    /// Novel folder containing summary.json and the section files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (defaults to the input folder)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Deflate compression level
    #[arg(short = 'l', long, value_name = "N", default_value_t = 9,
          value_parser = clap::value_parser!(i64).range(0..=9))]
    level: i64,

    /// Book language tag
    #[arg(long, value_name = "TAG", default_value = "ja")]
    language: String,

    /// Replace the built-in stylesheet
    #[arg(long, value_name = "FILE")]
    stylesheet: Option<PathBuf>,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Report per-section progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.quiet {
        "txt2epub=warn"
    } else if cli.verbose {
        "txt2epub=debug"
    } else {
        "txt2epub=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> txt2epub::Result<()> {
    let mut config = EpubConfig::default()
        .with_compression_level(cli.level)
        .with_language(&cli.language);
    if let Some(path) = &cli.stylesheet {
        config = config.with_stylesheet(fs::read_to_string(path)?);
    }

    let folder = NovelFolder::open(&cli.input)?;
    let output = cli.output.as_deref().unwrap_or(folder.root());
    let (path, summary) = convert(&folder, output, &config)?;

    if !cli.quiet {
        println!(
            "{} ({} sections, {} images)",
            path.display(),
            summary.sections,
            summary.images
        );
    }
    Ok(())
}
