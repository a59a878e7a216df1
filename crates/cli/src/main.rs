mod echo;

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use rolemark_core::{LabelConfig, LabelEngine, LabelRewriter, LabelStats, LabelSummary, StatsSnapshot};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use echo::{
    format_size, print_banner, print_counters, print_info, print_label_details, print_step, print_success, print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Label HTML elements with mobile layout roles
#[derive(Parser, Debug)]
#[command(name = "rolemark")]
#[command(author = "Rolemark Contributors")]
#[command(version)]
#[command(about = "Label HTML elements with mobile layout roles", long_about = None)]
struct Args {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON configuration file (default: the user config file, if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Follow each analyzed element with a debug comment
    #[arg(long)]
    debug_comments: bool,

    /// Class overrides, e.g. "topmenu,-ads"
    #[arg(long, value_name = "LIST")]
    nav_classes: Option<String>,

    /// Ignore class overrides
    #[arg(long)]
    client_side_nav: bool,

    /// Prefix for synthesized identifiers
    #[arg(long, value_name = "PREFIX")]
    id_prefix: Option<String>,

    /// Pass the document through unchanged
    #[arg(long)]
    disable: bool,

    /// Stream the input in chunks, flushing after each
    #[arg(long, value_name = "BYTES", value_parser = clap::value_parser!(u64).range(1..))]
    chunk_size: Option<u64>,

    /// Write a JSON labeling report ("-" for stderr)
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// JSON report written with `--report`.
#[derive(Serialize)]
struct Report<'a> {
    summary: &'a LabelSummary,
    counters: StatsSnapshot,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "rolemark_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<LabelConfig> {
    let mut config = match &args.config {
        Some(path) => LabelConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => LabelConfig::load_default().context("Failed to load default config")?,
    };

    if args.debug_comments {
        config.verbose = true;
    }
    if let Some(classes) = &args.nav_classes {
        config.nav_classes = classes.clone();
    }
    if args.client_side_nav {
        config.server_side_nav = false;
    }
    if let Some(prefix) = &args.id_prefix {
        config.id_prefix = prefix.clone();
    }
    if args.disable {
        config.enabled = false;
    }
    Ok(config)
}

fn read_input(input: &str) -> anyhow::Result<Vec<u8>> {
    if input == "-" {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn write_report(path: &Path, report: &Report<'_>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    if path == Path::new("-") {
        eprintln!("{}", json);
    } else {
        fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let config = load_config(&args)?;

    if args.verbose {
        let source = if args.input == "-" { "stdin".to_string() } else { args.input.bright_white().to_string() };
        print_step(1, 3, &format!("Reading from {}", source));
    }
    let html = read_input(&args.input)?;
    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
        eprintln!();
        print_step(2, 3, "Labeling document");
    }

    let stats = Arc::new(LabelStats::new());
    let engine = LabelEngine::new(config, stats.clone());
    let mut rewriter = LabelRewriter::new(engine, open_output(args.output.as_deref())?);

    match args.chunk_size {
        Some(size) => {
            let size = usize::try_from(size).unwrap_or(usize::MAX);
            for chunk in html.chunks(size) {
                rewriter.write(chunk).context("Failed to label document")?;
                rewriter.flush().context("Failed to write output")?;
            }
        }
        None => rewriter.write(&html).context("Failed to label document")?,
    }
    let (mut out, summary) = rewriter.end().context("Failed to finish document")?;
    out.flush().context("Failed to write output")?;
    drop(out);

    if args.verbose {
        print_label_details(&summary);
        if summary.labeled == 0 {
            print_warning("No elements labeled");
        }
        print_counters(&stats.snapshot());
        eprintln!();
        print_step(3, 3, "Writing output");
    }

    if let Some(path) = &args.report {
        write_report(path, &Report { summary: &summary, counters: stats.snapshot() })?;
    }

    if let Some(path) = &args.output {
        print_success(&format!("Output written to {}", path.display().bright_white()));
    }

    Ok(())
}
