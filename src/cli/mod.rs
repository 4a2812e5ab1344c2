//! # CLI Module
//!
//! Command-line interface for the defect inspector.
//!
//! ## Usage
//! ```bash
//! # Compare gradient histograms against the default reference
//! defect-inspect hog images/
//!
//! # Embedding similarity with a custom threshold
//! defect-inspect embedding images/ --weights resnet18.safetensors --threshold 0.99
//!
//! # Print the similarity of every candidate
//! defect-inspect report images/ --weights resnet18.safetensors
//!
//! # JSON output
//! defect-inspect harris images/ --output json
//! ```

use candle_core::Device;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use defect_inspector::core::comparator::{
    AllCloseRule, CosineThresholdRule, KeypointPresenceRule, Tolerance,
};
use defect_inspector::core::features::{
    EmbeddingConfig, HarrisConfig, HarrisExtractor, HogConfig, HogExtractor, KeypointConfig,
    KeypointExtractor, ResnetDepth, ResnetEmbedder,
};
use defect_inspector::core::pipeline::{
    basename, inspect_against_reference, inspect_each, report_resnet_similarity, Batch,
    InspectionResult,
};
use defect_inspector::core::scanner::{expand_paths, ScanConfig};
use defect_inspector::error::{InspectorError, Result};
use defect_inspector::events::{Event, EventChannel, EventReceiver, EventSender, InspectEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Defect Inspector - flag product photos that deviate from a reference
#[derive(Parser, Debug)]
#[command(name = "defect-inspect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Flag candidates whose ResNet embedding is not similar enough to the reference
    Embedding {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Cosine similarity below which a candidate is a defect (-1 to 1)
        #[arg(
            short,
            long,
            default_value_t = CosineThresholdRule::DEFAULT_THRESHOLD,
            allow_negative_numbers = true
        )]
        threshold: f32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the embedding similarity of every candidate to the reference
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Flag candidates whose leading gradient-histogram bins differ from the reference
    Hog {
        #[command(flatten)]
        input: InputArgs,

        /// Cell edge length in pixels
        #[arg(long, default_value_t = 8)]
        cell_size: usize,

        /// Orientation bins per cell
        #[arg(long, default_value_t = 9)]
        bins: usize,

        /// Number of leading descriptor entries compared
        #[arg(long, default_value_t = 10)]
        signature_len: usize,

        #[command(flatten)]
        tolerance: ToleranceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Flag candidates whose Harris corner-response map differs from the reference
    Harris {
        #[command(flatten)]
        input: InputArgs,

        /// Structure-tensor window edge length
        #[arg(long, default_value_t = 3)]
        window_size: usize,

        /// Harris sensitivity k
        #[arg(long, default_value_t = 0.04)]
        sensitivity: f64,

        #[command(flatten)]
        tolerance: ToleranceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Flag every image that has at least one scale-space keypoint
    Sift {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Include hidden files when expanding directories
        #[arg(long)]
        include_hidden: bool,

        /// Minimum keypoint contrast
        #[arg(long, default_value_t = 0.04)]
        contrast_threshold: f64,

        /// Maximum principal curvature ratio
        #[arg(long, default_value_t = 10.0)]
        edge_threshold: f64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Image files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Reference image the candidates are compared against
    #[arg(short, long, default_value = "images/reference.jpg")]
    reference: PathBuf,

    /// Include hidden files when expanding directories
    #[arg(long)]
    include_hidden: bool,
}

impl InputArgs {
    fn expand(&self) -> Result<Vec<PathBuf>> {
        expand_listing(&self.paths, self.include_hidden)
    }
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// ResNet weights in safetensors format
    #[arg(short, long)]
    weights: PathBuf,

    /// Network depth
    #[arg(long, default_value = "resnet18")]
    depth: Depth,
}

impl ModelArgs {
    fn load(&self) -> Result<ResnetEmbedder> {
        let config = EmbeddingConfig::new().depth(self.depth.into());
        Ok(ResnetEmbedder::load(&self.weights, config, Device::Cpu)?)
    }
}

#[derive(Args, Debug)]
struct ToleranceArgs {
    /// Relative tolerance of the closeness test
    #[arg(long, default_value_t = 1e-5)]
    rtol: f64,

    /// Absolute tolerance of the closeness test
    #[arg(long, default_value_t = 1e-8)]
    atol: f64,
}

impl From<&ToleranceArgs> for Tolerance {
    fn from(args: &ToleranceArgs) -> Self {
        Tolerance::new(args.rtol, args.atol)
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Depth {
    /// ResNet-18
    Resnet18,
    /// ResNet-34
    Resnet34,
}

impl From<Depth> for ResnetDepth {
    fn from(depth: Depth) -> Self {
        match depth {
            Depth::Resnet18 => ResnetDepth::Resnet18,
            Depth::Resnet34 => ResnetDepth::Resnet34,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (defect names only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Embedding {
            input,
            model,
            threshold,
            output,
        } => {
            defect_inspector::init_tracing(log_level(output.verbose));
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(InspectorError::Config(format!(
                    "threshold {} is outside [-1, 1]",
                    threshold
                )));
            }

            let paths = input.expand()?;
            let embedder = model.load()?;
            let batch = Batch::new(&paths, &input.reference);
            let rule = CosineThresholdRule::new(threshold);
            run_inspection(&output, |events| {
                inspect_against_reference(&embedder, &rule, &batch, events)
            })
        }

        Commands::Report {
            input,
            model,
            verbose,
        } => {
            defect_inspector::init_tracing(log_level(verbose));
            let paths = input.expand()?;
            let embedder = model.load()?;

            let (sender, receiver) = EventChannel::new();
            let listener = spawn_listener(receiver, None, false);
            let result = report_resnet_similarity(&embedder, &paths, &input.reference, &sender);
            drop(sender);
            listener.join().ok();
            result
        }

        Commands::Hog {
            input,
            cell_size,
            bins,
            signature_len,
            tolerance,
            output,
        } => {
            defect_inspector::init_tracing(log_level(output.verbose));
            let paths = input.expand()?;
            let batch = Batch::from_listing(&paths, &input.reference)?;
            let extractor = HogExtractor::new(
                HogConfig::new()
                    .cell_size(cell_size)
                    .bins(bins)
                    .signature_len(signature_len),
            );
            let rule = AllCloseRule::new((&tolerance).into());
            run_inspection(&output, |events| {
                inspect_against_reference(&extractor, &rule, &batch, events)
            })
        }

        Commands::Harris {
            input,
            window_size,
            sensitivity,
            tolerance,
            output,
        } => {
            defect_inspector::init_tracing(log_level(output.verbose));
            let paths = input.expand()?;
            let batch = Batch::from_listing(&paths, &input.reference)?;
            let extractor = HarrisExtractor::new(
                HarrisConfig::new()
                    .window_size(window_size)
                    .sensitivity(sensitivity),
            );
            let rule = AllCloseRule::new((&tolerance).into());
            run_inspection(&output, |events| {
                inspect_against_reference(&extractor, &rule, &batch, events)
            })
        }

        Commands::Sift {
            paths,
            include_hidden,
            contrast_threshold,
            edge_threshold,
            output,
        } => {
            defect_inspector::init_tracing(log_level(output.verbose));
            let paths = expand_listing(&paths, include_hidden)?;
            let extractor = KeypointExtractor::new(
                KeypointConfig::new()
                    .contrast_threshold(contrast_threshold)
                    .edge_threshold(edge_threshold),
            );
            run_inspection(&output, |events| {
                inspect_each(&extractor, &KeypointPresenceRule, &paths, events)
            })
        }
    }
}

fn log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn expand_listing(paths: &[PathBuf], include_hidden: bool) -> Result<Vec<PathBuf>> {
    let config = ScanConfig {
        include_hidden,
        ..ScanConfig::default()
    };
    Ok(expand_paths(paths, &config)?)
}

/// Run an inspection with a listener thread, then print the result.
fn run_inspection<F>(output: &OutputArgs, inspect: F) -> Result<()>
where
    F: FnOnce(&EventSender) -> Result<InspectionResult>,
{
    let term = Term::stderr();

    if output.output == OutputFormat::Pretty {
        term.write_line(&format!(
            "{} {}",
            style("Defect Inspector").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let progress = (output.output == OutputFormat::Pretty).then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    });

    let (sender, receiver) = EventChannel::new();
    let listener = spawn_listener(receiver, progress, output.verbose);

    let result = inspect(&sender);

    // Drop sender to signal the listener to finish
    drop(sender);
    listener.join().ok();

    let result = result?;
    match output.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, output.verbose),
        OutputFormat::Json => print_json_results(&result),
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn spawn_listener(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
    verbose: bool,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Inspect(InspectEvent::Started {
                    analyzer,
                    total_candidates,
                }) => {
                    if let Some(ref pb) = progress {
                        pb.set_length(total_candidates as u64);
                        pb.set_message(analyzer.to_string());
                    }
                }
                Event::Inspect(InspectEvent::Progress(p)) => {
                    if let Some(ref pb) = progress {
                        pb.set_position(p.completed as u64);
                        if verbose {
                            pb.set_message(basename(&p.current_path));
                        }
                    }
                }
                Event::Inspect(InspectEvent::Completed { .. }) => {
                    if let Some(ref pb) = progress {
                        pb.finish_and_clear();
                    }
                }
                Event::Report(report) => match progress {
                    Some(ref pb) => pb.println(report.to_string()),
                    None => println!("{}", report),
                },
                Event::Inspect(InspectEvent::ReferenceExtracted { .. }) => {}
            }
        }
    })
}

fn print_pretty_results(term: &Term, result: &InspectionResult, verbose: bool) {
    term.write_line(&format!(
        "{} {} inspection complete",
        style("✓").green().bold(),
        result.analyzer
    ))
    .ok();
    term.write_line(&format!("  {}", style(result.analyzer.description()).dim()))
        .ok();
    term.write_line("").ok();

    if let Some(ref reference) = result.reference {
        term.write_line(&format!("  Reference: {}", display_path(reference)))
            .ok();
    }
    term.write_line(&format!(
        "  {} candidates judged in {:.1}s",
        style(result.verdicts.len()).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} defects",
        style(result.defect_count()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    for verdict in &result.verdicts {
        if !verbose && !verdict.is_defect {
            continue;
        }
        let marker = if verdict.is_defect {
            style("✗ defect").red().bold().to_string()
        } else {
            style("✓ ok").green().to_string()
        };
        term.write_line(&format!(
            "  {:<10} {} {}",
            marker,
            display_path(&verdict.path),
            style(format!("(score {:.6})", verdict.score)).dim()
        ))
        .ok();
    }

    if result.defect_count() == 0 {
        term.write_line(&format!("  {} No defects found", style("✓").green()))
            .ok();
    }
}

fn print_json_results(result: &InspectionResult) {
    let output = serde_json::json!({
        "analyzer": result.analyzer,
        "reference": result.reference,
        "verdicts": result.verdicts,
        "defects": result.defect_names(),
        "defect_count": result.defect_count(),
        "duration_ms": result.duration_ms,
    });

    println!("{:#}", output);
}

fn print_minimal_results(result: &InspectionResult) {
    for name in result.defect_names() {
        println!("{}", name);
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
