//! CLI entry point for the pathway progress tool.
//!
//! Provides subcommands for building the enriched student table, exporting
//! course sequences for the pattern miner, running the miner, and measuring
//! how many semesters a course sequence spans.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pathway_progress::config::PipelineConfig;
use pathway_progress::export::{ExportOptions, export_sequences, sequence_spans};
use pathway_progress::merge::Scope;
use pathway_progress::miner::{DEFAULT_ALGORITHM, MiningRequest, SpmfMiner, mine_patterns};
use pathway_progress::output::{write_diagnostics, write_student_table};
use pathway_progress::pipeline;
use pathway_progress::terms::Season;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "pathway_progress")]
#[command(about = "Builds longitudinal course records and pathway progress for Metro cohorts", long_about = None)]
struct Cli {
    /// JSON config file (falls back to PATHWAY_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all sources and write the student table with progress columns
    Process {
        /// Students to include
        #[arg(long, value_enum, default_value_t = Scope::Combined)]
        scope: Scope,

        /// CSV file to write the student table to
        #[arg(short, long, default_value = "students.csv")]
        output: PathBuf,

        /// Optional: JSON file to write run diagnostics to
        #[arg(long)]
        diagnostics: Option<PathBuf>,
    },
    /// Write course sequences in the pattern miner's input format
    Export {
        /// Sequence file; labels go to the same name with `_labels.txt`
        #[arg(short, long, default_value = "spmf/spmf_input.txt")]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = Scope::Combined)]
        scope: Scope,

        /// Cohort years to include, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        cohort_years: Vec<i32>,

        /// Only include passed courses
        #[arg(long, default_value_t = false)]
        passing_only: bool,

        /// Seasons visited when capturing gaps
        #[arg(long, value_enum, value_delimiter = ',', default_values_t = [Season::Fall, Season::Spring])]
        seasons: Vec<Season>,

        /// Emit GAP for semesters without courses
        #[arg(long, default_value_t = false)]
        capture_gaps: bool,

        /// Only export comparison students
        #[arg(long, default_value_t = false)]
        comp_only: bool,
    },
    /// Run the sequential pattern miner over an exported sequence file
    Mine {
        /// Path to the SPMF jar
        #[arg(long)]
        jar: PathBuf,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Minimum support as a proportion (0.4) or a percentage (40%)
        #[arg(long, default_value = "0.5")]
        min_support: String,

        #[arg(long, default_value = DEFAULT_ALGORITHM)]
        algorithm: String,

        /// Optional: java executable to use
        #[arg(long)]
        java: Option<PathBuf>,

        /// Extra algorithm arguments
        #[arg(last = true)]
        extra_args: Vec<String>,
    },
    /// Count the semesters spanned by an ordered list of courses in a sequence file
    Spans {
        #[arg(short, long)]
        input: PathBuf,

        /// Courses in the order they must be taken
        #[arg(required = true, num_args = 1..)]
        courses: Vec<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            scope,
            output,
            diagnostics,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let run = pipeline::run(&config, scope)?;

            write_student_table(&output, &run.table)?;
            info!(path = %output.display(), rows = run.table.len(), "Student table written");

            if let Some(path) = diagnostics {
                write_diagnostics(&path, &run.diagnostics())?;
                info!(path = %path.display(), "Diagnostics written");
            }
        }
        Commands::Export {
            output,
            scope,
            cohort_years,
            passing_only,
            seasons,
            capture_gaps,
            comp_only,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let run = pipeline::run(&config, scope)?;

            let options = ExportOptions {
                cohort_years: cohort_years.into_iter().collect(),
                passing_only,
                seasons: seasons.into_iter().collect(),
                capture_gaps,
                comp_only,
            };
            let summary = export_sequences(&run.table, &run.timelines, &options, &output)?;
            info!(
                sequences = summary.sequences,
                empty = summary.empty,
                labels = %summary.labels_path.display(),
                "Export finished"
            );
        }
        Commands::Mine {
            jar,
            input,
            output,
            min_support,
            algorithm,
            java,
            extra_args,
        } => {
            let mut miner = SpmfMiner::new(jar);
            if let Some(java) = java {
                miner = miner.with_java(java);
            }
            let request = MiningRequest {
                input,
                output,
                min_support,
                algorithm,
                extra_args,
            };

            let patterns = mine_patterns(&miner, &request)?;
            let longest = patterns.iter().map(|p| p.len()).max().unwrap_or(0);
            info!(patterns = patterns.len(), longest, "Patterns mined");
        }
        Commands::Spans { input, courses } => {
            let spans = sequence_spans(&input, &courses)?;

            let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
            for span in &spans {
                *distribution.entry(*span).or_default() += 1;
            }
            for (span, count) in &distribution {
                debug!(span, count, "Span");
            }
            info!(matches = spans.len(), ?distribution, "Sequence spans");
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/pathway_progress.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("pathway_progress.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Resolves the run config: `--config`, then `PATHWAY_CONFIG`, then defaults.
/// `PATHWAY_DATA_DIR` overrides the data directory in every case.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("PATHWAY_CONFIG").ok().map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            PipelineConfig::load(&path)?
        }
        None => PipelineConfig::default(),
    };

    if let Ok(data_dir) = std::env::var("PATHWAY_DATA_DIR") {
        config = config.with_data_dir(data_dir);
    }
    debug!(data_dir = %config.data_dir.display(), "Config resolved");
    Ok(config)
}
