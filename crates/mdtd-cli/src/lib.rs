//! mdtd: analyze source files and synthesize MDTD test scenarios.
//!
//! `mdtd analyze <PATH>` prints the per-file output contract (JSON) or a
//! run summary. Exit codes: 0 success, 1 parse failures with
//! `--fail-on-parse-failure`, 2 configuration, scan or output errors.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mdtd_analysis::parsers::AdapterRegistry;
use mdtd_analysis::AnalysisCoordinator;
use mdtd_core::config::{CliOverrides, MdtdConfig};
use mdtd_core::errors::MdtdErrorCode;

mod error;
mod output;

pub use error::{CliError, CliResult};
pub use output::OutputFormat;

pub const EXIT_OK: u8 = 0;
pub const EXIT_PARSE_FAILURES: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "mdtd")]
#[command(about = "Model-driven test scenarios from source code", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a file or directory and synthesize test scenarios
    Analyze(AnalyzeArgs),

    /// List supported languages and their file extensions
    Languages {
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// File or directory to analyze
    path: PathBuf,

    /// Glob of paths to leave out (repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Configuration file used instead of <PATH>/mdtd.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ceiling on equivalence combinations per unit
    #[arg(long, value_name = "N")]
    max_combinations: Option<usize>,

    /// Comma-separated scenario categories to generate
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    categories: Option<Vec<String>>,

    /// Language to skip (repeatable)
    #[arg(long = "disable-language", value_name = "LANG")]
    disable_language: Vec<String>,

    /// Worker threads (0 = one per core)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Also synthesize units recovered from files with syntax errors
    #[arg(long)]
    synthesize_partial: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Exit with 1 when any file fails to parse
    #[arg(long)]
    fail_on_parse_failure: bool,
}

/// Run with the process arguments, writing to stdout.
pub fn run() -> u8 {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_args(std::env::args_os(), &mut out)
}

/// Run with `args`, writing results to `out`. Returns the exit code.
pub fn run_with_args<I, T>(args: I, out: &mut dyn Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { EXIT_FATAL } else { EXIT_OK };
        }
    };
    mdtd_core::tracing::init_tracing_with_filter(if cli.verbose { "mdtd=debug" } else { "mdtd=warn" });

    let result = match cli.command {
        Commands::Analyze(args) => analyze(args, out),
        Commands::Languages { format } => {
            output::write_languages(out, &AdapterRegistry::with_defaults(), format).map(|()| EXIT_OK)
        }
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.coded_message());
            EXIT_FATAL
        }
    }
}

fn analyze(args: AnalyzeArgs, out: &mut dyn Write) -> CliResult<u8> {
    let overrides = CliOverrides {
        max_combinations_per_unit: args.max_combinations,
        enabled_categories: args.categories,
        disabled_languages: args.disable_language,
        exclude: args.exclude,
        scan_threads: args.threads,
        synthesize_partial: args.synthesize_partial.then_some(true),
    };
    let config = MdtdConfig::load_from(&args.path, args.config.as_deref(), Some(&overrides))?;
    let run = AnalysisCoordinator::run(&config, &args.path)?;
    output::write_run(out, &run, args.format)?;

    if args.fail_on_parse_failure && run.summary.has_failures() {
        tracing::warn!(failed = run.summary.files_failed, "parse failures present");
        return Ok(EXIT_PARSE_FAILURES);
    }
    Ok(EXIT_OK)
}
