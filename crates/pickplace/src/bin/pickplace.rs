//! pickplace CLI: plan pickup and drop-off poses for one camera frame.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pickplace::{JobConfig, JobReport};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pickplace")]
#[command(about = "Match detected parts to templates and plan robot pick-and-place moves")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one frame of a job file through the engine.
    Plan(PlanArgs),

    /// Write a runnable sample job.
    ExampleJob {
        /// Path of the job file to create.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct PlanArgs {
    /// Job file (JSON).
    #[arg(long)]
    job: PathBuf,

    /// Where to write the report (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Log verbosity on stderr.
    #[arg(long, value_enum, default_value_t = LogLevelArg::Info)]
    log_level: LogLevelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Off => LevelFilter::Off,
            LogLevelArg::Error => LevelFilter::Error,
            LogLevelArg::Warn => LevelFilter::Warn,
            LogLevelArg::Info => LevelFilter::Info,
            LogLevelArg::Debug => LevelFilter::Debug,
            LogLevelArg::Trace => LevelFilter::Trace,
        }
    }
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Plan(args) => run_plan(&args),
        Commands::ExampleJob { out } => run_example_job(&out),
    }
}

// With `tracing` the filter comes from RUST_LOG instead of --log-level.
#[cfg(feature = "tracing")]
fn init_logging(_level: LevelFilter) -> CliResult<()> {
    let _ = tracing_log::LogTracer::init();
    pickplace::core::init_tracing(false);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    pickplace::core::init_with_level(level).map_err(|e| e.to_string())?;
    Ok(())
}

fn run_plan(args: &PlanArgs) -> CliResult<()> {
    init_logging(args.log_level.into())?;

    let job = JobConfig::load_json(&args.job)?;
    log::info!(
        "{}: {} template(s), {} contour(s)",
        args.job.display(),
        job.templates.len(),
        job.contours.len()
    );

    let report: JobReport = job.run()?;
    log::info!(
        "planned {} part(s), plane row {} with {} placed",
        report.frame.planned().count(),
        report.plane.row,
        report.plane.placed
    );

    match &args.out {
        Some(path) => {
            report.write_json(path)?;
            log::info!("wrote report to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn run_example_job(out: &Path) -> CliResult<()> {
    JobConfig::example().write_json(out)?;
    println!("wrote example job to {}", out.display());
    Ok(())
}
