//! Stderr logging for the pick-and-place crates.
//!
//! Library code only talks to the `log` facade. Binaries install either the
//! plain line logger ([`init_logging`], [`init_with_level`]) or, with the
//! `tracing` feature, a `tracing` subscriber ([`init_tracing`]).
//!
//! Lines look like `[   1.234s  INFO match] matched 3 contour(s)`: seconds
//! since install, level and the crate the record came from with the
//! `pickplace_` prefix dropped.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

const OWN_PREFIX: &str = "pickplace";

/// Filter used by [`init_tracing`] when `RUST_LOG` is unset.
pub const DEFAULT_TRACING_FILTER: &str = "warn,pickplace=info";

/// What the line logger lets through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Level for records from the pickplace crates.
    pub level: LevelFilter,
    /// Level for every other target (dependencies).
    pub dependency_level: LevelFilter,
}

impl LogConfig {
    /// Same level everywhere.
    pub fn uniform(level: LevelFilter) -> Self {
        Self {
            level,
            dependency_level: level,
        }
    }

    /// `level` for the pickplace crates, warnings only from dependencies.
    pub fn quiet_dependencies(level: LevelFilter) -> Self {
        Self {
            level,
            dependency_level: level.min(LevelFilter::Warn),
        }
    }

    fn max_level(&self) -> LevelFilter {
        self.level.max(self.dependency_level)
    }

    fn allows(&self, metadata: &Metadata) -> bool {
        let limit = if is_own_target(metadata.target()) {
            self.level
        } else {
            self.dependency_level
        };
        metadata.level() <= limit
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::quiet_dependencies(LevelFilter::Info)
    }
}

fn is_own_target(target: &str) -> bool {
    target.starts_with(OWN_PREFIX)
}

/// Short source label: `pickplace_match::refine::search` -> `match`,
/// `pickplace` -> `pickplace`, `serde_json::de` -> `serde_json`.
fn source_label(target: &str) -> &str {
    let krate = target.split("::").next().unwrap_or(target);
    match krate.strip_prefix("pickplace_") {
        Some(rest) if !rest.is_empty() => rest,
        _ => krate,
    }
}

fn format_line(
    out: &mut impl fmt::Write,
    elapsed_s: f64,
    level: log::Level,
    target: &str,
    args: fmt::Arguments<'_>,
) -> fmt::Result {
    write!(
        out,
        "[{elapsed_s:8.3}s {level:>5} {}] {args}",
        source_label(target)
    )
}

struct LineLogger {
    config: LogConfig,
    started: Instant,
}

impl Log for LineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.config.allows(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut line = String::new();
        let formatted = format_line(
            &mut line,
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            *record.args(),
        );
        if formatted.is_ok() {
            let _ = writeln!(std::io::stderr().lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<LineLogger> = OnceLock::new();

/// Install the line logger.
///
/// Only the first successful call takes effect; later calls keep the
/// installed configuration and return `Ok`.
pub fn init_logging(config: LogConfig) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| LineLogger {
        config,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(logger.config.max_level());
    Ok(())
}

/// Install the line logger at `level` with dependencies held to warnings.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_logging(LogConfig::quiet_dependencies(level))
}

/// Install a `tracing` subscriber on stderr.
///
/// The filter comes from `RUST_LOG`, falling back to
/// [`DEFAULT_TRACING_FILTER`]. With `json` every event and closed span is one
/// JSON object per line.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACING_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(tracing_subscriber::fmt::time::Uptime::default());
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.finish().try_init()
    };
}
