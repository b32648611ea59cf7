//! Process-wide file logging driven by `LogSettings`.
//!
//! # Responsibility
//! - Start the rotating `cai*.log` file logger once per process.
//! - Record panics as single-line `event=panic_captured` entries.
//!
//! # Invariants
//! - No configured directory means no logger; that is not an error.
//! - Re-initialization with identical settings is a no-op; any other settings
//!   are rejected with `LoggingError::Conflict`.
//! - Initialization never panics.

use crate::config::LogSettings;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "cai";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE: OnceCell<(ActiveLogging, LoggerHandle)> = OnceCell::new();

/// Level and directory of a running logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLogging {
    pub level: LevelFilter,
    pub dir: PathBuf,
}

/// Logging setup failure.
#[derive(Debug)]
pub enum LoggingError {
    InvalidLevel(String),
    /// Log directories must be absolute.
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// A logger with other settings is already running.
    Conflict {
        active: ActiveLogging,
        requested: ActiveLogging,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(raw) => write!(
                f,
                "unsupported log level `{raw}`; expected off|error|warn|info|debug|trace"
            ),
            Self::RelativeDir(dir) => {
                write!(f, "log dir must be an absolute path, got `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create log dir `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already runs at level {} in `{}`; refusing level {} in `{}`",
                active.level,
                active.dir.display(),
                requested.level,
                requested.dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::InvalidLevel(_) | Self::RelativeDir(_) | Self::Conflict { .. } => None,
        }
    }
}

/// Level used when `LogSettings::level` is unset: `debug` in debug builds,
/// `info` in release builds.
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Resolves settings into the logger they describe, `None` without a directory.
pub fn resolve(settings: &LogSettings) -> Result<Option<ActiveLogging>, LoggingError> {
    let Some(dir) = settings.dir.as_deref() else {
        return Ok(None);
    };
    if !dir.is_absolute() {
        return Err(LoggingError::RelativeDir(dir.to_path_buf()));
    }
    let level = match settings.level.as_deref() {
        Some(raw) => parse_level(raw)?,
        None => default_level(),
    };
    Ok(Some(ActiveLogging {
        level,
        dir: dir.to_path_buf(),
    }))
}

/// Starts file logging for `settings`.
///
/// Returns `Ok(false)` when no directory is configured and `Ok(true)` once
/// logging is active.
pub fn init_logging(settings: &LogSettings) -> Result<bool, LoggingError> {
    let Some(requested) = resolve(settings)? else {
        return Ok(false);
    };
    let (active, _) = ACTIVE.get_or_try_init(|| start(&requested))?;
    if *active != requested {
        return Err(LoggingError::Conflict {
            active: active.clone(),
            requested,
        });
    }
    Ok(true)
}

/// Settings of the running logger, if any.
pub fn logging_status() -> Option<ActiveLogging> {
    ACTIVE.get().map(|(active, _)| active.clone())
}

fn start(target: &ActiveLogging) -> Result<(ActiveLogging, LoggerHandle), LoggingError> {
    std::fs::create_dir_all(&target.dir).map_err(|source| LoggingError::CreateDir {
        dir: target.dir.clone(),
        source,
    })?;

    let spec = LogSpecification::builder().default(target.level).build();
    let handle = Logger::with(spec)
        .log_to_file(
            FileSpec::default()
                .directory(target.dir.clone())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    install_panic_hook();
    info!(
        "event=logging_init module=logging status=ok level={} dir={} version={}",
        target.level,
        target.dir.display(),
        env!("CARGO_PKG_VERSION")
    );
    Ok((target.clone(), handle))
}

fn parse_level(raw: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::Warn);
    }
    LevelFilter::from_str(trimmed).map_err(|_| LoggingError::InvalidLevel(raw.to_string()))
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=logging status=error location={location} payload={}",
            panic_summary(info.payload())
        );
        previous(info);
    }));
}

/// Payloads may echo record values: one line, capped length.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    let mut summary: String = text
        .chars()
        .take(PANIC_SUMMARY_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if text.chars().count() > PANIC_SUMMARY_CHARS {
        summary.push_str("...");
    }
    summary
}
