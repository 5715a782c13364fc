//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to stdout and to a log file
//! which is rotated by size. Rotated files are kept as `<name>.log.1`,
//! `<name>.log.2`, ... up to a fixed number of backups; the oldest backup is
//! overwritten once the limit is reached.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_MAX_BACKUPS: usize = 3;

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("failed to prepare log file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("a global logger is already installed")]
    AlreadyInitialized,

    #[error("logger has not been initialized")]
    NotInitialized,
}

/// Options for [`init_with`].
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub log_dir: PathBuf,
    pub app_name: String,
    /// Rotate once the active file would grow past this size.
    pub max_file_bytes: u64,
    /// Number of rotated files kept next to the active one.
    pub max_backups: usize,
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub filter: String,
}

impl LoggerOptions {
    pub fn new(log_dir: impl AsRef<Path>, app_name: &str) -> Self {
        Self {
            log_dir: log_dir.as_ref().to_path_buf(),
            app_name: app_name.to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_backups: DEFAULT_MAX_BACKUPS,
            filter: "info".to_string(),
        }
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = filter.to_string();
        self
    }

    fn file_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.log", self.app_name))
    }
}

/// Initialize logging into `log_dir` with default rotation settings.
///
/// Returns the path of the active log file.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<PathBuf, LoggerError> {
    init_with(LoggerOptions::new(log_dir, app_name))
}

/// Initialize logging with explicit options.
pub fn init_with(options: LoggerOptions) -> Result<PathBuf, LoggerError> {
    if LOG_FILE.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.filter))
        .map_err(|e| LoggerError::InvalidFilter {
            filter: options.filter.clone(),
            message: e.to_string(),
        })?;

    let path = options.file_path();
    let file = RollingFile::open(&path, options.max_file_bytes, options.max_backups)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_timer(LocalTimer),
        )
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    let _ = LOG_FILE.set(path.clone());
    Ok(path)
}

/// Path of the active log file, once initialized.
pub fn log_file() -> Option<&'static Path> {
    LOG_FILE.get().map(PathBuf::as_path)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::info!(target: "rolling_logger", "{message}");
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::error!(target: "rolling_logger", "{message}");
    Ok(())
}

fn ensure_initialized() -> Result<(), LoggerError> {
    LOG_FILE.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

/// Local wall-clock timestamps with millisecond precision.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Size-rotated append-only log file.
pub struct RollingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    max_backups: usize,
}

impl RollingFile {
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, max_backups: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            written,
            max_bytes,
            max_backups,
        })
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_backups == 0 {
            self.file = File::create(&self.path)?;
        } else {
            let oldest = self.backup_path(self.max_backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for n in (1..self.max_backups).rev() {
                let from = self.backup_path(n);
                if from.exists() {
                    fs::rename(&from, self.backup_path(n + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
