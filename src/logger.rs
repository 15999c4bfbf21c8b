use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::Dispatch;
use log::{LevelFilter, Record};
use std::fmt::Arguments;
use std::fs;
use std::path::PathBuf;

const LEVEL_VAR: &str = "RUST_LOG";
const DIR_VAR: &str = "BSP_MASTER_LOG_DIR";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Where the master writes its log and how verbose it is.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerOptions {
    pub level: LevelFilter,
    pub dir: PathBuf,
    pub file_name: String,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self { level: LevelFilter::Info, dir: PathBuf::from("logs"), file_name: "master.log".to_string() }
    }
}

impl LoggerOptions {
    /// Level from `RUST_LOG`, directory from `BSP_MASTER_LOG_DIR`; unset or invalid values keep
    /// the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: std::env::var(LEVEL_VAR).ok().and_then(|value| parse_level(&value)).unwrap_or(defaults.level),
            dir: std::env::var_os(DIR_VAR).map(PathBuf::from).unwrap_or(defaults.dir),
            ..defaults
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse::<LevelFilter>().ok()
}

fn format_line(out: fern::FormatCallback, message: &Arguments, record: &Record, level: &dyn std::fmt::Display) {
    out.finish(format_args!("[{} {} {}] {}", Local::now().format(TIMESTAMP_FORMAT), level, record.target(), message))
}

fn console() -> Dispatch {
    let colors = ColoredLevelConfig::new().error(Color::Red).warn(Color::Yellow).info(Color::Green).debug(Color::Blue).trace(Color::BrightBlack);

    Dispatch::new().format(move |out, message, record| format_line(out, message, record, &colors.color(record.level()))).chain(std::io::stderr())
}

/// File sink, or `None` when the file cannot be opened; the master then logs to stderr only.
fn file(options: &LoggerOptions) -> Option<Dispatch> {
    if let Err(e) = fs::create_dir_all(&options.dir) {
        eprintln!("Failed to create log directory '{}': {}", options.dir.display(), e);
        return None;
    }

    let path = options.file_path();
    match fern::log_file(&path) {
        Ok(file) => Some(Dispatch::new().format(|out, message, record| format_line(out, message, record, &record.level())).chain(file)),
        Err(e) => {
            eprintln!("Failed to open log file '{}': {}, logging to stderr only.", path.display(), e);
            None
        }
    }
}

/// Installs the global logger from [`LoggerOptions::from_env`]. Call once at the start of `main`.
pub fn init() {
    init_with(&LoggerOptions::from_env());
}

pub fn init_with(options: &LoggerOptions) {
    // Socket and codec internals are noisy at debug level.
    let mut dispatch = Dispatch::new().level(options.level).level_for("tokio_util", LevelFilter::Warn).level_for("mio", LevelFilter::Warn).chain(console());

    let file = file(options);
    let to_file = file.is_some();
    if let Some(file) = file {
        dispatch = dispatch.chain(file);
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    if to_file {
        log::info!("Logging at {} to stderr and '{}'.", options.level, options.file_path().display());
    } else {
        log::info!("Logging at {} to stderr.", options.level);
    }
}
