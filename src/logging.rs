use std::fs::OpenOptions;
use std::io::Write;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{AltsumError, AltsumResult};

/// Global log level (default: Warn). Checked before taking the filter lock.
static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    pub fn parse_level(s: &str) -> Option<LogLevel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(raw: u8) -> LogLevel {
        match raw {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogFilter {
    pub default: LogLevel,
    pub rules: Vec<(String, LogLevel)>,
}

impl LogFilter {
    /// Longest matching target prefix wins; otherwise the default.
    pub fn level_for_target(&self, target: &str) -> LogLevel {
        let mut best: Option<(usize, LogLevel)> = None;
        for (rule_target, level) in &self.rules {
            if rule_target.is_empty() {
                continue;
            }
            if target.starts_with(rule_target.as_str()) {
                let len = rule_target.len();
                if best.map(|(best_len, _)| len > best_len).unwrap_or(true) {
                    best = Some((len, *level));
                }
            }
        }
        best.map(|(_, level)| level).unwrap_or(self.default)
    }

    /// Most verbose level any target could log at.
    fn max_level(&self) -> LogLevel {
        self.rules
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, LogLevel::max)
    }
}

impl Default for LogFilter {
    fn default() -> Self {
        LogFilter {
            default: LogLevel::Warn,
            rules: Vec::new(),
        }
    }
}

pub fn parse_filter(spec: &str) -> AltsumResult<LogFilter> {
    let mut default = None;
    let mut rules = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((target, level_str)) = part.split_once('=') {
            let level = LogLevel::parse_level(level_str).ok_or_else(|| {
                AltsumError::InvalidLogFilter(format!("unknown level '{}'", level_str.trim()))
            })?;
            rules.push((target.trim().to_string(), level));
        } else {
            let level = LogLevel::parse_level(part).ok_or_else(|| {
                AltsumError::InvalidLogFilter(format!("unknown level '{}'", part))
            })?;
            default = Some(level);
        }
    }

    Ok(LogFilter {
        default: default.unwrap_or(LogLevel::Warn),
        rules,
    })
}

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub target: String,
    pub file: String,
    pub line: u32,
    pub fields: Vec<(String, JsonValue)>,
}

#[derive(Debug)]
pub enum LogSink {
    Stderr,
    /// Opened on first use. If that fails the sink warns once and goes quiet.
    File {
        path: PathBuf,
        append: bool,
        file: Option<std::fs::File>,
        failed: bool,
    },
    Memory {
        entries: Vec<String>,
        max: usize,
    },
}

#[derive(Debug)]
pub struct LoggerCore {
    pub filter: LogFilter,
    pub format: LogFormat,
    pub timestamps: bool,
    pub sinks: Vec<LogSink>,
}

impl LoggerCore {
    pub fn new() -> Self {
        LoggerCore {
            filter: LogFilter::default(),
            format: LogFormat::Text,
            timestamps: true,
            sinks: vec![LogSink::Stderr],
        }
    }

    pub fn enabled(&self, level: LogLevel, target: &str) -> bool {
        level != LogLevel::Off && level <= self.filter.level_for_target(target)
    }

    pub fn log(&mut self, record: &LogRecord) {
        if !self.enabled(record.level, &record.target) {
            return;
        }
        let formatted = self.format_record(record);
        for sink in &mut self.sinks {
            match sink {
                LogSink::Stderr => {
                    eprintln!("{}", formatted);
                }
                LogSink::File {
                    path,
                    append,
                    file,
                    failed,
                } => {
                    if file.is_none() && !*failed {
                        let mut opts = OpenOptions::new();
                        opts.create(true).write(true);
                        if *append {
                            opts.append(true);
                        } else {
                            opts.truncate(true);
                        }
                        match opts.open(&*path) {
                            Ok(handle) => {
                                *file = Some(handle);
                            }
                            Err(err) => {
                                eprintln!(
                                    "Warning: could not open log file '{}': {}",
                                    path.display(),
                                    err
                                );
                                *failed = true;
                            }
                        }
                    }
                    if let Some(handle) = file {
                        let _ = writeln!(handle, "{}", formatted);
                    }
                }
                LogSink::Memory { entries, max } => {
                    entries.push(formatted.clone());
                    if entries.len() > *max {
                        let drain = entries.len() - *max;
                        entries.drain(0..drain);
                    }
                }
            }
        }
    }

    /// Lines captured by any memory sinks, oldest first.
    pub fn memory_entries(&self) -> Vec<String> {
        self.sinks
            .iter()
            .filter_map(|sink| match sink {
                LogSink::Memory { entries, .. } => Some(entries.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn format_record(&self, record: &LogRecord) -> String {
        match self.format {
            LogFormat::Json => self.format_json(record),
            LogFormat::Compact => self.format_compact(record),
            LogFormat::Text => self.format_text(record),
        }
    }

    fn format_text(&self, record: &LogRecord) -> String {
        let thread_id = std::thread::current().id();
        let thread_num: u64 = format!("{:?}", thread_id)
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap_or(0)
            % 10000;

        let mut parts = Vec::new();
        parts.push(format!("[{:5}]", record.level.name()));
        if self.timestamps {
            parts.push(timestamp_string());
        }
        parts.push(format!("[thread:{:04}]", thread_num));
        if !record.target.is_empty() {
            parts.push(record.target.clone());
        }
        parts.push(format!("{}:{}", record.file, record.line));

        let mut msg = record.message.clone();
        if !record.fields.is_empty() {
            msg = format!("{} {}", msg, format_fields(&record.fields));
        }

        format!("{} | {}", parts.join(" "), msg)
    }

    fn format_compact(&self, record: &LogRecord) -> String {
        let mut msg = record.message.clone();
        if !record.fields.is_empty() {
            msg = format!("{} {}", msg, format_fields(&record.fields));
        }
        format!("[{}] {}", record.level.name(), msg)
    }

    fn format_json(&self, record: &LogRecord) -> String {
        let mut obj = Map::new();
        if self.timestamps {
            obj.insert("ts".to_string(), JsonValue::String(timestamp_string()));
        }
        obj.insert(
            "level".to_string(),
            JsonValue::String(record.level.name().to_string()),
        );
        obj.insert(
            "target".to_string(),
            JsonValue::String(record.target.clone()),
        );
        obj.insert("file".to_string(), JsonValue::String(record.file.clone()));
        obj.insert("line".to_string(), json!(record.line));
        obj.insert("msg".to_string(), JsonValue::String(record.message.clone()));

        let fields: Map<String, JsonValue> = record.fields.iter().cloned().collect();
        obj.insert("fields".to_string(), JsonValue::Object(fields));

        JsonValue::Object(obj).to_string()
    }
}

impl Default for LoggerCore {
    fn default() -> Self {
        Self::new()
    }
}

fn format_fields(fields: &[(String, JsonValue)]) -> String {
    fields
        .iter()
        .map(|(k, v)| match v {
            JsonValue::String(s) => format!("{}={}", k, s),
            other => format!("{}={}", k, other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn timestamp_string() -> String {
    format!("{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
}

static LOGGER: OnceLock<Mutex<LoggerCore>> = OnceLock::new();

fn logger() -> &'static Mutex<LoggerCore> {
    LOGGER.get_or_init(|| Mutex::new(LoggerCore::new()))
}

/// Replace the process-wide logger.
pub fn install(core: LoggerCore) {
    let max = core.filter.max_level();
    let mut guard = logger().lock().unwrap_or_else(|e| e.into_inner());
    *guard = core;
    GLOBAL_LOG_LEVEL.store(max as u8, Ordering::Relaxed);
}

/// Run `f` against the process-wide logger.
pub fn with_logger<T>(f: impl FnOnce(&mut LoggerCore) -> T) -> T {
    let mut guard = logger().lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

pub fn set_filter(spec: &str) -> AltsumResult<()> {
    let filter = parse_filter(spec)?;
    GLOBAL_LOG_LEVEL.store(filter.max_level() as u8, Ordering::Relaxed);
    with_logger(|core| core.filter = filter);
    Ok(())
}

pub fn get_global_log_level() -> LogLevel {
    LogLevel::from_u8(GLOBAL_LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn log_enabled(level: LogLevel, target: &str) -> bool {
    if level == LogLevel::Off || level > get_global_log_level() {
        return false;
    }
    with_logger(|core| core.enabled(level, target))
}

#[track_caller]
pub fn log(level: LogLevel, target: &str, message: &str, fields: &[(&str, JsonValue)]) {
    if !log_enabled(level, target) {
        return;
    }
    let location = Location::caller();
    let record = LogRecord {
        level,
        message: message.to_string(),
        target: target.to_string(),
        file: location.file().to_string(),
        line: location.line(),
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    };
    with_logger(|core| core.log(&record));
}

#[track_caller]
pub fn warn(target: &str, message: &str, fields: &[(&str, JsonValue)]) {
    log(LogLevel::Warn, target, message, fields);
}

#[track_caller]
pub fn info(target: &str, message: &str, fields: &[(&str, JsonValue)]) {
    log(LogLevel::Info, target, message, fields);
}

#[track_caller]
pub fn debug(target: &str, message: &str, fields: &[(&str, JsonValue)]) {
    log(LogLevel::Debug, target, message, fields);
}
