/// Structured logging for the drainage viewer core
///
/// Provides context-rich logging tagged with the emitting component and,
/// where relevant, the asset or report id involved. Supports both console
/// output and file-based logging.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Selection,
    Reports,
    Simulation,
    Assets,
    Config,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Selection => write!(f, "SEL"),
            Component::Reports => write!(f, "RPT"),
            Component::Simulation => write!(f, "SIM"),
            Component::Assets => write!(f, "ASSET"),
            Component::Config => write!(f, "CFG"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - user submitted an incomplete request
    Expected,
    /// Unexpected failure - service down, misconfigured endpoint, or a bug
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        // A poisoned lock only means another thread panicked mid-log;
        // the Option inside is still usable.
        let mut guard = LOGGER.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(logger);
    }

    fn log(&self, level: LogLevel, component: Component, entity_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let entity_part = entity_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, component, entity_part, message
        );

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, entity_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, entity_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, entity_id: Option<&str>, message: &str) {
    let guard = LOGGER.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(logger) = guard.as_ref() {
        logger.log(level, component, entity_id, message);
    }
}

/// Log a general informational message
pub fn info(component: Component, entity_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, entity_id, message);
}

/// Log a warning message
pub fn warn(component: Component, entity_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, entity_id, message);
}

/// Log an error message
pub fn error(component: Component, entity_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, entity_id, message);
}

/// Log a debug message
pub fn debug(component: Component, entity_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, entity_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a simulation submission failure from its rendered message
pub fn classify_simulation_failure(error_message: &str) -> FailureType {
    if error_message.contains("Validation error") {
        FailureType::Expected
    } else if error_message.contains("HTTP error: 5")
        || error_message.contains("Request failed")
        || error_message.contains("Parse error")
    {
        FailureType::Unexpected
    } else {
        // 4xx from the service: could be our payload or their schema
        FailureType::Unknown
    }
}

/// Log a simulation failure with automatic classification
pub fn log_simulation_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_simulation_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(Component::Simulation, None, &message),
        FailureType::Unexpected => error(Component::Simulation, None, &message),
        FailureType::Unknown => warn(Component::Simulation, None, &message),
    }
}

/// Log a summary of a feed decode: how many records were kept vs skipped
pub fn log_load_summary(component: Component, what: &str, loaded: usize, skipped: usize) {
    let message = format!("Loaded {} {} ({} skipped)", loaded, what, skipped);

    if skipped == 0 {
        info(component, None, &message);
    } else if loaded == 0 {
        error(component, None, &message);
    } else {
        warn(component, None, &message);
    }
}
