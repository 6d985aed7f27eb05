//! Log record and its classification enums.
//!
//! Numeric discriminants are bit values so callers can build level or
//! category masks; they are stable and appear in [`LogRecord`]'s JSON form
//! only as variant names.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogLevel {
    /// Routine event worth noting.
    Information = 1,
    /// Potential risk.
    Warning = 2,
    /// Ordinary error, e.g. a wrong password.
    Error = 4,
    /// A normal operation failed, e.g. a remote connection was refused.
    Failed = 8,
    /// Unexpected event, e.g. a conversion failure.
    Exception = 16,
    /// Something serious has happened.
    Critical = 32,
    /// Possible illegal operation.
    Illegal = 64,
}

impl LogLevel {
    /// Every level, lowest bit first.
    pub const ALL: [Self; 7] = [
        Self::Information,
        Self::Warning,
        Self::Error,
        Self::Failed,
        Self::Exception,
        Self::Critical,
        Self::Illegal,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Failed => "Failed",
            Self::Exception => "Exception",
            Self::Critical => "Critical",
            Self::Illegal => "Illegal",
        }
    }

    /// Bit value of this level.
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad area a log record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogCategory {
    Business = 1,
    System = 2,
    Tool = 4,
}

impl LogCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Business => "Business",
            Self::System => "System",
            Self::Tool => "Tool",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build flavour that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordType {
    Debug = 1,
    Release = 2,
}

impl RecordType {
    /// `Debug` when compiled with debug assertions, `Release` otherwise.
    #[must_use]
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log entry as delivered to every registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Application that produced the record.
    pub source: String,
    /// Producing sub-module path, conventionally `A:B:C`.
    pub sub_modules: String,
    pub category: LogCategory,
    pub level: LogLevel,
    pub record_type: RecordType,
    /// Caller-defined classification; `0` when unused.
    pub custom_type: i32,
    pub content: String,
    /// Creation time of the record.
    pub timestamp: DateTime<Utc>,
}

/// Per-module defaults stamped onto every new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTemplate {
    pub source: String,
    pub record_type: RecordType,
}

impl RecordTemplate {
    #[must_use]
    pub fn new(source: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            source: source.into(),
            record_type,
        }
    }

    /// Builds a record carrying this template's source and type, stamped now.
    #[must_use]
    pub fn record(
        &self,
        category: LogCategory,
        level: LogLevel,
        sub_modules: &str,
        content: &str,
        custom_type: i32,
    ) -> LogRecord {
        LogRecord {
            source: self.source.clone(),
            sub_modules: sub_modules.to_string(),
            category,
            level,
            record_type: self.record_type,
            custom_type,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}
