//! Console agent rendering records as coloured text blocks.

use std::io::{self, Write};

use crossterm::style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::QueueableCommand;
use parking_lot::Mutex;

use super::LogAgent;
use crate::record::{LogLevel, LogRecord};

/// Writes each record as a multi-line block, coloured by level.
///
/// ```text
/// [Debug]
/// Source : my-app
/// SubModules : Program:Main
/// Category : Business
/// Custom Type : 0
/// Level : Information
/// Time Stamp : 2026-10-19 08:15:02.117 UTC
/// This is an Information
///
/// ```
pub struct ConsoleAgent {
    agent_id: String,
    out: Mutex<Box<dyn Write + Send>>,
    colored: bool,
}

impl ConsoleAgent {
    /// Console agent writing to stdout with colours enabled.
    #[must_use]
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self::with_writer(agent_id, io::stdout())
    }

    /// Console agent writing to an arbitrary sink.
    #[must_use]
    pub fn with_writer(agent_id: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            agent_id: agent_id.into(),
            out: Mutex::new(Box::new(writer)),
            colored: true,
        }
    }

    /// Enables or disables ANSI colours.
    #[must_use]
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }
}

impl LogAgent for ConsoleAgent {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn record(&self, record: &LogRecord) -> anyhow::Result<()> {
        let mut out = self.out.lock();
        write_record(&mut *out, record, self.colored)?;
        out.flush()?;
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.out.lock().flush()?;
        Ok(())
    }
}

/// Foreground and background colours for a level.
fn level_colors(level: LogLevel) -> (Option<Color>, Option<Color>) {
    match level {
        LogLevel::Information => (Some(Color::Green), None),
        LogLevel::Warning => (Some(Color::Yellow), None),
        LogLevel::Error => (Some(Color::Red), None),
        LogLevel::Failed => (Some(Color::Cyan), None),
        LogLevel::Exception => (Some(Color::Yellow), Some(Color::DarkGreen)),
        LogLevel::Critical => (Some(Color::Red), Some(Color::DarkGreen)),
        LogLevel::Illegal => (None, Some(Color::DarkGreen)),
    }
}

/// Renders `record` into `out`. The header line is never coloured.
pub fn write_record<W: Write>(
    out: &mut W,
    record: &LogRecord,
    colored: bool,
) -> io::Result<()> {
    writeln!(out, "[{}]", record.record_type)?;

    if colored {
        let (fg, bg) = level_colors(record.level);
        if let Some(fg) = fg {
            out.queue(SetForegroundColor(fg))?;
        }
        if let Some(bg) = bg {
            out.queue(SetBackgroundColor(bg))?;
        }
    }

    writeln!(out, "Source : {}", record.source)?;
    writeln!(out, "SubModules : {}", record.sub_modules)?;
    writeln!(out, "Category : {}", record.category)?;
    writeln!(out, "Custom Type : {}", record.custom_type)?;
    writeln!(out, "Level : {}", record.level)?;
    writeln!(
        out,
        "Time Stamp : {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f UTC")
    )?;
    writeln!(out, "{}", record.content)?;

    if colored {
        out.queue(ResetColor)?;
    }
    writeln!(out)
}
