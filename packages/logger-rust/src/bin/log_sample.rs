//! Console sample: starts a log module, appends one record per level and
//! stops after everything has been written.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use asynclog_logger::{
    ConsoleAgent, FileAgent, LogCategory, LogLevel, LogModule, LogModuleConfig, StopMode,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SUB_MODULES: &str = "Program:Main";

/// Asynchronous log module sample
#[derive(Parser, Debug)]
#[command(name = "log-sample")]
#[command(about = "Writes one sample record per log level through an asynchronous log module")]
#[command(version)]
struct Cli {
    /// Source name stamped on every record
    #[arg(long, env = "ASYNCLOG_SOURCE", default_value = "Async Log Module Console Sample")]
    source: String,

    /// Also write JSON lines into this folder, one file per day
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Disable console colours
    #[arg(long)]
    no_color: bool,

    /// Verbose diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let module = LogModule::new(LogModuleConfig::with_source(cli.source))?;

    let console_id = uuid::Uuid::new_v4().to_string();
    module.register_agent(Arc::new(ConsoleAgent::new(console_id).colored(!cli.no_color)))?;
    if let Some(dir) = cli.log_dir {
        info!(folder = %dir.display(), "writing log files");
        module.register_agent(Arc::new(FileAgent::new("file", dir)))?;
    }

    module.start()?;
    info!(source = module.source(), agents = ?module.agents(), "log module started");

    let samples = [
        (LogCategory::Business, LogLevel::Information, "This is an Information", 0),
        (LogCategory::Business, LogLevel::Warning, "This is a Warning", 0),
        (LogCategory::Business, LogLevel::Error, "This is an Error", 9),
        (LogCategory::System, LogLevel::Failed, "This is a Failed", 0),
        (LogCategory::System, LogLevel::Exception, "This is an Exception", 0),
        (LogCategory::Tool, LogLevel::Critical, "This is a Critical", 0),
        (LogCategory::Tool, LogLevel::Illegal, "This is an Illegal", 0),
    ];
    for (category, level, content, custom_type) in samples {
        module.append_log(category, level, SUB_MODULES, content, custom_type)?;
    }

    let report = module.stop(StopMode::Drain)?;
    info!(
        dispatched = report.dispatched,
        failed = report.failed,
        "log module stopped"
    );
    Ok(())
}
