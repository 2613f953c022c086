// file: src/utils/logging.rs
// description: diagnostics subscriber for the command line tool and coloured status lines

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Process-wide subscriber for the tool's own diagnostics. Script loggers
/// built by `setup_logging` keep their own handlers and are unaffected.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_cli_logger(colored_output: bool, verbose: bool) -> bool {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("WADNR_UTILITIES_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}
