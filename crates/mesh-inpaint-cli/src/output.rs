//! Output formatting utilities for the CLI.

use serde::Serialize;

use crate::OutputFormat;

/// Print output in the specified format.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }

    match format {
        OutputFormat::Text => {
            // Text output is handled by the caller
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a success message.
pub fn success(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }

    if let OutputFormat::Text = format {
        use colored::Colorize;
        println!("{} {}", "✓".green().bold(), msg);
    }
}

/// Print a warning message.
pub fn warning(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }

    if let OutputFormat::Text = format {
        use colored::Colorize;
        eprintln!("{} {}", "⚠".yellow().bold(), msg);
    }
}
