//! Console output helpers.

use console::{Emoji, style};

pub static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "OK ");
pub static ERROR: Emoji<'_, '_> = Emoji("❌ ", "ERR ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", SUCCESS, style(msg).green());
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", ERROR, style(msg).red().bold());
}

/// Print an info message.
pub fn info(msg: &str) {
    println!("{} {}", INFO, style(msg).cyan());
}

/// Print a labeled statistic line.
pub fn stat(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}
