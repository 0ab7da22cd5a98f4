//! Colored status lines for the command line.
//!
//! Honors `NO_COLOR`. Status lines go to stderr; stdout carries JSON only.

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};

static COLOR_ENABLED: AtomicBool = AtomicBool::new(true);

#[derive(Debug, Clone, Copy)]
enum ColorKind {
    Info,
    Success,
    Warning,
    Error,
}

pub struct Formatter;

impl Formatter {
    /// Format an informational message in cyan.
    pub fn info(message: impl AsRef<str>) -> String {
        Self::apply_color(message.as_ref(), ColorKind::Info)
    }

    /// Format a success message in green.
    pub fn success(message: impl AsRef<str>) -> String {
        Self::apply_color(message.as_ref(), ColorKind::Success)
    }

    /// Format a warning message in yellow.
    pub fn warning(message: impl AsRef<str>) -> String {
        Self::apply_color(message.as_ref(), ColorKind::Warning)
    }

    /// Format an error message in red.
    pub fn error(message: impl AsRef<str>) -> String {
        Self::apply_color(message.as_ref(), ColorKind::Error)
    }

    pub fn configure_colors(enable: bool) {
        COLOR_ENABLED.store(enable, Ordering::Relaxed);
    }

    /// Disable colors when `NO_COLOR` is set to a non-empty value.
    pub fn configure_colors_from_env() {
        let no_color = std::env::var("NO_COLOR")
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        Self::configure_colors(!no_color);
    }

    fn apply_color(message: &str, kind: ColorKind) -> String {
        if !COLOR_ENABLED.load(Ordering::Relaxed) {
            return message.to_string();
        }
        match kind {
            ColorKind::Info => message.cyan().to_string(),
            ColorKind::Success => message.green().to_string(),
            ColorKind::Warning => message.yellow().to_string(),
            ColorKind::Error => message.red().bold().to_string(),
        }
    }
}
