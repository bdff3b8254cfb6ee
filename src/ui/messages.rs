//! Status lines for the short-lived commands. Long-running polling reports
//! through `tracing` instead.

use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW};
use std::fmt::Display;

const BOLD: &str = "\x1b[1m";

#[derive(Clone, Copy)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Level::Info => (CYAN, "ℹ️"),
            Level::Success => (GREEN, "✅"),
            Level::Warning => (YELLOW, "⚠️"),
            Level::Error => (RED, "❌"),
        }
    }
}

fn render(level: Level, msg: &dyn Display) -> String {
    let (color, icon) = level.style();
    format!("{color}{BOLD}{icon}{RESET} {msg}")
}

pub fn info(msg: impl Display) {
    println!("{}", render(Level::Info, &msg));
}

pub fn success(msg: impl Display) {
    println!("{}", render(Level::Success, &msg));
}

pub fn warning(msg: impl Display) {
    println!("{}", render(Level::Warning, &msg));
}

/// Errors go to stderr so scripted callers can keep stdout clean.
pub fn error(msg: impl Display) {
    eprintln!("{}", render(Level::Error, &msg));
}

/// Indented `label: value` line used by summaries.
pub fn field(label: &str, value: impl Display) {
    println!("   {BOLD}{label}:{RESET} {value}");
}
