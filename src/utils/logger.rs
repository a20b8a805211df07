//! Log setup for the CLI and the colors of the check summary.

use colored::{Color, ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;

/// Colors used for check summaries.
pub struct Colors;

impl Colors {
    pub const INTACT: Color = Color::Green;
    pub const CHANGED: Color = Color::Red;
    pub const MISSING: Color = Color::Yellow;

    pub fn colorize(color: Color, text: &str) -> ColoredString {
        text.color(color)
    }
}

/// `[parchiver]` for plain lines; warnings and errors also carry the level and the module.
fn prefix(record: &Record) -> String {
    let name = env!("CARGO_PKG_NAME").cyan();
    let level = match record.level() {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        _ => return format!("[{name}]"),
    };
    format!("[{name} {level} {}]", record.target().white())
}

/// Our crate logs at Info (Debug when `verbose`), dependencies at Warn. `RUST_LOG` still applies.
pub fn setup_logging(verbose: bool) {
    let own_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // try_init: a process may set up logging more than once (tests).
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), own_level)
        .format(|buf, record| writeln!(buf, "{} {}", prefix(record), record.args()))
        .try_init();
}
