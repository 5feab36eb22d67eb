use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;

/// Dependencies log at warn, mvcopy at info (debug with `verbose`). `RUST_LOG` overrides both.
pub fn setup_logging(verbose: bool) {
    let ours = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // try_init: tests and library callers may have installed a logger already
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), ours)
        .format(|buf, record| writeln!(buf, "{}", format_line(record)))
        .try_init();
}

/// `[mvcopy] msg` for info and below; problems also carry the level and the module they came from.
fn format_line(record: &Record) -> String {
    let tag = env!("CARGO_PKG_NAME").cyan();
    let level = match record.level() {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        _ => return format!("[{}] {}", tag, record.args()),
    };
    format!(
        "[{} {} {}] {}",
        tag,
        level,
        record.target().white(),
        record.args()
    )
}
