//! Forward `log` records from the library to defmt.

use core::fmt::Write;

use heapless::String;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Longest formatted message; longer ones are cut.
const LINE_LEN: usize = 128;

struct DefmtLogger;

static LOGGER: DefmtLogger = DefmtLogger;

impl Log for DefmtLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        let mut line: String<LINE_LEN> = String::new();
        // Overflow only truncates the line.
        let _ = write!(line, "{}", record.args());
        match record.level() {
            Level::Error => defmt::error!("[{=str}] {=str}", record.target(), line.as_str()),
            Level::Warn => defmt::warn!("[{=str}] {=str}", record.target(), line.as_str()),
            Level::Info => defmt::info!("[{=str}] {=str}", record.target(), line.as_str()),
            Level::Debug => defmt::debug!("[{=str}] {=str}", record.target(), line.as_str()),
            Level::Trace => defmt::trace!("[{=str}] {=str}", record.target(), line.as_str()),
        }
    }

    fn flush(&self) {}
}

/// Install the bridge. Call once, before any task is spawned.
pub fn init() {
    // SAFETY: called once from `main` before the executor runs anything
    // else, so nothing can observe the logger half-installed.
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(LevelFilter::Debug);
    }
}
