// src/logger.rs
//
// Single responsibility: installing the os_log backend for the `log` facade

use log::LevelFilter;
use oslog::OsLogger;

pub const SUBSYSTEM: &str = "com.jpendowski.vsaver";

/// Route `log` records to the unified logging system.
/// Typically called early in `main()`.
pub fn init_logger(level: LevelFilter) {
    if let Err(e) = OsLogger::new(SUBSYSTEM).level_filter(level).init() {
        eprintln!("failed to install os_log backend: {e}");
    }
}
