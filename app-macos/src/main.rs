// src/main.rs
//
// macOS shell for the VSaver logger. Installs the os_log backend and the shared
// logger, then runs an accessory NSApplication so workspace notifications
// (sleep, wake, power off) reach the logger.

#[cfg(target_os = "macos")]
mod logger;
#[cfg(target_os = "macos")]
mod paths;
#[cfg(target_os = "macos")]
mod wake_detector;

#[cfg(target_os = "macos")]
fn main() {
    use log::{info, warn};
    use objc2::MainThreadMarker;
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};
    use std::sync::Arc;
    use vsaver_log_core::{EventHub, Logger, LoggerConfig, vss_log};

    use crate::paths::MacPaths;

    // 1. Configuration and the os_log backend
    let paths = Arc::new(MacPaths);
    let config = LoggerConfig::load_or_default(paths.as_ref());
    logger::init_logger(config.level_filter());
    info!("VSaver logger starting up");

    // 2. The shared logger, wired to the process-wide event hub
    let shared = Logger::builder()
        .config(config)
        .paths(paths)
        .event_source(EventHub::global())
        .build();
    if Logger::install_shared(shared).is_err() {
        warn!("shared logger already installed; using existing instance");
    }
    vss_log!("VSaver logger ready (pid {})", std::process::id());

    // 3. Cocoa setup; notifications are delivered on the main thread
    let Some(mtm) = MainThreadMarker::new() else {
        warn!("not on the main thread; lifecycle notifications unavailable");
        return;
    };
    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

    let _observer = wake_detector::setup_lifecycle_observer();

    // 4. Run the main application loop
    app.run();
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("vsaver_log_macos only runs on macOS");
    std::process::exit(1);
}
