//! Linux shell for the VSaver logger.
//! Installs the shared logger and turns termination signals and detected
//! suspend/resume into system events.

mod paths;
mod suspend_watch;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use vsaver_log_core::platform::AppPaths;
use vsaver_log_core::{
    EventHub, Logger, LoggerConfig, SystemEvent, vss_log, vss_log_daily_file,
};

use crate::paths::LinuxPaths;
use crate::suspend_watch::SuspendWatch;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const SUSPEND_THRESHOLD: Duration = Duration::from_secs(5);

fn main() {
    let paths = Arc::new(LinuxPaths::default());
    let config = LoggerConfig::load_or_default(paths.as_ref());

    env_logger::Builder::new()
        .filter_level(config.level_filter())
        .parse_default_env()
        .init();
    info!("starting vsaver logger (linux)");

    let logger = Logger::builder()
        .config(config)
        .paths(paths.clone())
        .event_source(EventHub::global())
        .build();
    let logger = match Logger::install_shared(logger) {
        Ok(logger) => logger,
        Err(_) => {
            warn!("shared logger already installed; using existing instance");
            Logger::shared()
        }
    };

    let running = Arc::new(AtomicBool::new(true));

    // Ctrl+C / SIGTERM: flush through the event hub, then leave the loop
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("received signal, flushing logs and exiting");
            EventHub::global().post(SystemEvent::WillTerminate);
            running.store(false, Ordering::SeqCst);
        }) {
            error!("failed to install signal handler: {e}");
        }
    }

    vss_log!(
        "vsaver logger running (pid {}, files in {})",
        std::process::id(),
        paths.files_dir().display()
    );
    if let Err(e) = vss_log_daily_file!("session.txt", format!("pid {}\n", std::process::id())) {
        error!("could not record session: {e}");
    }

    let mut watch = SuspendWatch::new(SUSPEND_THRESHOLD);
    while running.load(Ordering::SeqCst) {
        if let Some(slept) = watch.poll() {
            info!("resumed after {}s suspended", slept.as_secs());
            EventHub::global().post(SystemEvent::DidWake);
        }
        thread::sleep(POLL_INTERVAL);
    }

    logger.flush();
    info!("vsaver logger stopped");
}
