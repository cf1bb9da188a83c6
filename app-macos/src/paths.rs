use std::path::PathBuf;

use vsaver_log_core::platform::AppPaths;

/// macOS implementation of application paths.
/// Config lives next to the screensaver's preferences, output under ~/Library/Logs.
#[derive(Default)]
pub struct MacPaths;

impl AppPaths for MacPaths {
    fn config_path(&self) -> PathBuf {
        let mut base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.push("VSaver");
        base.push("logger.toml");
        base
    }

    fn log_dir(&self) -> PathBuf {
        logs_root()
    }

    fn files_dir(&self) -> PathBuf {
        let mut base = logs_root();
        base.push("files");
        base
    }
}

fn logs_root() -> PathBuf {
    let mut base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("Library");
    base.push("Logs");
    base.push("VSaver");
    base
}
