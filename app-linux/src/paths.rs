use std::path::PathBuf;

use vsaver_log_core::platform::AppPaths;

/// XDG layout: config under `~/.config`, output under `~/.local/state`.
#[derive(Default)]
pub struct LinuxPaths;

impl AppPaths for LinuxPaths {
    fn config_path(&self) -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vsaver")
            .join("logger.toml")
    }

    fn log_dir(&self) -> PathBuf {
        state_root().join("logs")
    }

    fn files_dir(&self) -> PathBuf {
        state_root().join("files")
    }
}

fn state_root() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vsaver")
}
