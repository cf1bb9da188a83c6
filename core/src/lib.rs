pub mod config;
pub mod daily;
pub mod error;
pub mod events;
pub mod logger;
mod macros;
mod sink;

pub use config::{LoggerConfig, WriteMode};
pub use error::{ConfigError, FileWriteError};
pub use events::{EventHandler, EventHub, SubscriptionToken, SystemEvent, SystemEventSource};
pub use logger::{Logger, LoggerBuilder};

/// Interfaces that platform shells can implement to adapt the core library
/// without pulling in platform-specific dependencies.
pub mod platform {
    use std::path::PathBuf;

    use chrono::{DateTime, Local};

    /// Trait for platform-correct config and output locations.
    pub trait AppPaths: Send + Sync {
        fn config_path(&self) -> PathBuf;
        /// Directory holding the daily mirror log.
        fn log_dir(&self) -> PathBuf;
        /// Directory that `Logger::log_file` names are resolved against.
        fn files_dir(&self) -> PathBuf;
    }

    /// Source of the current local time. Swapped out in tests to simulate days.
    pub trait Clock: Send + Sync {
        fn now(&self) -> DateTime<Local>;
    }

    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Local> {
            Local::now()
        }
    }

    /// Fallback layout used by the shared logger when no shell installed one.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct DefaultPaths;

    impl AppPaths for DefaultPaths {
        fn config_path(&self) -> PathBuf {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("vsaver")
                .join("logger.toml")
        }

        fn log_dir(&self) -> PathBuf {
            data_root().join("logs")
        }

        fn files_dir(&self) -> PathBuf {
            data_root().join("files")
        }
    }

    fn data_root() -> PathBuf {
        dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vsaver")
    }

    /// Paths rooted in a single directory. Handy for tests and portable installs.
    #[derive(Debug, Clone)]
    pub struct RootedPaths {
        root: PathBuf,
    }

    impl RootedPaths {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }
    }

    impl AppPaths for RootedPaths {
        fn config_path(&self) -> PathBuf {
            self.root.join("logger.toml")
        }

        fn log_dir(&self) -> PathBuf {
            self.root.join("logs")
        }

        fn files_dir(&self) -> PathBuf {
            self.root.join("files")
        }
    }
}
