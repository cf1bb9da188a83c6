//! The logger service: formatted logging, named-file persistence and
//! lifecycle-driven syncing, reachable through a process-wide shared handle.

use chrono::NaiveDate;
use log::{Level, LevelFilter, debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use crate::config::{LoggerConfig, WriteMode};
use crate::daily::{daily_file_name, validate_relative_name};
use crate::error::FileWriteError;
use crate::events::{EventHub, SubscriptionToken, SystemEvent, SystemEventSource};
use crate::platform::{AppPaths, Clock, DefaultPaths, SystemClock};
use crate::sink::MirrorSink;

/// `log` target used for records emitted through the logger.
pub const LOG_TARGET: &str = "vsaver";

// Entries beyond this many are pruned of locks nobody holds.
const MAX_IDLE_FILE_LOCKS: usize = 64;

static SHARED: OnceLock<Logger> = OnceLock::new();

/// Handle to a logger. Clones share the same state.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    config: LoggerConfig,
    level: LevelFilter,
    paths: Arc<dyn AppPaths>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn SystemEventSource>,
    mirror: Option<Mutex<MirrorSink>>,
    file_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    subscription: Mutex<Option<SubscriptionToken>>,
}

/// Builder for [`Logger`]. Unset parts fall back to the platform defaults.
#[derive(Default)]
pub struct LoggerBuilder {
    config: Option<LoggerConfig>,
    paths: Option<Arc<dyn AppPaths>>,
    clock: Option<Arc<dyn Clock>>,
    events: Option<Arc<dyn SystemEventSource>>,
}

impl LoggerBuilder {
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn paths(mut self, paths: Arc<dyn AppPaths>) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn event_source(mut self, events: Arc<dyn SystemEventSource>) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the logger. Without an explicit config, it is loaded from
    /// `AppPaths::config_path`, falling back to defaults.
    pub fn build(self) -> Logger {
        let paths: Arc<dyn AppPaths> = match self.paths {
            Some(paths) => paths,
            None => Arc::new(DefaultPaths),
        };
        let config = self
            .config
            .unwrap_or_else(|| LoggerConfig::load_or_default(paths.as_ref()));
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let events: Arc<dyn SystemEventSource> = match self.events {
            Some(events) => events,
            None => EventHub::global(),
        };

        let mirror = config
            .mirror_to_file
            .then(|| Mutex::new(MirrorSink::new(paths.log_dir(), &config.log_file_stem)));

        debug!(
            "Logger ready (files in {}, mirror log {})",
            paths.files_dir().display(),
            if mirror.is_some() { "enabled" } else { "disabled" }
        );

        Logger {
            inner: Arc::new(Inner {
                level: config.level_filter(),
                config,
                paths,
                clock,
                events,
                mirror,
                file_locks: Mutex::new(HashMap::new()),
                subscription: Mutex::new(None),
            }),
        }
    }
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Process-wide logger, created on first access.
    ///
    /// The first access also registers for system events, unless the
    /// `manual-system-events` feature is enabled or the configuration says
    /// otherwise.
    pub fn shared() -> &'static Logger {
        shared_in(&SHARED, || Logger::builder().build())
    }

    /// Install `logger` as the shared instance. Hands the logger back when a
    /// shared instance already exists.
    pub fn install_shared(logger: Logger) -> Result<&'static Logger, Logger> {
        SHARED.set(logger)?;
        let shared = Self::shared();
        shared.register_on_creation();
        Ok(shared)
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    /// Log a formatted message at `info`. Never fails.
    pub fn log(&self, args: fmt::Arguments<'_>) {
        self.inner.record(Level::Info, args);
    }

    pub fn log_at(&self, level: Level, args: fmt::Arguments<'_>) {
        self.inner.record(level, args);
    }

    /// Persist `data` under `filename` in the files directory and return the
    /// path written. With `one_per_day` the name carries today's date.
    pub fn log_file(
        &self,
        filename: impl AsRef<Path>,
        one_per_day: bool,
        data: impl AsRef<[u8]>,
    ) -> Result<PathBuf, FileWriteError> {
        let today = self.inner.clock.now().date_naive();
        self.log_file_on(today, filename, one_per_day, data)
    }

    /// Like [`Logger::log_file`], as of `date` instead of today.
    pub fn log_file_on(
        &self,
        date: NaiveDate,
        filename: impl AsRef<Path>,
        one_per_day: bool,
        data: impl AsRef<[u8]>,
    ) -> Result<PathBuf, FileWriteError> {
        let filename = filename.as_ref();
        let data = data.as_ref();

        match self.write_blob(date, filename, one_per_day, data) {
            Ok(path) => {
                debug!("Wrote {} byte(s) to {}", data.len(), path.display());
                Ok(path)
            }
            Err(e) => {
                warn!("Failed to log file {}: {}", filename.display(), e);
                Err(e)
            }
        }
    }

    /// Path `log_file` would write to today, without writing.
    pub fn resolve_file_path(
        &self,
        filename: impl AsRef<Path>,
        one_per_day: bool,
    ) -> Result<PathBuf, FileWriteError> {
        let today = self.inner.clock.now().date_naive();
        self.resolve_on(today, filename.as_ref(), one_per_day)
    }

    /// Subscribe to sleep/wake/terminate notifications. Repeated calls are no-ops.
    pub fn register_for_system_events(&self) {
        let mut subscription = lock(&self.inner.subscription);
        if subscription.is_some() {
            debug!("Logger already registered for system events");
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let token = self.inner.events.subscribe(Arc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_system_event(event);
            }
        }));
        *subscription = Some(token);
        info!("Logger registered for system events");
    }

    pub fn unregister_for_system_events(&self) {
        if let Some(token) = lock(&self.inner.subscription).take() {
            self.inner.events.unsubscribe(token);
            info!("Logger unregistered from system events");
        }
    }

    pub fn is_registered_for_system_events(&self) -> bool {
        lock(&self.inner.subscription).is_some()
    }

    /// Ask the OS to persist mirror log lines to the device. Each line is
    /// already handed to the OS when it is logged.
    pub fn flush(&self) {
        self.inner.sync_mirror();
    }

    /// Mirror log file currently open, if any line has been written today.
    pub fn current_log_path(&self) -> Option<PathBuf> {
        self.inner
            .mirror
            .as_ref()
            .and_then(|mirror| lock(mirror).current_path().map(Path::to_path_buf))
    }

    fn register_on_creation(&self) {
        if cfg!(feature = "manual-system-events") {
            debug!("Automatic system event registration disabled at build time");
            return;
        }
        if !self.inner.config.register_for_system_events {
            debug!("Automatic system event registration disabled by config");
            return;
        }
        self.register_for_system_events();
    }

    fn resolve_on(
        &self,
        date: NaiveDate,
        filename: &Path,
        one_per_day: bool,
    ) -> Result<PathBuf, FileWriteError> {
        validate_relative_name(filename).map_err(|reason| FileWriteError::InvalidName {
            name: filename.display().to_string(),
            reason,
        })?;

        let name = if one_per_day {
            daily_file_name(filename, date)
        } else {
            filename.to_path_buf()
        };
        Ok(self.inner.paths.files_dir().join(name))
    }

    fn write_blob(
        &self,
        date: NaiveDate,
        filename: &Path,
        one_per_day: bool,
        data: &[u8],
    ) -> Result<PathBuf, FileWriteError> {
        let path = self.resolve_on(date, filename, one_per_day)?;

        let path_lock = self.inner.file_lock(&path);
        let _guard = lock(&path_lock);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| FileWriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let written = match self.inner.config.write_mode {
            WriteMode::Overwrite => fs::write(&path, data),
            WriteMode::Append => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut file| file.write_all(data)),
        };
        written.map_err(|source| FileWriteError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

impl Inner {
    fn record(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: LOG_TARGET, level, "{}", args);

        if level > self.level {
            return;
        }
        let Some(mirror) = &self.mirror else {
            return;
        };

        let message = args.to_string();
        let now = self.clock.now();
        let mut sink = lock(mirror);
        if let Err(e) = sink.write_line(now, level, &message) {
            warn!("Failed to mirror log line: {}", e);
        }
    }

    fn handle_system_event(&self, event: SystemEvent) {
        match event {
            SystemEvent::WillSleep | SystemEvent::WillTerminate => {
                info!("{:?}: syncing log output", event);
                self.sync_mirror();
            }
            SystemEvent::DidWake => {
                let today = self.clock.now().date_naive();
                if let Some(mirror) = &self.mirror {
                    if let Err(e) = lock(mirror).roll_if_stale(today) {
                        warn!("Failed to close previous mirror log: {}", e);
                    }
                }
                self.record(Level::Info, format_args!("System woke from sleep"));
            }
        }
    }

    fn sync_mirror(&self) {
        if let Some(mirror) = &self.mirror {
            if let Err(e) = lock(mirror).sync() {
                warn!("Failed to sync mirror log: {}", e);
            }
        }
    }

    fn file_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = lock(&self.file_locks);
        if locks.len() > MAX_IDLE_FILE_LOCKS {
            locks.retain(|_, l| Arc::strong_count(l) > 1);
        }
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let token = self
            .subscription
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(token) = token {
            self.events.unsubscribe(token);
        }
    }
}

/// Lazily create the logger in `cell`. `build` runs at most once per cell, even
/// under concurrent first access; registration happens on that first build.
fn shared_in(cell: &OnceLock<Logger>, build: impl FnOnce() -> Logger) -> &Logger {
    cell.get_or_init(|| {
        let logger = build();
        logger.register_on_creation();
        logger
    })
}

// Logging must keep working after a panic elsewhere, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RootedPaths;
    use chrono::{DateTime, Local, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct FixedClock(Mutex<DateTime<Local>>);

    impl FixedClock {
        fn new(y: i32, m: u32, d: u32) -> Arc<Self> {
            Arc::new(Self(Mutex::new(
                Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            )))
        }

        fn set_day(&self, d: u32) {
            let mut now = self.0.lock().unwrap();
            *now = Local.with_ymd_and_hms(2026, 10, d, 12, 0, 0).unwrap();
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            *self.0.lock().unwrap()
        }
    }

    fn logger_in(dir: &Path, config: LoggerConfig) -> (Logger, Arc<EventHub>, Arc<FixedClock>) {
        let hub = Arc::new(EventHub::new());
        let clock = FixedClock::new(2026, 10, 18);
        let logger = Logger::builder()
            .config(config)
            .paths(Arc::new(RootedPaths::new(dir)))
            .clock(clock.clone())
            .event_source(hub.clone())
            .build();
        (logger, hub, clock)
    }

    #[test]
    fn plain_file_keeps_its_name_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _, _) = logger_in(dir.path(), LoggerConfig::default());

        let first = logger.log_file("crash", false, b"abc").unwrap();
        assert!(first.ends_with("crash"));
        assert_eq!(fs::read(&first).unwrap(), b"abc");

        let second = logger.log_file("crash", false, b"xyz").unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read(&second).unwrap(), b"xyz");
    }

    #[test]
    fn append_mode_accumulates_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig {
            write_mode: WriteMode::Append,
            ..LoggerConfig::default()
        };
        let (logger, _, _) = logger_in(dir.path(), config);

        logger.log_file("crash", false, b"abc").unwrap();
        let path = logger.log_file("crash", false, b"xyz").unwrap();

        assert_eq!(fs::read(path).unwrap(), b"abcxyz");
    }

    #[test]
    fn daily_files_follow_the_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _, clock) = logger_in(dir.path(), LoggerConfig::default());

        let morning = logger.log_file("frames.bin", true, b"1").unwrap();
        let evening = logger.log_file("frames.bin", true, b"2").unwrap();
        assert_eq!(morning, evening);
        assert!(morning.ends_with("frames-2026-10-18.bin"));

        clock.set_day(19);
        let next_day = logger.log_file("frames.bin", true, b"3").unwrap();
        assert_ne!(morning, next_day);
        assert!(next_day.ends_with("frames-2026-10-19.bin"));
        assert_eq!(fs::read(&morning).unwrap(), b"2");
        assert_eq!(fs::read(&next_day).unwrap(), b"3");
    }

    #[test]
    fn nested_names_create_directories_and_empty_payloads_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _, _) = logger_in(dir.path(), LoggerConfig::default());

        let path = logger.log_file("sessions/2/state.json", false, b"").unwrap();

        assert_eq!(path, dir.path().join("files/sessions/2/state.json"));
        assert_eq!(fs::read(path).unwrap(), b"");
    }

    #[test]
    fn invalid_names_are_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _, _) = logger_in(dir.path(), LoggerConfig::default());

        for name in ["", "../escape", "/abs/crash"] {
            let err = logger.log_file(name, false, b"x").unwrap_err();
            assert!(matches!(err, FileWriteError::InvalidName { .. }), "{name}");
        }
        assert!(!dir.path().join("files").exists());
    }

    #[test]
    fn write_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _, _) = logger_in(dir.path(), LoggerConfig::default());
        // A regular file where the files directory should be.
        fs::write(dir.path().join("files"), b"in the way").unwrap();

        let err = logger.log_file("crash", false, b"x").unwrap_err();

        assert!(matches!(
            err,
            FileWriteError::CreateDir { .. } | FileWriteError::Write { .. }
        ));
        assert!(err.path().is_some());
    }

    #[test]
    fn log_writes_one_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _, _) = logger_in(dir.path(), LoggerConfig::default());

        logger.log(format_args!("loaded {} videos from {}", 3, "queue"));
        logger.log_at(Level::Warn, format_args!("muted={}", true));
        logger.flush();

        let path = logger.current_log_path().unwrap();
        assert_eq!(path, dir.path().join("logs/vsaver-2026-10-18.log"));
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] loaded 3 videos from queue"));
        assert!(lines[1].ends_with("[WARN] muted=true"));
    }

    #[test]
    fn log_lines_are_on_disk_before_any_flush() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _, _) = logger_in(dir.path(), LoggerConfig::default());

        logger.log(format_args!("screensaver started"));
        let path = logger.current_log_path().unwrap();
        // Shared loggers live in a static and are never dropped.
        std::mem::forget(logger);

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("screensaver started"));
    }

    #[test]
    fn concurrent_log_calls_never_interleave_lines() {
        const THREADS: usize = 8;
        const LINES: usize = 200;

        let dir = tempfile::tempdir().unwrap();
        let (logger, _, _) = logger_in(dir.path(), LoggerConfig::default());

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let logger = logger.clone();
                thread::spawn(move || {
                    let body = char::from(b'a' + t as u8).to_string().repeat(240);
                    for i in 0..LINES {
                        logger.log(format_args!("t{t} n{i} {body} end"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(logger.current_log_path().unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), THREADS * LINES);
        for line in lines {
            let (_, message) = line.split_once("[INFO] ").unwrap();
            let mut parts = message.split(' ');
            let thread_tag = parts.next().unwrap();
            let t: usize = thread_tag[1..].parse().unwrap();
            let expected_body = char::from(b'a' + t as u8).to_string().repeat(240);
            assert!(parts.next().unwrap().starts_with('n'), "{line}");
            assert_eq!(parts.next(), Some(expected_body.as_str()), "{line}");
            assert_eq!(parts.next(), Some("end"), "{line}");
            assert_eq!(parts.next(), None, "{line}");
        }
    }

    #[test]
    fn lazy_shared_cell_builds_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let hub = Arc::new(EventHub::new());
        let builds = AtomicUsize::new(0);
        let cell: OnceLock<Logger> = OnceLock::new();

        let addresses: Vec<usize> = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(|| {
                        let logger = shared_in(&cell, || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            Logger::builder()
                                .config(LoggerConfig::default())
                                .paths(Arc::new(RootedPaths::new(dir.path())))
                                .event_source(hub.clone())
                                .build()
                        });
                        logger as *const Logger as usize
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
        let expected_subscribers = usize::from(!cfg!(feature = "manual-system-events"));
        assert_eq!(hub.subscriber_count(), expected_subscribers);
    }

    #[test]
    fn records_above_the_level_filter_are_not_mirrored() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig {
            level: "info".to_string(),
            ..LoggerConfig::default()
        };
        let (logger, _, _) = logger_in(dir.path(), config);

        logger.log_at(Level::Debug, format_args!("noise"));
        logger.log(format_args!("signal"));
        logger.flush();

        let content = fs::read_to_string(logger.current_log_path().unwrap()).unwrap();
        assert!(!content.contains("noise"));
        assert!(content.contains("signal"));
    }

    #[test]
    fn mirror_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig {
            mirror_to_file: false,
            ..LoggerConfig::default()
        };
        let (logger, _, _) = logger_in(dir.path(), config);

        logger.log(format_args!("console only"));

        assert!(logger.current_log_path().is_none());
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn registering_twice_keeps_one_subscription() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, hub, _) = logger_in(dir.path(), LoggerConfig::default());

        logger.register_for_system_events();
        logger.register_for_system_events();

        assert!(logger.is_registered_for_system_events());
        assert_eq!(hub.subscriber_count(), 1);

        logger.unregister_for_system_events();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn sleep_event_syncs_the_mirror_log() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, hub, _) = logger_in(dir.path(), LoggerConfig::default());
        logger.register_for_system_events();

        logger.log(format_args!("before sleep"));
        hub.post(SystemEvent::WillSleep);

        let content = fs::read_to_string(logger.current_log_path().unwrap()).unwrap();
        assert!(content.contains("before sleep"));
    }

    #[test]
    fn wake_on_a_new_day_rolls_the_mirror_log() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, hub, clock) = logger_in(dir.path(), LoggerConfig::default());
        logger.register_for_system_events();

        logger.log(format_args!("going to sleep"));
        clock.set_day(20);
        hub.post(SystemEvent::DidWake);
        logger.flush();

        let yesterday = dir.path().join("logs/vsaver-2026-10-18.log");
        let today = dir.path().join("logs/vsaver-2026-10-20.log");
        assert_eq!(logger.current_log_path(), Some(today.clone()));
        assert!(fs::read_to_string(yesterday).unwrap().contains("going to sleep"));
        assert!(
            fs::read_to_string(today)
                .unwrap()
                .contains("System woke from sleep")
        );
    }

    #[test]
    fn dropped_logger_releases_its_subscription() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, hub, _) = logger_in(dir.path(), LoggerConfig::default());
        logger.register_for_system_events();
        assert_eq!(hub.subscriber_count(), 1);

        drop(logger);

        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn one_event_reaches_a_logger_once() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, hub, _) = logger_in(dir.path(), LoggerConfig::default());
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        hub.subscribe(Arc::new(move |event| {
            if event == SystemEvent::DidWake {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        logger.register_for_system_events();
        logger.register_for_system_events();
        hub.post(SystemEvent::DidWake);
        logger.flush();

        assert_eq!(wakes.load(Ordering::SeqCst), 1);
        let content = fs::read_to_string(logger.current_log_path().unwrap()).unwrap();
        assert_eq!(content.matches("System woke from sleep").count(), 1);
    }
}
