// Call-site shorthands routed through the shared logger.

/// Log a formatted message through [`Logger::shared`](crate::Logger::shared).
///
/// ```no_run
/// use vsaver_log_core::vss_log;
///
/// vss_log!("queued {} videos", 4);
/// vss_log!(level: log::Level::Warn, "falling back to {}", "defaults");
/// ```
#[macro_export]
macro_rules! vss_log {
    (level: $level:expr, $($arg:tt)+) => {
        $crate::Logger::shared().log_at($level, ::std::format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::Logger::shared().log(::std::format_args!($($arg)+))
    };
}

/// Write `data` to `filename` through the shared logger, keeping one file.
#[macro_export]
macro_rules! vss_log_file {
    ($filename:expr, $data:expr $(,)?) => {
        $crate::Logger::shared().log_file($filename, false, $data)
    };
}

/// Write `data` to today's dated variant of `filename` through the shared logger.
#[macro_export]
macro_rules! vss_log_daily_file {
    ($filename:expr, $data:expr $(,)?) => {
        $crate::Logger::shared().log_file($filename, true, $data)
    };
}
