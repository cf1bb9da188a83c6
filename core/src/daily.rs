//! Date-derived file naming for once-per-day output.

use chrono::NaiveDate;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Format embedded in every daily file name. Changing it orphans older files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Insert `-YYYY-MM-DD` before the extension of the last path component.
///
/// `crash` becomes `crash-2026-10-18` and `reports/crash.json` becomes
/// `reports/crash-2026-10-18.json`. Dot files such as `.history` keep the
/// whole name as the stem.
pub fn daily_file_name(name: &Path, date: NaiveDate) -> PathBuf {
    let stamp = date.format(DATE_FORMAT).to_string();

    let mut dated = OsString::new();
    if let Some(stem) = name.file_stem() {
        dated.push(stem);
    }
    dated.push("-");
    dated.push(&stamp);
    if let Some(ext) = name.extension() {
        dated.push(".");
        dated.push(ext);
    }

    name.with_file_name(dated)
}

/// Reasons a caller supplied name cannot be used below the files directory.
pub(crate) fn validate_relative_name(name: &Path) -> Result<(), &'static str> {
    if name.as_os_str().is_empty() {
        return Err("name is empty");
    }
    if name.file_name().is_none() {
        return Err("name has no file component");
    }
    for component in name.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err("name escapes the files directory"),
            Component::RootDir | Component::Prefix(_) => return Err("name must be relative"),
        }
    }
    Ok(())
}
