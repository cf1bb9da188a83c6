// Daily mirror of log records on disk.
//
// One file per local calendar day. The date of the open file is the
// last-written-date marker; the first write on a new day rolls to a new file.

use chrono::{DateTime, Local, NaiveDate};
use log::{Level, debug};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::daily::daily_file_name;

struct OpenLog {
    path: PathBuf,
    date: NaiveDate,
    writer: BufWriter<File>,
}

pub(crate) struct MirrorSink {
    dir: PathBuf,
    stem: String,
    current: Option<OpenLog>,
}

impl MirrorSink {
    pub(crate) fn new(dir: PathBuf, stem: &str) -> Self {
        Self {
            dir,
            stem: stem.to_string(),
            current: None,
        }
    }

    /// Path the mirror log for `date` lives at.
    pub(crate) fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(daily_file_name(Path::new(&format!("{}.log", self.stem)), date))
    }

    pub(crate) fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|open| open.path.as_path())
    }

    /// Append one record and push it to the OS before returning, so a process
    /// that never drops the sink still leaves every line on disk.
    /// Embedded newlines are escaped so a record is one line.
    pub(crate) fn write_line(
        &mut self,
        now: DateTime<Local>,
        level: Level,
        message: &str,
    ) -> io::Result<()> {
        let writer = self.writer_for(now.date_naive())?;
        writeln!(
            writer,
            "{} [{}] {}",
            now.format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            message.replace('\n', "\\n")
        )?;
        writer.flush()
    }

    /// Close the open file if it belongs to an earlier day.
    pub(crate) fn roll_if_stale(&mut self, today: NaiveDate) -> io::Result<()> {
        match self.current.take() {
            Some(open) if open.date == today => {
                self.current = Some(open);
                Ok(())
            }
            Some(mut open) => {
                debug!("Closing mirror log {}", open.path.display());
                open.writer.flush()
            }
            None => Ok(()),
        }
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some(open) => open.writer.flush(),
            None => Ok(()),
        }
    }

    /// Flush and ask the OS to persist the open file's data to the device.
    pub(crate) fn sync(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some(open) => {
                open.writer.flush()?;
                open.writer.get_ref().sync_data()
            }
            None => Ok(()),
        }
    }

    fn writer_for(&mut self, date: NaiveDate) -> io::Result<&mut BufWriter<File>> {
        self.roll_if_stale(date)?;
        let open = match self.current.take() {
            Some(open) => open,
            None => self.open(date)?,
        };
        Ok(&mut self.current.insert(open).writer)
    }

    fn open(&self, date: NaiveDate) -> io::Result<OpenLog> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(date);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened mirror log {}", path.display());
        Ok(OpenLog {
            path,
            date,
            writer: BufWriter::new(file),
        })
    }
}

impl Drop for MirrorSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
