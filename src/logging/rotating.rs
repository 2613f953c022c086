// file: src/logging/rotating.rs
// description: size based rotating log file writer with numbered backups
// reference: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/trait.MakeWriter.html

use crate::error::{Result, UtilitiesError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Appends to `path` and rolls it over to `path.1`, `path.2`, ... once the
/// next write would reach `max_bytes`. Rotation is disabled when either
/// `max_bytes` or `backup_count` is zero.
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    state: Mutex<FileState>,
}

#[derive(Debug)]
struct FileState {
    file: File,
    size: u64,
}

impl RotatingFileWriter {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let size = file
            .metadata()
            .map_err(|source| UtilitiesError::FileOperation {
                path: path.clone(),
                source,
            })?
            .len();

        Ok(Self {
            path,
            max_bytes,
            backup_count,
            state: Mutex::new(FileState { file, size }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn should_roll_over(&self, state: &FileState, incoming: usize) -> bool {
        self.max_bytes > 0
            && self.backup_count > 0
            && state.size > 0
            && state.size + incoming as u64 >= self.max_bytes
    }

    fn staged_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".rotating");
        PathBuf::from(name)
    }

    fn roll_over(&self, state: &mut FileState) -> io::Result<()> {
        self.roll_over_with(state, reopen_append)
    }

    /// The full file is moved aside before the fresh one is opened; if the
    /// open fails it is moved back so `state.file` keeps naming `self.path`.
    fn roll_over_with(
        &self,
        state: &mut FileState,
        open: impl Fn(&Path) -> io::Result<File>,
    ) -> io::Result<()> {
        state.file.flush()?;

        let staged = self.staged_path();
        fs::rename(&self.path, &staged)?;
        let fresh = match open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                fs::rename(&staged, &self.path)?;
                return Err(e);
            }
        };
        state.file = fresh;
        state.size = 0;

        for index in (1..self.backup_count).rev() {
            let source = self.backup_path(index);
            if source.exists() {
                let target = self.backup_path(index + 1);
                if target.exists() {
                    fs::remove_file(&target)?;
                }
                fs::rename(&source, &target)?;
            }
        }

        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        fs::rename(&staged, &first)
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("rotating log file lock poisoned"))?;

        if self.should_roll_over(&state, buf.len()) {
            self.roll_over(&mut state)?;
        }

        state.file.write_all(buf)?;
        state.size += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush_file(&self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("rotating log file lock poisoned"))?;
        state.file.flush()
    }
}

fn reopen_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn open_append(path: &Path) -> Result<File> {
    reopen_append(path).map_err(|source| UtilitiesError::FileOperation {
        path: path.to_path_buf(),
        source,
    })
}

/// Per-event handle handed out by [`MakeWriter`]; the fmt layer writes one
/// formatted record through it.
#[derive(Debug)]
pub struct RotatingFileHandle<'a> {
    writer: &'a RotatingFileWriter,
}

impl Write for RotatingFileHandle<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write_record(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush_file()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileHandle<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingFileHandle { writer: self }
    }
}
