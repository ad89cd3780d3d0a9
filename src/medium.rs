use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::errors::MediumError;
use crate::{ExchangeError, ExchangeRecord, Result};

/// File name of the loopback record inside the temp directory.
pub const LOOPBACK_FILENAME: &str = "duet_loopback.json";

const TMP_PREFIX: &str = ".duet_tmp_";

/// Scratch file next to the record. Removed on drop unless it has been
/// renamed into place.
struct TmpFile {
    file: File,
    path: PathBuf,
}

impl TmpFile {
    fn create_in(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let suffix: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(10)
            .collect();
        let path = dir
            .as_ref()
            .join(format!("{TMP_PREFIX}{suffix}"));
        let file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)?;
        Ok(Self { file, path })
    }

    fn persist(self, target: &Path) -> std::io::Result<()> {
        self.file.sync_data()?;
        fs::rename(&self.path, target)
    }
}

impl std::io::Write for &TmpFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        (&self.file).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (&self.file).flush()
    }
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        // Already gone after a successful rename.
        let _ = fs::remove_file(&self.path);
    }
}

/// A well-known file both parties poll.
///
/// Every write replaces the whole record through a rename, so a reader
/// sees either the previous record or the new one and never a torn write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedMedium {
    path: PathBuf,
}

impl SharedMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `duet_loopback.json` in the platform temp directory.
    pub fn loopback_path() -> PathBuf {
        std::env::temp_dir().join(LOOPBACK_FILENAME)
    }

    pub fn loopback() -> Self {
        Self::new(Self::loopback_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Read the current record.
    ///
    /// `Ok(None)` means nobody has written yet: the directory exists but
    /// the file does not. A missing directory, any other IO failure or
    /// malformed content is an error.
    pub fn read(&self) -> Result<Option<ExchangeRecord>> {
        match fs::read(&self.path) {
            Ok(content) => self.parse(&content).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.directory().is_dir() {
                    return Ok(None);
                }
                Err(self.fail(e))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Read a record this process has already written.
    ///
    /// The file must exist: once published, a missing record means the
    /// medium was lost.
    pub fn read_published(&self) -> Result<ExchangeRecord> {
        let content = fs::read(&self.path).map_err(|e| self.fail(e))?;
        self.parse(&content)
    }

    fn parse(&self, content: &[u8]) -> Result<ExchangeRecord> {
        serde_json::from_slice(content).map_err(|e| self.fail(e))
    }

    /// Replace the record on disk with `record`.
    pub fn write(&self, record: &ExchangeRecord) -> Result<()> {
        let tmp =
            TmpFile::create_in(self.directory()).map_err(|e| self.fail(e))?;
        let mut writer = BufWriter::new(&tmp);
        serde_json::to_writer(&mut writer, record)
            .map_err(|e| self.fail(e))?;
        writer.flush().map_err(|e| self.fail(e))?;
        drop(writer);
        tmp.persist(&self.path)
            .map_err(|e| self.fail(e))?;

        log::debug!("wrote exchange record to {}", self.path.display());
        Ok(())
    }

    fn fail(&self, source: impl Into<MediumError>) -> ExchangeError {
        ExchangeError::medium(&self.path, source)
    }
}

impl Default for SharedMedium {
    fn default() -> Self {
        Self::loopback()
    }
}
