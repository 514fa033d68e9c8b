//! Scoped output file: content lands in a temporary sibling and only replaces
//! the destination on [`OutputSink::commit`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// A destination file being written.
///
/// Dropping a sink without committing it removes the temporary file, so a
/// failed generation run leaves existing outputs untouched.
pub struct OutputSink {
    target: PathBuf,
    temp: NamedTempFile,
}

impl OutputSink {
    /// Open a sink for `target`, creating its parent directories.
    pub fn create(target: &Path) -> io::Result<Self> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        let temp = NamedTempFile::new_in(&parent)?;
        Ok(Self {
            target: target.to_path_buf(),
            temp,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write_str(&mut self, content: &str) -> io::Result<()> {
        self.temp.write_all(content.as_bytes())
    }

    /// Flush and move the content into place.
    pub fn commit(mut self) -> io::Result<PathBuf> {
        self.temp.flush()?;
        self.temp.as_file().sync_all()?;
        self.temp.persist(&self.target).map_err(|e| e.error)?;
        Ok(self.target)
    }
}
