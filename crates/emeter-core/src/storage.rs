//! Archive file lifecycle.
//!
//! Streams into `<dest>.part`, syncs, then renames to the final name so a
//! crash mid-stream never leaves a file that looks like a finished archive.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `car_201.zip` → `car_201.zip.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Sequential writer for one archive download.
pub struct ArchiveWriter {
    out: BufWriter<File>,
    temp_path: PathBuf,
    written: u64,
}

impl ArchiveWriter {
    /// Create (or truncate) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            out: BufWriter::new(file),
            temp_path,
            written: 0,
        })
    }

    /// Append one chunk.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, sync, and atomically rename the temp file to `final_path`.
    /// Consumes the writer and closes the file.
    pub fn finalize(self, final_path: &Path) -> io::Result<u64> {
        let file = self.out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&self.temp_path, final_path)?;
        Ok(self.written)
    }
}
