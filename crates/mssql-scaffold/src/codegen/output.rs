//! Output files for generated migrations.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::Result;

/// A buffered, writable migration source file.
///
/// Callers must [`close`](MigrationFile::close) the file on every path,
/// including after a failed write, so buffered text reaches the disk.
pub struct MigrationFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl MigrationFile {
    /// Create (or truncate) a file.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        debug!("Writing {}", path.display());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub async fn write_str(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        Ok(())
    }

    /// Flush buffered text and release the handle.
    pub async fn close(mut self) -> Result<PathBuf> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(self.path)
    }
}

/// Write a whole file from one rendered string.
pub async fn write_file(path: impl AsRef<Path>, contents: &str) -> Result<PathBuf> {
    let mut file = MigrationFile::create(path).await?;
    let written = file.write_str(contents).await;
    let closed = file.close().await;
    written?;
    closed
}
