//! Transient spooling of uploaded files.
//!
//! An upload exists on local disk only for the duration of one request. The
//! guard removes the file when dropped, so every exit path of a handler,
//! including early returns and panics, leaves the upload directory clean.

use gateway_core::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub struct SpooledFile {
    path: PathBuf,
    file: Option<fs::File>,
}

impl SpooledFile {
    /// Open a fresh spool file under a generated name inside `upload_dir`.
    ///
    /// The spool name is always `<uuid>.pdf`, never derived from the client
    /// filename, and the resulting path is verified to stay inside the
    /// canonicalized upload directory.
    pub async fn create(upload_dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(upload_dir).await?;
        let dir = fs::canonicalize(upload_dir).await?;

        let name = format!("{}.pdf", Uuid::new_v4().simple());
        let path = dir.join(&name);
        if !path.starts_with(&dir) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid upload path"
            )));
        }

        let file = fs::File::create(&path).await?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Append one chunk of the incoming upload.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), AppError> {
        match self.file.as_mut() {
            Some(file) => {
                file.write_all(chunk).await?;
                Ok(())
            }
            None => Err(AppError::InternalError(anyhow::anyhow!(
                "spool file already finished"
            ))),
        }
    }

    /// Flush and close the write handle. The file stays on disk for the
    /// relay and is still removed when the guard drops.
    pub async fn finish(&mut self) -> Result<(), AppError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        // Drop the write handle before unlinking.
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            // Already gone; nothing to clean up.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to delete spooled upload"
                );
            }
        }
    }
}
