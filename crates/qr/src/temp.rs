//! Scoped temporary storage for uploaded scan images.
//!
//! Uploaded QR photos are spooled to disk before decoding. The guard owns
//! the file for the duration of one request and removes it when dropped,
//! so cleanup happens on every exit path: success, decode failure, a
//! downstream error, or the request future being cancelled mid-flight.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::QrError;

/// A temporary on-disk image, deleted when the guard is dropped.
pub struct TempImage {
    file: NamedTempFile,
}

impl TempImage {
    /// Spool `bytes` into a fresh temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::Io`] if the file cannot be created or written.
    pub fn spool(bytes: &[u8]) -> Result<Self, QrError> {
        let mut file = tempfile::Builder::new()
            .prefix("qr-upload-")
            .suffix(".png")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        debug!(path = %file.path().display(), bytes = bytes.len(), "spooled upload");
        Ok(Self { file })
    }

    /// Path of the spooled image for the lifetime of this guard.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn spool_writes_bytes() {
        let guard = TempImage::spool(b"hello").unwrap();
        let read_back = std::fs::read(guard.path()).unwrap();
        assert_eq!(read_back, b"hello");
    }

    #[test]
    fn file_removed_on_drop() {
        let path: PathBuf = {
            let guard = TempImage::spool(b"payload").unwrap();
            guard.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn file_removed_even_when_processing_panics() {
        let path = std::sync::Arc::new(std::sync::Mutex::new(PathBuf::new()));
        let path_clone = path.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let guard = TempImage::spool(b"payload").unwrap();
            *path_clone.lock().unwrap() = guard.path().to_path_buf();
            panic!("simulated decode failure");
        }));

        assert!(result.is_err());
        assert!(!path.lock().unwrap().exists());
    }
}
