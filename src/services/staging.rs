use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// An uploaded image held in a temp file for the lifetime of one request.
///
/// The file is removed by [`StagedImage::release`] or, failing that, when the
/// value is dropped.
#[derive(Debug)]
pub struct StagedImage {
    file: NamedTempFile,
    file_name: String,
    mime_type: String,
}

impl StagedImage {
    /// Stage `bytes` from async code; the file I/O runs on the blocking pool.
    pub async fn stage(
        dir: PathBuf,
        bytes: Vec<u8>,
        mime_type: &str,
        extension: &str,
    ) -> io::Result<Self> {
        let mime_type = mime_type.to_string();
        let extension = extension.to_string();
        tokio::task::spawn_blocking(move || Self::write(&dir, &bytes, &mime_type, &extension))
            .await
            .map_err(io::Error::other)?
    }

    /// Write `bytes` to a fresh temp file in `dir`.
    pub fn write(dir: &Path, bytes: &[u8], mime_type: &str, extension: &str) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;

        let suffix = format!(".{extension}");
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        let file_name = file
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("upload{suffix}"));

        Ok(Self {
            file,
            file_name,
            mime_type: mime_type.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }

    /// Delete the temp file, reporting any failure.
    pub fn release(self) -> io::Result<()> {
        self.file.close()
    }
}
