use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use kb_core::RenderedDocument;
use kb_logging::kb_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Create `dir` and its parents unless it already exists as a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(PersistError::NotADirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Audit copies of rendered documents, one file per kind and day.
///
/// The document is staged in a sibling temp file and renamed over
/// `<dir>/<file_name>`, so a reader sees either the previous artifact or the
/// complete new one.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, document: &RenderedDocument) -> PathBuf {
        self.dir.join(document.file_name())
    }

    pub fn write(&self, document: &RenderedDocument) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let target = self.path_for(document);
        let write_err = |source: io::Error| PersistError::Write {
            path: target.clone(),
            source,
        };

        let mut staged = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        staged
            .write_all(document.text().as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(write_err)?;
        staged
            .persist(&target)
            .map_err(|err| write_err(err.error))?;

        kb_debug!(
            "Wrote {} ({} records, {} bytes)",
            target.display(),
            document.record_count(),
            document.text().len()
        );
        Ok(target)
    }
}

/// Read a previously written artifact in full. The file is closed before
/// this returns.
pub fn read_artifact(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}
