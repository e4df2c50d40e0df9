//! Destinations for a finished artifact.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;

use crate::artifact::ModelArtifact;
use crate::error::{Error, Result};

/// Receives the artifact at the very end of a successful training run.
pub trait ArtifactSink {
    fn persist(&mut self, artifact: &ModelArtifact) -> Result<()>;

    /// Where the artifact ended up, for reporting.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Writes the artifact to a file, creating the parent directory if needed.
///
/// The bytes go to a temporary file next to the destination, which is then renamed over
/// it. A failed write never leaves a truncated artifact behind, and a prior artifact at
/// the same path stays intact until the rename.
///
/// Two trainings must not write to the same path at the same time. Each rename is atomic,
/// so readers always see one complete artifact, but the last rename wins and the other
/// run's model is silently replaced.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_err(&self, source: std::io::Error) -> Error {
        Error::Persist {
            path: self.path.clone(),
            source,
        }
    }
}

impl ArtifactSink for FileSink {
    fn persist(&mut self, artifact: &ModelArtifact) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.persist_err(e))?;

        let tmp = NamedTempFile::new_in(&dir).map_err(|e| self.persist_err(e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            artifact.to_writer(&mut writer)?;
            writer.flush().map_err(|e| self.persist_err(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.persist_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.persist_err(e.error))?;

        info!("Wrote artifact to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Keeps the serialized artifact in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    bytes: Option<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized artifact, if one has been persisted.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        self.bytes
    }
}

impl ArtifactSink for MemorySink {
    fn persist(&mut self, artifact: &ModelArtifact) -> Result<()> {
        self.bytes = Some(artifact.to_bytes()?);
        Ok(())
    }
}
