//! Rotating side-channel file.
//!
//! Layout inside the save directory:
//! ```text
//! <name>.dat       - current generation (zstd-compressed NBT document)
//! <name>.dat_old   - previous generation
//! <name>.dat_new   - next generation, present only mid-save
//! ```

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::document::SideChannelRoot;

/// Errors from reading or writing the side-channel file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("NBT error: {0}")]
    Nbt(#[from] fastnbt::error::Error),
}

/// Save steps, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RotationStep {
    WriteNew,
    DeleteOld,
    BackupCurrent,
    PromoteNew,
}

/// The side-channel file of one save directory.
#[derive(Debug, Clone)]
pub struct SideChannelStore {
    dir: PathBuf,
    name: String,
}

impl SideChannelStore {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.dat", self.name))
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(format!("{}.dat_old", self.name))
    }

    pub fn staging_path(&self) -> PathBuf {
        self.dir.join(format!("{}.dat_new", self.name))
    }

    /// Read the newest readable generation.
    ///
    /// Falls back to `.dat_old` when `.dat` is missing or unreadable.
    /// Returns `None` when neither file exists.
    pub fn load(&self) -> Result<Option<SideChannelRoot>, StoreError> {
        let current = self.current_path();
        let primary_error = match read_document(&current) {
            Ok(Some(root)) => return Ok(Some(root)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    path = %current.display(),
                    error = %e,
                    "side-channel file unreadable, trying backup"
                );
                Some(e)
            }
        };

        let backup = self.backup_path();
        match read_document(&backup) {
            Ok(Some(root)) => {
                tracing::info!(path = %backup.display(), "loaded side-channel data from backup");
                Ok(Some(root))
            }
            Ok(None) => match primary_error {
                Some(e) => Err(e),
                None => Ok(None),
            },
            Err(e) => Err(primary_error.unwrap_or(e)),
        }
    }

    /// Write `root` as the new current generation.
    pub fn try_save(&self, root: &SideChannelRoot) -> Result<(), StoreError> {
        self.rotate(root, |_| true)
    }

    /// Best-effort save: failures are logged and reported as `false`.
    pub fn save(&self, root: &SideChannelRoot) -> bool {
        match self.try_save(root) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    path = %self.current_path().display(),
                    error = %e,
                    "failed to save side-channel data"
                );
                false
            }
        }
    }

    /// Run the save steps in order. `proceed` is asked after each step and
    /// stops the save without error when it returns `false`.
    pub(crate) fn rotate(
        &self,
        root: &SideChannelRoot,
        mut proceed: impl FnMut(RotationStep) -> bool,
    ) -> Result<(), StoreError> {
        let staging = self.staging_path();
        let backup = self.backup_path();
        let current = self.current_path();

        let bytes = zstd_compress(&fastnbt::to_bytes(root)?)?;
        std::fs::write(&staging, &bytes)?;
        tracing::debug!(path = %staging.display(), bytes = bytes.len(), "wrote staging file");
        if !proceed(RotationStep::WriteNew) {
            return Ok(());
        }

        remove_if_exists(&backup)?;
        if !proceed(RotationStep::DeleteOld) {
            return Ok(());
        }

        if current.exists() {
            std::fs::rename(&current, &backup)?;
            tracing::debug!(
                from = %current.display(),
                to = %backup.display(),
                "rotated current generation"
            );
        }
        if !proceed(RotationStep::BackupCurrent) {
            return Ok(());
        }

        std::fs::rename(&staging, &current)?;
        tracing::debug!(path = %current.display(), "promoted staging file");
        proceed(RotationStep::PromoteNew);
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<Option<SideChannelRoot>, StoreError> {
    let compressed = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let raw = zstd_decompress(&compressed)?;
    Ok(Some(fastnbt::from_bytes(&raw)?))
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}
