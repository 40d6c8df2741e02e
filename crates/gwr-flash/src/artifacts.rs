//! Trusted artifact directory
//!
//! Firmware images and the transfer tool live in one directory controlled
//! by the operator. Callers pass bare filenames; anything that would
//! resolve outside the directory is rejected before any filesystem or
//! remote I/O happens.

use std::path::{Component, Path, PathBuf};

use crate::error::{FlashError, FlashResult};

/// Required extension for firmware images
pub const FIRMWARE_EXT: &str = "gbl";

/// Companion transfer tool shipped alongside the firmware images
pub const TRANSFER_TOOL: &str = "sx.bin";

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Enumerate regular files in the store, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut files: Vec<String> = entries
            .flatten()
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        files.sort();
        files
    }

    /// Reject anything but a single bare path component (no separators,
    /// no `..`), lexically, before any other check considers the name.
    fn require_bare_filename(filename: &str) -> FlashResult<()> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(FlashError::PathSecurity(filename.to_string())),
        }
    }

    /// Resolve a bare filename inside the store.
    pub fn resolve(&self, filename: &str) -> FlashResult<PathBuf> {
        Self::require_bare_filename(filename)?;

        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(FlashError::ArtifactNotFound(filename.to_string()));
        }
        Ok(path)
    }

    /// Resolve a firmware image: same rules as [`resolve`](Self::resolve)
    /// plus the required extension. Path security wins over every other
    /// complaint: an escaping name reports `PathSecurity` even when the
    /// extension is also wrong.
    pub fn resolve_firmware(&self, filename: &str) -> FlashResult<PathBuf> {
        Self::require_bare_filename(filename)?;

        let has_ext = Path::new(filename)
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(FIRMWARE_EXT));
        if !has_ext {
            return Err(FlashError::Validation(format!(
                "firmware image must have .{} extension: {}",
                FIRMWARE_EXT, filename
            )));
        }
        self.resolve(filename)
    }
}
