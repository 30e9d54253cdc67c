//! Per-person client-local markers.
//!
//! Small flags such as "welcome already shown" are kept as empty files
//! named `smartfit.<key>.<person>`. By default they live in the per-login
//! runtime directory so they disappear when the login session ends.

use crate::types::PersonId;
use crate::Result;
use std::path::{Path, PathBuf};

/// Marker set once the welcome message has been shown
pub const WELCOME: &str = "welcome";

const PREFIX: &str = "smartfit.";

pub struct MarkerStore {
    dir: PathBuf,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted in the session-scoped runtime directory
    pub fn session_scoped() -> Self {
        let base = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("smartfit"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str, person: PersonId) -> PathBuf {
        self.dir.join(format!("{}{}.{}", PREFIX, key, person))
    }

    pub fn is_marked(&self, key: &str, person: PersonId) -> bool {
        self.path(key, person).exists()
    }

    pub fn mark(&self, key: &str, person: PersonId) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key, person), b"")?;
        tracing::debug!("Set marker {} for {}", key, person);
        Ok(())
    }

    /// Set the marker; true if it was not set before.
    pub fn mark_once(&self, key: &str, person: PersonId) -> Result<bool> {
        if self.is_marked(key, person) {
            return Ok(false);
        }
        self.mark(key, person)?;
        Ok(true)
    }

    pub fn remove(&self, key: &str, person: PersonId) -> Result<()> {
        match std::fs::remove_file(self.path(key, person)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every marker belonging to `person`; returns how many were removed.
    pub fn clear_person(&self, person: PersonId) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let suffix = format!(".{}", person);
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(PREFIX) && name.ends_with(&suffix) {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
