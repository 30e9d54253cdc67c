//! File-backed profile store with file locking.
//!
//! All profiles live in one JSON map keyed by person. Writes go through a
//! temp file and an atomic rename so a crash never leaves a torn file.
//! Every read-modify-write holds an exclusive lock on a sibling
//! `<file>.lock` so concurrent writers never drop each other's records.

use crate::store::ProfileStore;
use crate::types::{PersonId, ProfileRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

type ProfileMap = BTreeMap<PersonId, ProfileRecord>;

/// Profile store kept in a single JSON file
#[derive(Clone, Debug)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Load all profiles with a shared lock
    ///
    /// Returns an empty map if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty map.
    fn load(&self) -> Result<ProfileMap> {
        let path = &self.path;
        if !path.exists() {
            tracing::debug!("No profile file at {:?}", path);
            return Ok(ProfileMap::new());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<ProfileMap>(&contents) {
            Ok(map) => {
                tracing::debug!("Loaded {} profiles from {:?}", map.len(), path);
                Ok(map)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse profile file {:?}: {}. Starting empty.",
                    path,
                    e
                );
                Ok(ProfileMap::new())
            }
        }
    }

    /// Save all profiles atomically
    fn save(&self, map: &ProfileMap) -> Result<()> {
        let path = &self.path;
        let parent = self.parent()?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(map)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} profiles to {:?}", map.len(), path);
        Ok(())
    }

    fn parent(&self) -> Result<&Path> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "profile path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;
        Ok(parent)
    }

    /// Load, modify and save back under the store's exclusive lock
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ProfileMap) -> Result<()>,
    {
        self.parent()?;
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let result = self.load().and_then(|mut map| {
            f(&mut map)?;
            self.save(&map)
        });

        lock.unlock()?;
        result
    }

    /// Run a blocking store operation off the async executor.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(FileProfileStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn fetch_profile(&self, person: PersonId) -> Result<Option<ProfileRecord>> {
        self.blocking(move |store| Ok(store.load()?.remove(&person)))
            .await
    }

    async fn create_profile(&self, record: &ProfileRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |store| {
            store.update(|map| {
                if map.contains_key(&record.person_id) {
                    return Err(Error::Persistence {
                        failed: 1,
                        total: 1,
                        message: format!("profile for {} already exists", record.person_id),
                    });
                }
                map.insert(record.person_id, record.clone());
                Ok(())
            })
        })
        .await
    }

    async fn update_profile(&self, person: PersonId, record: &ProfileRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |store| {
            store.update(|map| match map.get_mut(&person) {
                Some(existing) => {
                    *existing = ProfileRecord {
                        person_id: person,
                        ..record
                    };
                    Ok(())
                }
                None => Err(Error::Persistence {
                    failed: 1,
                    total: 1,
                    message: format!("no profile for {}", person),
                }),
            })
        })
        .await
    }
}

/// Path helper used by the CLI
pub fn profile_path(data_dir: &Path) -> PathBuf {
    data_dir.join("profiles.json")
}
