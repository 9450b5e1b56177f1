use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    RonDe(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonSer(#[from] ron::Error),
    #[error("file not found: {0}")]
    NotFound(String),
}

/// Where saves and settings go. Names are relative to the store.
pub trait FileStore {
    fn is_file_exists(&self, name: &str) -> bool;

    fn create_folder(&self, name: &str) -> Result<(), PersistError>;

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), PersistError>;

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, PersistError>;

    /// File name for `name` with a kind suffix, e.g. `settings.config`.
    fn get_name(&self, name: &str, suffix: &str) -> String {
        format!("{}.{}", name, suffix)
    }
}

/// A [`FileStore`] writing pretty RON files under a base directory.
#[derive(Debug, Clone)]
pub struct RonFileStore {
    base_path: PathBuf,
}

impl RonFileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{}.ron", name))
    }
}

impl FileStore for RonFileStore {
    fn is_file_exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn create_folder(&self, name: &str) -> Result<(), PersistError> {
        fs::create_dir_all(self.base_path.join(name))?;
        Ok(())
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), PersistError> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(data, ron::ser::PrettyConfig::default())?;
        fs::write(&path, text)?;
        tracing::debug!(path = %path.display(), "saved");
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, PersistError> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(PersistError::NotFound(path.display().to_string()));
        }
        let text = fs::read_to_string(&path)?;
        Ok(ron::from_str(&text)?)
    }
}
