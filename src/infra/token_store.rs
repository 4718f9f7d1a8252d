use std::{
    fs::{self, File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs2::FileExt;

use crate::infra::{contracts::TokenStore, error::AppError};

/// Stores each key as `<dir>/<key>.token`, serializing writers through an
/// advisory lock on `<dir>/<key>.lock`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn token_path(&self, key: &str) -> Result<PathBuf, AppError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.token")))
    }

    fn lock(&self, key: &str) -> Result<File, AppError> {
        fs::create_dir_all(&self.dir).map_err(|source| AppError::StorageDirCreate {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(format!("{key}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| AppError::TokenIo {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| AppError::TokenIo { path, source })?;

        Ok(file)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.token_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let value = raw.trim();
                Ok((!value.is_empty()).then(|| value.to_owned()))
            }
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(AppError::TokenIo { path, source }.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.token_path(key)?;
        let lock = self.lock(key)?;

        let staging = path.with_extension("token.tmp");
        fs::write(&staging, value).map_err(|source| AppError::TokenIo {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| AppError::TokenIo {
            path: path.clone(),
            source,
        })?;

        let _ = FileExt::unlock(&lock);
        tracing::debug!(key, path = %path.display(), "session token persisted");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.token_path(key)?;
        let lock = self.lock(key)?;

        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(source) if source.kind() == ErrorKind::NotFound => false,
            Err(source) => return Err(AppError::TokenIo { path, source }.into()),
        };

        let _ = FileExt::unlock(&lock);
        Ok(removed)
    }
}

fn validate_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidTokenKey {
            key: key.to_owned(),
        })
    }
}
