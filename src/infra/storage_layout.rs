use std::{env, fs, path::PathBuf};

use crate::infra::error::AppError;

const APP_DIR_NAME: &str = "vibechat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub config_dir: PathBuf,
    pub session_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl StorageLayout {
    pub fn resolve() -> Result<Self, AppError> {
        let config_base = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .ok_or_else(|| AppError::StoragePathResolution {
                details: "unable to resolve config base directory (XDG_CONFIG_HOME/platform default)"
                    .into(),
            })?;

        Ok(Self::under(config_base))
    }

    pub fn under(config_base: PathBuf) -> Self {
        let config_dir = config_base.join(APP_DIR_NAME);
        let session_dir = config_dir.join("session");
        let log_dir = config_dir.join("logs");

        Self {
            config_dir,
            session_dir,
            log_dir,
        }
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [&self.config_dir, &self.session_dir, &self.log_dir] {
            fs::create_dir_all(dir).map_err(|source| AppError::StorageDirCreate {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn token_dir(&self) -> PathBuf {
        self.session_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env_lock;

    #[test]
    fn session_and_logs_are_under_config_dir() {
        let layout = StorageLayout::under(PathBuf::from("/tmp/xdg"));

        assert_eq!(layout.config_dir, PathBuf::from("/tmp/xdg/vibechat"));
        assert!(layout.session_dir.starts_with(&layout.config_dir));
        assert!(layout.log_dir.starts_with(&layout.config_dir));
    }

    #[test]
    fn resolve_prefers_xdg_config_home() {
        let _guard = env_lock();
        let dir = tempfile::tempdir().expect("temp dir should be created");

        let old_xdg = env::var_os("XDG_CONFIG_HOME");
        // SAFETY: env is guarded by process-wide test mutex.
        unsafe { env::set_var("XDG_CONFIG_HOME", dir.path()) };

        let layout = StorageLayout::resolve().expect("layout should resolve");
        layout.ensure_dirs().expect("dirs should be created");

        assert_eq!(layout.config_dir, dir.path().join("vibechat"));
        assert!(layout.session_dir.is_dir());

        match old_xdg {
            // SAFETY: restoring env while guard is held.
            Some(value) => unsafe { env::set_var("XDG_CONFIG_HOME", value) },
            // SAFETY: restoring env while guard is held.
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }
    }
}
