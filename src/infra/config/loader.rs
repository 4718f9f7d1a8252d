use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::infra::{
    clock::MAX_CONFIG_MILLIS,
    config::{file_config::FileConfig, AppConfig},
    error::AppError,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = AppConfig::default();

    if !config_path.exists() {
        return Ok(config);
    }

    let raw = fs::read_to_string(&config_path).map_err(|source| AppError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;

    let file_config: FileConfig = toml::from_str(&raw).map_err(|source| AppError::ConfigParse {
        path: config_path.clone(),
        source,
    })?;

    file_config.merge_into(&mut config);
    validate_timings(&config, config_path)?;
    Ok(config)
}

fn validate_timings(config: &AppConfig, path: PathBuf) -> Result<(), AppError> {
    let timings = [
        ("presence.typing_window_ms", config.presence.typing_window_ms),
        ("mock.reply_delay_ms", config.mock.reply_delay_ms),
        ("mock.typing_after_ms", config.mock.typing_after_ms),
        (
            "mock.notification_interval_ms",
            config.mock.notification_interval_ms,
        ),
    ];

    match timings
        .into_iter()
        .find(|(_, value)| *value > MAX_CONFIG_MILLIS)
    {
        Some((field, value)) => Err(AppError::ConfigInvalid {
            path,
            field,
            value,
            max: MAX_CONFIG_MILLIS,
        }),
        None => Ok(()),
    }
}
