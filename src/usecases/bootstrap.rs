use std::{path::Path, sync::Arc};

use crate::{
    backend::MockBackend,
    infra::{
        self,
        alerts::ConsoleAlerts,
        clock::{Clock, SystemClock},
        config::{AppConfig, FileConfigAdapter},
        contracts::ConfigAdapter,
        error::AppError,
        storage_layout::StorageLayout,
        token_store::FileTokenStore,
    },
    usecases::context::{AppContext, Collaborators},
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = load_config(config_path)?;
    infra::logging::init(&config.logging)?;

    let layout = StorageLayout::resolve()?;
    layout.ensure_dirs()?;

    Ok(build_context(config, &layout))
}

fn load_config(config_path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_adapter = FileConfigAdapter::new(config_path);
    config_adapter.load().map_err(AppError::Other)
}

fn build_context(config: AppConfig, layout: &StorageLayout) -> AppContext {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = MockBackend::new(clock.clone(), config.mock.clone());

    let collaborators = Collaborators {
        auth: Arc::new(backend.clone()),
        transport: Arc::new(backend.clone()),
        chats: Arc::new(backend),
        tokens: Arc::new(FileTokenStore::new(layout.token_dir())),
        permissions: Arc::new(ConsoleAlerts::new(config.notifications.os_alerts)),
        clock,
    };

    AppContext::new(config, collaborators)
}
