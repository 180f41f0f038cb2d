//! Wiring of store, registry and reconciler for one CLI invocation

use std::path::Path;
use std::sync::Arc;

use cmdsync_core::clock::SystemClock;
use cmdsync_core::errors::ExError;
use cmdsync_core::registry::CommandRegistry;
use cmdsync_core::remote::RemoteCommandApi;
use cmdsync_core::router::InteractionRouter;
use cmdsync_core::settings::SettingsCatalog;
use cmdsync_core::store::VersionStore;
use cmdsync_engine::Reconciler;
use cmdsync_store::SqliteVersionStore;

use crate::catalog;
use crate::config::AppConfig;

pub struct App {
    pub store: Arc<dyn VersionStore>,
    pub registry: Arc<CommandRegistry>,
    pub router: InteractionRouter,
    pub reconciler: Arc<Reconciler>,
}

impl App {
    /// Open the database and register the built-in catalog
    ///
    /// # Errors
    ///
    /// `Persistence` if the database cannot be opened or migrated.
    pub fn open(
        config: &AppConfig,
        db_path: &str,
        remote: Arc<dyn RemoteCommandApi>,
    ) -> Result<Self, ExError> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ExError::new(cmdsync_core::errors::ExErrorKind::Io)
                        .with_op("create_db_dir")
                        .with_message(e.to_string())
                })?;
            }
        }

        let store: Arc<dyn VersionStore> = Arc::new(SqliteVersionStore::open(db_path)?);
        let registry = Arc::new(CommandRegistry::new(Arc::new(SettingsCatalog::new())));
        catalog::register_builtin(&registry, store.clone());
        let router = InteractionRouter::new();
        catalog::register_settings_interactions(
            &router,
            registry.settings().clone(),
            store.clone(),
        );

        let reconciler = Arc::new(Reconciler::new(
            config.sync.clone(),
            registry.clone(),
            store.clone(),
            remote,
            Arc::new(SystemClock),
        ));
        catalog::register_reload(&reconciler);

        Ok(Self {
            store,
            registry,
            router,
            reconciler,
        })
    }
}
