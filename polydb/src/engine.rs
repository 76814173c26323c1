//! The engine facade: constructs and owns every collaborator (catalog,
//! lock manager, transaction coordinator, data migrator, DDL orchestrator,
//! router) and is the single entry point a CLI or an embedder drives.

use std::path::Path;
use std::sync::Arc;

use catalog::{Adapter, Catalog};
use catalog_types::AdapterId;
use ddl::DdlOrchestrator;
use lock_manager::LockManager;
use metric::Registry;
use migrator::DataMigrator;
use observability_deps::tracing::info;
use poly_time::{SystemProvider, TimeProviderRef};
use router::{Router, RouterPolicy};
use txn::TransactionCoordinator;

use crate::config::EngineConfig;
use crate::error::{CatalogIoSnafu, Result};

/// Every collaborator wired together behind `Arc`s, so a handle can be
/// cloned cheaply and shared across concurrent statements the way
/// `Catalog` itself is.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    catalog: Arc<Catalog>,
    locks: Arc<LockManager>,
    coordinator: Arc<TransactionCoordinator>,
    migrator: Arc<DataMigrator>,
    ddl: Arc<DdlOrchestrator>,
    router: Arc<Router>,
}

impl Engine {
    /// Build a fresh engine over an empty catalog, or the one persisted at
    /// `config.catalog_path` if that file exists.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock_and_metrics(config, Arc::new(SystemProvider::new()), &Registry::new())
    }

    pub fn with_clock_and_metrics(config: EngineConfig, clock: TimeProviderRef, metrics: &Registry) -> Result<Self> {
        config.validate()?;

        let catalog = Arc::new(Catalog::new());
        if let Some(path) = &config.catalog_path {
            if Path::new(path).exists() {
                let snapshot = load_snapshot(path)?;
                catalog.publish(snapshot);
                info!(%path, "loaded persisted catalog");
            }
        }

        let locks = Arc::new(LockManager::new(clock, metrics));
        let coordinator = Arc::new(TransactionCoordinator::new(Arc::clone(&catalog), Arc::clone(&locks)));
        let migrator = Arc::new(DataMigrator::with_batch_size(Arc::clone(&catalog), config.data_migrator_batch_size));
        let ddl = Arc::new(DdlOrchestrator::new(Arc::clone(&catalog), Arc::clone(&coordinator), Arc::clone(&migrator)));
        let policy = if config.policy_enabled { RouterPolicy::FullReplication } else { RouterPolicy::Icarus };
        let router = Arc::new(Router::new(policy));

        Ok(Self {
            config: Arc::new(config),
            catalog,
            locks,
            coordinator,
            migrator,
            ddl,
            router,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn locks(&self) -> &Arc<LockManager> {
        &self.locks
    }

    pub fn coordinator(&self) -> &Arc<TransactionCoordinator> {
        &self.coordinator
    }

    pub fn migrator(&self) -> &Arc<DataMigrator> {
        &self.migrator
    }

    pub fn ddl(&self) -> &Arc<DdlOrchestrator> {
        &self.ddl
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Register a live adapter handle, applying its configured JSON blob
    /// is the adapter's own job; the engine only hands the handle to the
    /// catalog so the DDL orchestrator and migrator can reach it.
    pub fn register_adapter(&self, id: AdapterId, handle: Arc<dyn Adapter>) {
        self.catalog.register_adapter(id, handle);
    }

    /// Every lock currently blocked on another, for visualizing or
    /// debugging the wait-for graph.
    pub fn debug_wait_for_edges(&self) -> Vec<(catalog_types::TransactionId, catalog_types::TransactionId)> {
        self.locks.debug_wait_for_edges()
    }

    /// Persist the current snapshot to `config.catalog_path`. A no-op
    /// (returns `Ok`) when no path is configured.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.config.catalog_path else {
            return Ok(());
        };
        let snapshot = self.catalog.current_snapshot();
        let bytes = catalog::persist::serialize(&snapshot);
        std::fs::write(path, &bytes).map_err(|source| {
            CatalogIoSnafu { path: path.clone(), message: source.to_string() }.build()
        })?;
        info!(%path, generation = snapshot.generation(), "persisted catalog");
        Ok(())
    }
}

fn load_snapshot(path: &str) -> Result<catalog::Snapshot> {
    let bytes = std::fs::read(path).map_err(|source| CatalogIoSnafu { path: path.to_string(), message: source.to_string() }.build())?;
    catalog::persist::deserialize(bytes::Bytes::from(bytes)).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::NamespaceKind;

    #[tokio::test]
    async fn engine_round_trips_a_namespace_through_a_persisted_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.bin");
        let path_str = path.to_str().unwrap().to_string();

        {
            let engine = Engine::new(EngineConfig { catalog_path: Some(path_str.clone()), ..EngineConfig::default() }).unwrap();
            engine
                .ddl()
                .create_namespace("public", NamespaceKind::Relational, "admin", false)
                .await
                .unwrap();
            engine.persist().unwrap();
        }

        let reloaded = Engine::new(EngineConfig { catalog_path: Some(path_str), ..EngineConfig::default() }).unwrap();
        let snapshot = reloaded.catalog().current_snapshot();
        let namespace = snapshot.namespace_by_name("public").unwrap();
        pretty_assertions::assert_eq!(namespace.name, "public");
    }

    #[test]
    fn icarus_policy_selected_when_policy_manager_disabled() {
        let engine = Engine::new(EngineConfig { policy_enabled: false, ..EngineConfig::default() }).unwrap();
        assert_eq!(engine.router().policy(), RouterPolicy::Icarus);
    }
}
