//! Application state wiring all services together.
//!
//! The dispatcher and registry are generic over their ports; AppState pins
//! them to the SQLite, moka and in-process execution adapters. The resolver
//! and the registry share one lookup cache so registry changes invalidate
//! lookups served by this process.

use std::path::PathBuf;
use std::sync::Arc;

use hookrelay_core::auth::AuthGate;
use hookrelay_core::dispatch::EventDispatcher;
use hookrelay_core::execution::{ErrorReporter, ExecutionLauncher};
use hookrelay_core::node::NodeTypeRegistry;
use hookrelay_core::registry::{EventRegistry, EventResolver};
use hookrelay_infra::auth::default_authenticators;
use hookrelay_infra::cache::MokaLookupCache;
use hookrelay_infra::config::load_global_config;
use hookrelay_infra::execution::{LocalExecutionRunner, SqliteWaitTracker, TracingErrorReporter};
use hookrelay_infra::filesystem::resolve_data_dir;
use hookrelay_infra::sqlite::credential::SqliteCredentialResolver;
use hookrelay_infra::sqlite::event::SqliteEventRepository;
use hookrelay_infra::sqlite::execution::SqliteExecutionStore;
use hookrelay_infra::sqlite::pool::DatabasePool;
use hookrelay_infra::sqlite::workflow::SqliteWorkflowStore;
use hookrelay_types::config::GlobalConfig;

/// Concrete type aliases for the generics pinned to infra implementations.
pub type ConcreteDispatcher = EventDispatcher<
    SqliteEventRepository,
    MokaLookupCache,
    SqliteWorkflowStore,
    SqliteCredentialResolver,
    LocalExecutionRunner,
    SqliteWaitTracker,
>;

pub type ConcreteRegistry = EventRegistry<SqliteEventRepository, MokaLookupCache>;

/// Shared application state.
///
/// Used by both CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: ConcreteDispatcher,
    pub registry: Arc<ConcreteRegistry>,
    pub workflows: Arc<SqliteWorkflowStore>,
    pub credentials: Arc<SqliteCredentialResolver>,
    pub executions: SqliteExecutionStore,
    pub cache: Arc<MokaLookupCache>,
    pub nodes: Arc<NodeTypeRegistry>,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize from the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        Self::open(resolve_data_dir()).await
    }

    /// Connect to the database inside `data_dir`, load `config.toml`, and
    /// wire the dispatcher.
    pub async fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::open(&data_dir).await?;
        let config = load_global_config(&data_dir).await;

        let events = Arc::new(SqliteEventRepository::new(db_pool.clone()));
        let cache = Arc::new(MokaLookupCache::from_config(&config.cache));
        let workflows = Arc::new(SqliteWorkflowStore::new(db_pool.clone()));
        let credentials = Arc::new(SqliteCredentialResolver::new(db_pool.clone()));
        let executions = SqliteExecutionStore::new(db_pool.clone());
        let nodes = Arc::new(NodeTypeRegistry::with_builtin());

        let resolver = EventResolver::new(Arc::clone(&events), Arc::clone(&cache));
        let registry = EventRegistry::new(events, Arc::clone(&cache));

        let gate = AuthGate::new(
            Arc::clone(&credentials),
            default_authenticators(),
            config.dispatch.auth_timeout(),
        );

        let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingErrorReporter);
        let launcher = ExecutionLauncher::new(
            Arc::new(LocalExecutionRunner::new(executions.clone())),
            Arc::new(SqliteWaitTracker::new(executions.clone())),
            reporter,
        );

        let dispatcher = EventDispatcher::new(
            resolver,
            Arc::clone(&workflows),
            gate,
            Arc::clone(&nodes),
            launcher,
            config.dispatch.sync_response_timeout(),
        );

        Ok(Self {
            dispatcher,
            registry: Arc::new(registry),
            workflows,
            credentials,
            executions,
            cache,
            nodes,
            config,
            data_dir,
        })
    }
}
