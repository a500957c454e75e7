use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::tasks::orchestrator::TaskOrchestrator;
use crate::tasks::store::TaskStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    /// The one task registry; shared with the orchestrator and the sweeper.
    pub tasks: Arc<TaskStore>,
    pub orchestrator: Arc<TaskOrchestrator>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> Self {
        let tasks = Arc::new(TaskStore::new());
        let orchestrator = Arc::new(TaskOrchestrator::new(Arc::clone(&tasks)));
        Self {
            db,
            config,
            tasks,
            orchestrator,
        }
    }
}
