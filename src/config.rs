use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// How long tasks stay pollable after creation.
    pub ttl_hours: i64,
    /// How often the background sweep runs.
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub tasks: TaskConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let tasks = TaskConfig {
            ttl_hours: std::env::var("TASK_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
            sweep_interval_secs: std::env::var("TASK_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(3600),
        };
        Ok(Self {
            database_url,
            tasks,
        })
    }
}
