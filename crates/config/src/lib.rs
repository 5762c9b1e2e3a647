use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level application settings.
///
/// Layered: built-in defaults → optional `callboard.toml` → environment
/// variables prefixed with `CALLBOARD__` (double underscore as separator,
/// e.g. `CALLBOARD__SERVER__PORT=8080`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub mongo: MongoSettings,
    pub redis: RedisSettings,
    pub dedup: DedupSettings,
    pub enrichment: EnrichmentSettings,
    pub tasks: TaskSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupSettings {
    /// Dedup window in seconds. The cache is cleared wholesale every window,
    /// not per entry.
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentSettings {
    /// Enrichment collaborator endpoint (recommendations + task checks).
    pub endpoint: String,
    /// Per-request timeout. An unbounded collaborator hang is a defect.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskSettings {
    /// The agent checklist evaluated during each call, in display order.
    pub checklist: Vec<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("callboard").required(false))
            .add_source(Environment::with_prefix("CALLBOARD").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001_i64)?
            .set_default("mongo.uri", "mongodb://localhost:27017")?
            .set_default("mongo.database", "callboard")?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("dedup.window_secs", 60_i64)?
            .set_default("enrichment.endpoint", "http://localhost:8089/enrich")?
            .set_default("enrichment.timeout_secs", 15_i64)?
            .set_default(
                "tasks.checklist",
                vec![
                    "Should ask for the name of the customer".to_string(),
                    "Should ask for the phone number of the customer".to_string(),
                    "Should ask customer requirements".to_string(),
                ],
            )
    }
}

impl Default for Settings {
    /// Built-in defaults only - used by tests and as the base layer of
    /// [`Settings::load`].
    fn default() -> Self {
        Self::builder()
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("built-in defaults deserialize")
    }
}
