//! §6 "Configuration (recognised options)": a layered `Settings`, built-in
//! defaults overridden by `SIT_`-prefixed environment variables.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    pub panel_url: String,
    pub aws_url: String,
    pub routing_url: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl DatabaseSettings {
    /// Prefers a single `url` when set; otherwise assembles one from the
    /// discrete fields, matching `database::DatabaseConnectionInfo`'s shape.
    pub fn postgres_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("postgres://{}:{}@{}:{}/{}", self.user, self.password, self.host, self.port, self.name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCacheSettings {
    pub bucket_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HousekeepingSettings {
    pub retention_days: i64,
    pub cron: String,
    pub batch_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveTrainSettings {
    pub gone_threshold: u32,
}

/// Paths to the static point/signal/railcar bundles C2 loads once at
/// start-up (§4.2). These describe the simulated world's fixed geography
/// rather than a per-request input, but are still environment-overridable
/// so a packaged deployment can point at data baked into its image.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceDataSettings {
    pub points_path: String,
    pub signals_path: String,
    pub railcars_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub upstream: UpstreamSettings,
    pub database: DatabaseSettings,
    pub broker: BrokerSettings,
    pub remote_cache: RemoteCacheSettings,
    pub housekeeping: HousekeepingSettings,
    pub active_train: ActiveTrainSettings,
    pub reference_data: ReferenceDataSettings,
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("upstream.panel_url", "https://panel.simulation-invalid.example")?
            .set_default("upstream.aws_url", "https://aws.simulation-invalid.example")?
            .set_default("upstream.routing_url", "https://routing.simulation-invalid.example")?
            .set_default("upstream.profile_url", "https://profile.simulation-invalid.example")?
            .set_default("database.user", "sit")?
            .set_default("database.password", "sit")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.name", "sit")?
            .set_default("housekeeping.retention_days", housekeeping::DEFAULT_RETENTION_DAYS)?
            .set_default("housekeeping.cron", housekeeping::DEFAULT_CRON)?
            .set_default("housekeeping.batch_limit", housekeeping::DEFAULT_BATCH_LIMIT as i64)?
            .set_default("active_train.gone_threshold", collector::active_train::DEFAULT_GONE_THRESHOLD)?
            .set_default("reference_data.points_path", "data/points.json")?
            .set_default("reference_data.signals_path", "data/signals.json")?
            .set_default("reference_data.railcars_path", "data/railcars.json")?
            .add_source(config::Environment::with_prefix("SIT").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_environment_overrides() {
        // `config::Environment` only reads variables that are actually set,
        // so running with a clean env still produces a fully-populated
        // Settings from the built-in defaults alone.
        let settings = Settings::load().expect("defaults alone must be sufficient to build Settings");
        assert_eq!(settings.housekeeping.retention_days, housekeeping::DEFAULT_RETENTION_DAYS);
        assert_eq!(settings.active_train.gone_threshold, collector::active_train::DEFAULT_GONE_THRESHOLD);
    }
}
