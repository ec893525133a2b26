//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and `PENNYWISE__*` environment variables, the
//! latter winning.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [database]
//! sqlite = "pennywise.db"
//!
//! [engine]
//! page_size = 10
//! balance_floor = "0.00"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite(String::from("pennywise.db"))
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineSettings {
    pub page_size: Option<u64>,
    /// Decimal amount, e.g. `"-500.00"` to allow overdrafts.
    pub balance_floor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    /// Falls back to `pennywise.db` in the working directory.
    pub database: Option<Database>,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("PENNYWISE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
