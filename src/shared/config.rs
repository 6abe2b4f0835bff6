//! Application configuration. Store location.

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding records.db. Read from REGISTRAR_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("REGISTRAR"));
        if let Ok(path) = std::env::var("REGISTRAR_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the data directory. Defaults to ./data if unset.
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }
}
