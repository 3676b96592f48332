//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading server
//! settings, rate tables and optional salary seed data from YAML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::RateTable;
use crate::store::RateTableProvider;

use super::types::{SalarySeed, ServerSettings};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── server.yaml          # Bind address, default city, optional seed
/// ├── rates/
/// │   └── foshan-2025.yaml # One rate table per file
/// └── salaries/
///     └── demo.yaml        # Optional salary seed
/// ```
///
/// # Example
///
/// ```no_run
/// use contribution_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config").unwrap();
/// let table = loader.get_rate_table(2025, "Foshan").unwrap();
/// println!("Base range: {} - {}", table.base_min, table.base_max);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    settings: ServerSettings,
    rate_tables: HashMap<(String, i32), RateTable>,
    salary_seed: Option<SalarySeed>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - `server.yaml` or the `rates` directory is missing
    /// - Any file contains invalid YAML
    /// - Any rate table violates its invariants
    /// - Two files define the same (city, year)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<ServerSettings>(&path.join("server.yaml"))?;
        let tables = Self::load_rate_tables(&path.join("rates"))?;

        let salary_seed = match &settings.salary_seed {
            Some(seed_path) => Some(Self::load_yaml::<SalarySeed>(&path.join(seed_path))?),
            None => None,
        };

        let mut loader = Self::from_rate_tables(tables)?;
        loader.settings = settings;
        loader.salary_seed = salary_seed;

        info!(
            config_dir = %path.display(),
            rate_tables = loader.rate_tables.len(),
            "Configuration loaded"
        );
        Ok(loader)
    }

    /// Builds a loader from in-memory rate tables and default settings.
    pub fn from_rate_tables(tables: Vec<RateTable>) -> EngineResult<Self> {
        let mut rate_tables = HashMap::new();
        for table in tables {
            table.validate()?;
            let key = (table.city.clone(), table.year);
            if rate_tables.contains_key(&key) {
                return Err(EngineError::InvalidRateTable {
                    city: table.city,
                    year: table.year,
                    message: "defined more than once".to_string(),
                });
            }
            rate_tables.insert(key, table);
        }

        Ok(Self {
            settings: ServerSettings::default(),
            rate_tables,
            salary_seed: None,
        })
    }

    /// Replaces the server settings.
    pub fn with_settings(mut self, settings: ServerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every rate table file from the rates directory.
    fn load_rate_tables(rates_dir: &Path) -> EngineResult<Vec<RateTable>> {
        let rates_dir_str = rates_dir.display().to_string();

        let entries = fs::read_dir(rates_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rates_dir_str.clone(),
        })?;

        let mut tables = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rates_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                debug!(file = %path.display(), "Loading rate table");
                tables.push(Self::load_yaml::<RateTable>(&path)?);
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate files found)", rates_dir_str),
            });
        }

        Ok(tables)
    }

    /// Returns the server settings.
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Returns the salary seed, if one was configured.
    pub fn salary_seed(&self) -> Option<&SalarySeed> {
        self.salary_seed.as_ref()
    }

    /// Gets the rate table for a city and year.
    ///
    /// Fails with `NotFound` when the city publishes no table for the year.
    pub fn get_rate_table(&self, year: i32, city: &str) -> EngineResult<&RateTable> {
        self.rate_tables
            .get(&(city.to_string(), year))
            .ok_or_else(|| EngineError::not_found(format!("Rate table for {} {}", city, year)))
    }
}

#[async_trait]
impl RateTableProvider for ConfigLoader {
    async fn rate_table(&self, year: i32, city: &str) -> EngineResult<Option<RateTable>> {
        Ok(self.rate_tables.get(&(city.to_string(), year)).cloned())
    }
}
