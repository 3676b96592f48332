//! Configuration types for the Contribution Engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::path::PathBuf;

use serde::Deserialize;

use crate::models::SalaryRecord;

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_city() -> String {
    "Foshan".to_string()
}

/// Server settings from `server.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerSettings {
    /// The socket address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// The city used when a request does not name one.
    #[serde(default = "default_city")]
    pub default_city: String,
    /// Optional salary seed file, relative to the configuration directory.
    #[serde(default)]
    pub salary_seed: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_city: default_city(),
            salary_seed: None,
        }
    }
}

/// Salary records to preload for one owner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SalarySeed {
    /// The owner the records belong to.
    pub owner: String,
    /// The records.
    pub records: Vec<SalaryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_settings_defaults() {
        let settings: ServerSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, ServerSettings::default());
        assert_eq!(settings.bind_addr, "127.0.0.1:3000");
        assert_eq!(settings.default_city, "Foshan");
    }

    #[test]
    fn test_salary_seed_deserializes() {
        let yaml = r#"
owner: demo
records:
  - employee_id: E1
    employee_name: Li Lei
    month: "2025-01"
    amount: "5000"
"#;
        let seed: SalarySeed = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.owner, "demo");
        assert_eq!(seed.records.len(), 1);
    }
}
