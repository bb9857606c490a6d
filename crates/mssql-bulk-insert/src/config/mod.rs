//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
connection:
  host: localhost
  database: SampleDatabase
  user: sa
  password: secret
  trust_server_cert: true
bulk:
  batch_size: 5000
  timeout_seconds: 30
  keep_nulls: true
"#;

    #[test]
    fn test_from_yaml_applies_defaults() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.connection.port, 1433);
        assert_eq!(config.connection.encrypt, "true");
        assert_eq!(config.connection.packet_size, 32767);
        assert_eq!(config.bulk.batch_size, Some(5000));
        assert_eq!(config.bulk.timeout_seconds, 30);
        assert!(config.bulk.keep_nulls);
        assert!(!config.bulk.check_constraints);
        assert_eq!(config.connection.target(), "localhost:1433/SampleDatabase");
    }

    #[test]
    fn test_bulk_section_is_optional() {
        let yaml = "connection:\n  host: db\n  database: d\n  user: u\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.bulk, BulkCopyOptions::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.connection.database, "SampleDatabase");
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let yaml = "connection:\n  host: db\n  database: d\n  user: u\nbulk:\n  batch_size: 0\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_password_not_serialized() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }

    #[test]
    fn test_hints_follow_flags() {
        let options = BulkCopyOptions::default()
            .with_check_constraints(true)
            .with_keep_nulls(true);
        assert_eq!(options.hints(), vec!["CHECK_CONSTRAINTS", "KEEP_NULLS"]);
        assert!(BulkCopyOptions::default().hints().is_empty());
    }
}
