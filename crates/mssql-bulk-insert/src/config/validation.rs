//! Configuration validation.

use super::Config;
use crate::error::{BulkInsertError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let connection = &config.connection;
    if connection.host.is_empty() {
        return Err(BulkInsertError::Config("connection.host is required".into()));
    }
    if connection.database.is_empty() {
        return Err(BulkInsertError::Config(
            "connection.database is required".into(),
        ));
    }
    if connection.user.is_empty() {
        return Err(BulkInsertError::Config("connection.user is required".into()));
    }
    if connection.port == 0 {
        return Err(BulkInsertError::Config(
            "connection.port must be greater than 0".into(),
        ));
    }
    if !(512..=32767).contains(&connection.packet_size) {
        return Err(BulkInsertError::Config(format!(
            "connection.packet_size must be between 512 and 32767, got {}",
            connection.packet_size
        )));
    }

    if let Some(0) = config.bulk.batch_size {
        return Err(BulkInsertError::Config(
            "bulk.batch_size must be at least 1".into(),
        ));
    }

    Ok(())
}
