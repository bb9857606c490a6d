//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Destination database connection.
    pub connection: ConnectionConfig,

    /// Bulk-copy behaviour.
    #[serde(default)]
    pub bulk: BulkCopyOptions,
}

/// SQL Server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 1433).
    #[serde(default = "default_mssql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Encrypt connection (default: "true").
    #[serde(default = "default_true_string")]
    pub encrypt: String,

    /// Trust server certificate (default: false).
    #[serde(default)]
    pub trust_server_cert: bool,

    /// TDS packet size in bytes (default: 32767).
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,
}

impl ConnectionConfig {
    /// Identity of the destination used to key reconciled column orders.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Options forwarded to the bulk-load sink.
///
/// Defaults match SQL Server's `INSERT BULK` defaults: one unbounded batch,
/// no timeout, constraints and triggers not applied, identity values
/// generated by the server, NULLs replaced by column defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCopyOptions {
    /// Rows per batch. `None` sends everything as one batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Transfer timeout in seconds. 0 means no limit.
    #[serde(default)]
    pub timeout_seconds: u64,

    /// Check constraints while loading.
    #[serde(default)]
    pub check_constraints: bool,

    /// Fire insert triggers while loading.
    #[serde(default)]
    pub fire_triggers: bool,

    /// Keep client-supplied identity values.
    #[serde(default)]
    pub keep_identity: bool,

    /// Keep NULLs instead of applying column defaults.
    #[serde(default)]
    pub keep_nulls: bool,
}

impl BulkCopyOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_check_constraints(mut self, enabled: bool) -> Self {
        self.check_constraints = enabled;
        self
    }

    pub fn with_fire_triggers(mut self, enabled: bool) -> Self {
        self.fire_triggers = enabled;
        self
    }

    pub fn with_keep_identity(mut self, enabled: bool) -> Self {
        self.keep_identity = enabled;
        self
    }

    pub fn with_keep_nulls(mut self, enabled: bool) -> Self {
        self.keep_nulls = enabled;
        self
    }

    /// Names of the enabled server-side hints, in `INSERT BULK ... WITH` order.
    pub fn hints(&self) -> Vec<&'static str> {
        let mut hints = Vec::new();
        if self.check_constraints {
            hints.push("CHECK_CONSTRAINTS");
        }
        if self.fire_triggers {
            hints.push("FIRE_TRIGGERS");
        }
        if self.keep_identity {
            hints.push("KEEP_IDENTITY");
        }
        if self.keep_nulls {
            hints.push("KEEP_NULLS");
        }
        hints
    }
}

fn default_mssql_port() -> u16 {
    1433
}

fn default_true_string() -> String {
    "true".to_string()
}

fn default_packet_size() -> u32 {
    32767
}
