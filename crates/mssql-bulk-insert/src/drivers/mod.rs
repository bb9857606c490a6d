//! Concrete bulk-load sinks.

pub mod mssql;

pub use mssql::MssqlConnection;
