//! SQL Server sink built on tiberius.

mod batch;
mod column_data;
mod connection;

pub use connection::MssqlConnection;
