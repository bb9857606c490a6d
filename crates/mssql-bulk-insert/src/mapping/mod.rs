//! Entity-to-table mappings.

mod builder;
mod column;

pub use builder::MappingBuilder;
pub use column::{ColumnDefinition, Mapping};
