//! Row production: [`RowBuilder`] converts one entity, [`SqlServerRecord`]
//! streams a whole entity sequence to a bulk-load sink.

mod builder;
mod cursor;

pub use builder::RowBuilder;
pub use cursor::SqlServerRecord;
