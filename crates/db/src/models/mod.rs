//! Row structs for each table.
//!
//! Older rows may predate a column; every optional setting decodes to a
//! default rather than failing.

pub mod encounter;
pub mod population;
pub mod reference;
pub mod server;
pub mod state;
pub mod user;
