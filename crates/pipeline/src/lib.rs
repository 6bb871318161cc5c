//! Reference-data rebuild pipeline and service availability.
//!
//! A rebuild drops and reloads every catalog from the publisher. It reads
//! through a [`CatalogSource`] and writes through a [`CatalogSink`]; the
//! production pair is the gateway and Postgres.

pub mod rebuild;
pub mod sink;
pub mod source;
pub mod status;

pub use rebuild::{CatalogOutcome, RebuildError, RebuildReport, Rebuilder};
pub use sink::{CatalogSink, PgCatalogSink};
pub use source::CatalogSource;
pub use status::{Availability, ServiceStatus};
