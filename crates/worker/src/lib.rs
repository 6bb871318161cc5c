//! The synchronizer fleet.
//!
//! Each worker implements [`Synchronizer`] and is driven by
//! [`run_periodic`]; [`Fleet`] starts them all on a shared
//! [`WorkerContext`] and stops them through one cancellation token.

pub mod context;
pub mod error;
pub mod fleet;
pub mod periodic;
pub mod presence;
pub mod workers;

pub use context::{WorkerConfig, WorkerContext};
pub use error::WorkerError;
pub use fleet::Fleet;
pub use periodic::{run_periodic, sleep_or_cancel, Synchronizer};
