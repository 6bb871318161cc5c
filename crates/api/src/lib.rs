//! Tyria service library.
//!
//! Exposes configuration, state, the command surface and the router so the
//! binary and the integration tests build the same application.

pub mod commands;
pub mod config;
pub mod error;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
