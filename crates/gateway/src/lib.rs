//! Sole outbound channel to the game publisher's HTTP API.
//!
//! [`Gateway`] composes requests (user agent, bearer credential, schema
//! pin), classifies failures into [`ApiError`](tyria_core::error::ApiError),
//! retries the transient subset, and fans out multi-endpoint calls. The
//! publisher's RSS news feed is read through the same HTTP client.

pub mod classify;
pub mod client;
pub mod retry;
pub mod rss;

pub use client::{endpoint, Auth, Gateway, GatewayConfig};
pub use retry::RetryPolicy;
pub use rss::FeedItem;
