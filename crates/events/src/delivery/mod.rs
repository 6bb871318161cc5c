//! Implementations of [`ChatPlatform`](crate::chat::ChatPlatform).

pub mod discord;
