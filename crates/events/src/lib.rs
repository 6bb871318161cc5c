//! Chat-platform side effects.
//!
//! - [`chat`] -- the [`ChatPlatform`] port every worker and command talks to.
//! - [`delivery`] -- the REST implementation of that port.
//! - [`notify`] -- broadcast of a card to every subscribed server.

pub mod chat;
pub mod delivery;
pub mod notify;

pub use chat::{ChatError, ChatPlatform, Member, OutgoingMessage};
pub use delivery::discord::{DiscordConfig, DiscordRest};
pub use notify::{DispatchSummary, Notifier};
