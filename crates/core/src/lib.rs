//! Domain types and pure logic for the Tyria companion service.
//!
//! Nothing in this crate performs IO. The gateway, database and chat
//! crates build on these types; the synchronizers compute their side
//! effects here as plans and only apply them elsewhere.

pub mod account;
pub mod bosses;
pub mod card;
pub mod catalog;
pub mod credentials;
pub mod currencies;
pub mod dailies;
pub mod error;
pub mod fractals;
pub mod guildsync;
pub mod markers;
pub mod membership;
pub mod pact_supply;
pub mod permissions;
pub mod population;
pub mod professions;
pub mod rotations;
pub mod schema;
pub mod types;
pub mod worldsync;
