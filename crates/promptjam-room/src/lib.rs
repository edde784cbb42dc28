//! Room lifecycle and game rules for Prompt Jam.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! game state: phase machine, player roster, submissions, and the
//! round evaluation in flight.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates/deletes rooms, routes connections
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`GameState`]: pure game rules, one instance per room
//! - [`Phase`]: game phase machine
//! - [`LevelCatalog`]: level packs loaded at startup
//! - [`RoomConfig`]: room settings (GM grace period, buffer sizes)

mod catalog;
mod config;
mod error;
mod game;
mod phase;
mod player;
mod registry;
mod room;

pub use catalog::{CatalogError, LevelCatalog, Problem};
pub use config::RoomConfig;
pub use error::RoomError;
pub use game::{ActionEffect, DisconnectOutcome, GameAction, GameState, Recipient};
pub use phase::Phase;
pub use player::{Player, Roster};
pub use registry::{RoomRegistry, RoomSignal};
pub use room::{EventSender, RoomHandle, RoomInfo};
