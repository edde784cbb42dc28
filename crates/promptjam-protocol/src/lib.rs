//! Wire protocol for PromptJam.
//!
//! This crate defines the language that clients and the server speak:
//!
//! - **Identifiers** ([`RoomId`], [`PlayerId`]): opaque, stable tokens
//!   independent of any transport connection.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): the tagged JSON
//!   frames that travel on the wire, with their payload types
//!   ([`PlayerSummary`], [`GameListing`], [`RoundResult`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong in between.
//!
//! The protocol layer knows nothing about connections, rooms, or the
//! judge; it only describes shapes. Room state lives in `promptjam-room`,
//! transport in `promptjam-gateway`.

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    GameListing, PlayerId, PlayerSummary, RankingEntry, RoomId, RoundResult,
};
