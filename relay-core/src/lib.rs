//! # relay-core
//!
//! Core types and traits for the relay bot: [`Bot`] (the chat platform session), inbound and
//! history message types, the [`RelayError`] taxonomy, and tracing initialization.
//! Transport-agnostic; implemented by relay-discord and consumed by relay-bot.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::Bot;
pub use error::{RelayError, Result};
pub use logger::init_tracing;
pub use types::{ChannelInfo, HistoryMessage, InboundMessage, MessageKind, ReplyTarget};
