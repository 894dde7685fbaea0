//! # relay-discord
//!
//! Discord layer: adapters from serenity types, the [`relay_core::Bot`] implementation, and the
//! gateway runner that feeds the [`relay_bot::ThreadRouter`].
//! Handles only Discord connectivity; routing, context and streaming live in relay-bot.

mod adapters;
mod bot_adapter;
mod runner;

pub use adapters::{
    channel_info, fit_message_length, message_kind, parse_snowflake, DiscordMessageWrapper,
    MESSAGE_CHAR_LIMIT, TRUNCATION_SUFFIX,
};
pub use bot_adapter::{auto_archive_duration, DiscordBotAdapter};
pub use runner::{build_router, gateway_intents, run_client, ACTIVITY_TEXT};
