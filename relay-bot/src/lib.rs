//! # relay_bot
//!
//! Reply pipeline between a chat platform and a streaming completion API.
//!
//! - [`ThreadRouter`]: decides per inbound message between a new reply thread, continuing an
//!   existing thread, or ignoring the message.
//! - [`ContextAssembler`]: builds the chronological turn list (single message, or thread history
//!   plus its anchor message in the parent channel).
//! - [`StreamingReplyEngine`]: posts a placeholder, streams the completion and edits the
//!   placeholder at most once per edit interval, with a guaranteed final edit.
//! - [`RelayConfig`]: YAML configuration and per-channel [`ChannelProfile`] lookup.

pub mod config;
pub mod context;
pub mod router;
pub mod stream_reply;

pub use config::{ChannelProfile, RelayConfig};
pub use context::ContextAssembler;
pub use router::{GatewayEvent, IgnoreReason, RouteOutcome, ThreadRouter};
pub use stream_reply::{ReplySummary, StreamingReplyEngine};
