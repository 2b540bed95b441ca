//! # Verbosity - Runtime Diagnostic Channel Toggles
//!
//! Diagnostic output is split into channels. A channel is one bit in a
//! named channel set; each set keeps a single mask of enabled channels that
//! can be changed at runtime and persisted as a developer preference.
//! Messages on a disabled channel cost one atomic load and nothing else.
//!
//! ```text
//! ┌──────────────┐  is_toggled  ┌─────────────────┐  load/save  ┌─────────────┐
//! │  Verbosity   │─────────────►│ ChannelRegistry │────────────►│ ToggleStore │
//! │  (emitter)   │              └─────────────────┘             └─────────────┘
//! │              │  write       ┌─────────────────┐
//! │              │─────────────►│     LogSink     │
//! │              │  publish     ┌─────────────────┐
//! │              │─────────────►│  BroadcastHub   │
//! └──────────────┘              └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use verbosity::channel::Universal;
//! use verbosity::prelude::*;
//!
//! let registry = Arc::new(ChannelRegistry::in_memory());
//! registry.register_set::<Universal>();
//! let sink = Arc::new(MemorySink::new());
//! let verbose = Verbosity::new(registry.clone(), Arc::new(BroadcastHub::new()), sink.clone());
//!
//! assert!(!verbose.universal(Universal::AUDIO, "muted"));
//! registry.toggle_set::<Universal>(Universal::AUDIO);
//! assert!(verbose.universal(Universal::AUDIO, "footstep played"));
//! assert_eq!(sink.len(), 1);
//! ```

pub mod broadcast;
pub mod channel;
pub mod config;
pub mod constants;
pub mod emitter;
pub mod error;
pub mod logger;
pub mod registry;
pub mod sink;
pub mod stamp;
pub mod store;

pub use emitter::Verbosity;

pub mod prelude {
    pub use crate::broadcast::{BroadcastHub, Delivery, SubscriptionId};
    pub use crate::channel::{ChannelFlag, ChannelSet, ChannelSetDescriptor};
    pub use crate::emitter::Verbosity;
    pub use crate::registry::ChannelRegistry;
    pub use crate::sink::{LogSink, MemorySink, TracingSink};
    pub use crate::stamp::{ColorMarkup, LogContext, Target, TickSource, VerbLevel, Verbose};
    pub use crate::store::{PreferenceStore, ToggleStore};
}
