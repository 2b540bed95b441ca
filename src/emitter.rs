//! # Filtered Emitter
//!
//! [`Verbosity`] is the front door of the crate. It checks a channel's toggle
//! state, builds the stamp, writes the line to the [`LogSink`] and publishes
//! it on the [`BroadcastHub`].
//!
//! ## Line Layout
//!
//! ```text
//! (42)   Player:hero    <b><color=#7df27f>audio</color></b> footstep played
//! ^tick  ^context        ^flag name with optional color      ^message
//! ```
//!
//! Filtered logs are published under their channel-set identity. The
//! unconditional `app`/`flow`/`issue`/`input` logs skip the toggle check and
//! are published under their fixed category.
//!
//! Every entry point first checks the emitter's gate. A disabled emitter does
//! no formatting and no I/O, which is how release builds silence diagnostics.

use crate::broadcast::BroadcastHub;
use crate::channel::{ChannelFlag, ChannelSet, Host, Universal};
use crate::config::VerbosityConfig;
use crate::constants::{
    CATEGORY_APP, CATEGORY_FLOW, CATEGORY_INPUT, CATEGORY_ISSUE, COLOR_BLUE_LIGHT,
    COLOR_GREEN_LIGHT, COLOR_PINK_LIGHT, COLOR_RED_LIGHT, TAB,
};
use crate::registry::ChannelRegistry;
use crate::sink::{LogSink, TracingSink};
use crate::stamp::{ColorMarkup, LogContext, Rgb, SequenceCounter, TickSource, VerbLevel, Verbose};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Verbosity {
    registry: Arc<ChannelRegistry>,
    hub: Arc<BroadcastHub>,
    sink: Arc<dyn LogSink>,
    ticks: Arc<dyn TickSource>,
    markup: ColorMarkup,
    enabled: AtomicBool,
}

impl Verbosity {
    /// Emitter over shared parts, stamping with a per-line sequence and rich-text markup
    pub fn new(registry: Arc<ChannelRegistry>, hub: Arc<BroadcastHub>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            registry,
            hub,
            sink,
            ticks: Arc::new(SequenceCounter::new()),
            markup: ColorMarkup::default(),
            enabled: AtomicBool::new(true),
        }
    }

    /// Build a fully wired emitter from configuration.
    ///
    /// The built-in channel sets are registered, masks persist to the
    /// configured preference file and lines go to the tracing subscriber.
    pub fn from_config(config: &VerbosityConfig) -> Self {
        let registry = Arc::new(ChannelRegistry::new(config.toggle_store()));
        registry.register_set::<Universal>();
        registry.register_set::<Host>();

        let emitter = Self::new(registry, Arc::new(BroadcastHub::new()), Arc::new(TracingSink))
            .with_tick_source(config.stamp.build())
            .with_markup(config.markup);
        emitter.set_enabled(config.enabled);
        emitter
    }

    /// Replace the source of the leading tick
    pub fn with_tick_source(mut self, ticks: Arc<dyn TickSource>) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_markup(mut self, markup: ColorMarkup) -> Self {
        self.markup = markup;
        self
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Open or close the master gate
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Emit `message` on channel `flag` of `identity` if that channel is toggled on.
    ///
    /// Returns whether a line was produced.
    pub fn log(
        &self,
        identity: &str,
        flag: ChannelFlag,
        message: &str,
        context: Option<&dyn LogContext>,
        color: Option<&str>,
    ) -> bool {
        if !self.is_enabled() || !self.registry.is_toggled(identity, flag) {
            return false;
        }

        let label = self.registry.flag_name(identity, flag);
        let body = format!("{}{}", self.markup.wrap(&label, color.and_then(Rgb::parse)), message);
        self.emit(identity, &body, context);
        true
    }

    /// [`log`](Self::log) on a typed channel set
    pub fn log_set<S: ChannelSet>(
        &self,
        flag: ChannelFlag,
        message: &str,
        context: Option<&dyn LogContext>,
        color: Option<&str>,
    ) -> bool {
        self.log(S::IDENTITY, flag, message, context, color)
    }

    /// Filtered line on the built-in `universal` set
    pub fn universal(&self, flag: ChannelFlag, message: &str) -> bool {
        self.log_set::<Universal>(flag, message, None, None)
    }

    /// Filtered line on the built-in `host` set
    pub fn host(&self, flag: ChannelFlag, message: &str) -> bool {
        self.log_set::<Host>(flag, message, None, None)
    }

    /// Unfiltered line under `category`, labelled `category.context`
    pub fn log_category(&self, category: &str, context: &str, message: &str, color: &str) {
        if !self.is_enabled() {
            return;
        }
        let label = format!("{}.{}", category, context);
        let body = format!(
            "{}{}{}{}",
            self.markup.wrap(&label, Rgb::parse(color)),
            TAB,
            TAB,
            message
        );
        self.emit(category, &body, None);
    }

    /// Major application event
    pub fn app(&self, context: &str, message: &str) {
        self.log_category(CATEGORY_APP, context, message, COLOR_BLUE_LIGHT);
    }

    /// Major flow event
    pub fn flow(&self, context: &str, message: &str) {
        self.log_category(CATEGORY_FLOW, context, message, COLOR_GREEN_LIGHT);
    }

    /// Something went wrong
    pub fn issue(&self, context: &str, message: &str) {
        self.log_category(CATEGORY_ISSUE, context, message, COLOR_RED_LIGHT);
    }

    /// User input event
    pub fn input(&self, context: &str, message: &str) {
        self.log_category(CATEGORY_INPUT, context, message, COLOR_PINK_LIGHT);
    }

    /// Line from an object with its own verbosity level, published under
    /// `category` when the object is at least as verbose as `level`.
    ///
    /// Channel toggles are not consulted; the gate still is.
    pub fn log_verbose(&self, source: &dyn Verbose, level: VerbLevel, category: &str, message: &str) -> bool {
        if !self.is_enabled() || !source.is_verbose(level) {
            return false;
        }
        let body = format!("{}{}{}", source.stamp(), TAB, message);
        self.emit(category, &body, None);
        true
    }

    fn emit(&self, category: &str, body: &str, context: Option<&dyn LogContext>) {
        let target = context.map(|c| c.describe());
        let line = format_line(&self.ticks.stamp(), target.as_deref(), body);
        self.sink.write(&line, target.as_deref());
        self.hub.publish(category, &line);
    }
}

impl std::fmt::Debug for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verbosity")
            .field("registry", &self.registry)
            .field("hub", &self.hub)
            .field("markup", &self.markup)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

fn format_line(tick: &str, target: Option<&str>, body: &str) -> String {
    let mut line = String::with_capacity(tick.len() + body.len() + 16);
    line.push_str(tick);
    line.push_str(TAB);
    if let Some(target) = target {
        line.push_str(target);
    }
    line.push_str(TAB);
    line.push_str(body);
    line
}
