//! # Shared Constants
//!
//! Values that must stay identical between the registry, the emitter and the
//! command-line surface: the preference key prefix, the stamp separator and
//! the fixed categories of the unconditional convenience logs.

/// Prefix prepended to a channel-set identity to form its preference key
pub const PREF_KEY_PREFIX: &str = "ppref_";

/// Separator placed between stamp segments
pub const TAB: &str = "   ";

/// Default fallback filter for the internal tracing subscriber
pub const DEFAULT_LOG_FILTER: &str = "verbosity=debug,warn";

/// Target used by [`crate::sink::TracingSink`] for emitted lines
pub const SINK_TARGET: &str = "verbosity::sink";

// Categories of the unconditional convenience logs
pub const CATEGORY_APP: &str = "app";
pub const CATEGORY_FLOW: &str = "flow";
pub const CATEGORY_ISSUE: &str = "issue";
pub const CATEGORY_INPUT: &str = "input";

// Default colors for those categories (6-hex-digit RGB)
pub const COLOR_BLUE_LIGHT: &str = "3e83f2"; // app
pub const COLOR_GREEN_LIGHT: &str = "7df27f"; // flow
pub const COLOR_RED_LIGHT: &str = "f23e3e"; // issue
pub const COLOR_PINK_LIGHT: &str = "ec3ef2"; // input
