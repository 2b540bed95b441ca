//! Stamp building blocks: tick sources, inline color markers and context
//! descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the leading tick in every stamp
pub trait TickSource: Send + Sync {
    fn stamp(&self) -> String;
}

/// Frame counter advanced by the host's main loop
#[derive(Debug, Default)]
pub struct FrameCounter {
    frame: AtomicU64,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next frame and return its number
    pub fn advance(&self) -> u64 {
        self.frame.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn current(&self) -> u64 {
        self.frame.load(Ordering::Relaxed)
    }
}

impl TickSource for FrameCounter {
    fn stamp(&self) -> String {
        format!("({})", self.current())
    }
}

/// Counter that increments on every stamp, for hosts without a frame loop
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickSource for SequenceCounter {
    fn stamp(&self) -> String {
        format!("({})", self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Local wall-clock time with millisecond precision
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl TickSource for WallClock {
    fn stamp(&self) -> String {
        format!("({})", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Tick source selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampSource {
    Frame,
    #[default]
    Sequence,
    WallClock,
}

impl StampSource {
    pub fn build(self) -> Arc<dyn TickSource> {
        match self {
            StampSource::Frame => Arc::new(FrameCounter::new()),
            StampSource::Sequence => Arc::new(SequenceCounter::new()),
            StampSource::WallClock => Arc::new(WallClock),
        }
    }
}

/// 24-bit color parsed from a 6-hex-digit hint such as `"3e83f2"` or `"#3e83f2"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn parse(hint: &str) -> Option<Rgb> {
        let hex = hint.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// How a colored label is rendered inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMarkup {
    /// `<b><color=#rrggbb>label</color></b>`, understood by rich-text consoles
    #[default]
    RichText,
    /// 24-bit ANSI escape sequences for terminals
    Ansi,
    /// Label only
    Plain,
}

impl ColorMarkup {
    /// Wrap `label` in a color marker, padded with one space on each side
    pub fn wrap(self, label: &str, color: Option<Rgb>) -> String {
        match (self, color) {
            (ColorMarkup::RichText, Some(rgb)) => {
                format!(" <b><color=#{}>{}</color></b> ", rgb, label)
            }
            (ColorMarkup::RichText, None) => format!(" <b>{}</b> ", label),
            (ColorMarkup::Ansi, Some(rgb)) => format!(
                " \x1b[1;38;2;{};{};{}m{}\x1b[0m ",
                rgb.r, rgb.g, rgb.b, label
            ),
            (ColorMarkup::Ansi, None) => format!(" \x1b[1m{}\x1b[0m ", label),
            (ColorMarkup::Plain, _) => format!(" {} ", label),
        }
    }
}

/// Something a log line is about
pub trait LogContext {
    /// Short name of the context's runtime kind
    fn kind(&self) -> &str;

    fn display_name(&self) -> Option<&str> {
        None
    }

    /// `kind` or `kind:name`
    fn describe(&self) -> String {
        match self.display_name() {
            Some(name) => format!("{}:{}", self.kind(), name),
            None => self.kind().to_string(),
        }
    }
}

/// Plain context value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    kind: String,
    name: Option<String>,
}

impl Target {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
        }
    }

    /// Context whose kind is the short type name of `T`
    pub fn of<T: ?Sized>() -> Self {
        Self::new(short_type_name::<T>())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl LogContext for Target {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// How much an object wants to say about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbLevel {
    #[default]
    None,
    Verbose,
    Deep,
}

/// An object that carries its own verbosity level and stamp.
///
/// Complements channel toggles: the channel says which subsystem is being
/// traced, the level says how chatty one particular object is.
pub trait Verbose {
    fn verb_level(&self) -> VerbLevel;

    /// Prefix identifying this object in its own lines
    fn stamp(&self) -> String;

    /// True when this object's level reaches `level`
    fn is_verbose(&self, level: VerbLevel) -> bool {
        self.verb_level() >= level
    }
}

/// `my_app::world::Player<T>` becomes `Player`
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Player;

    #[test]
    fn test_rgb_parse() {
        assert_eq!(Rgb::parse("3e83f2"), Some(Rgb { r: 0x3e, g: 0x83, b: 0xf2 }));
        assert_eq!(Rgb::parse("#FFFFFF"), Some(Rgb { r: 255, g: 255, b: 255 }));
        assert_eq!(Rgb::parse("fff"), None);
        assert_eq!(Rgb::parse("zzzzzz"), None);
        assert_eq!(Rgb::parse(""), None);
    }

    #[test]
    fn test_markup_wrap() {
        let rgb = Rgb::parse("f23e3e");
        assert_eq!(
            ColorMarkup::RichText.wrap("issue.net", rgb),
            " <b><color=#f23e3e>issue.net</color></b> "
        );
        assert_eq!(ColorMarkup::Plain.wrap("ui", rgb), " ui ");
        assert!(ColorMarkup::Ansi.wrap("ui", rgb).contains("38;2;242;62;62m"));
    }

    #[test]
    fn test_target_describe() {
        assert_eq!(Target::of::<Player>().describe(), "Player");
        assert_eq!(Target::of::<Player>().named("hero").describe(), "Player:hero");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }

    #[test]
    fn test_sequence_counter_is_monotonic() {
        let counter = SequenceCounter::new();
        assert_eq!(counter.stamp(), "(0)");
        assert_eq!(counter.stamp(), "(1)");

        let frames = FrameCounter::new();
        frames.advance();
        frames.advance();
        assert_eq!(frames.stamp(), "(2)");
        assert_eq!(frames.stamp(), "(2)");
    }

    struct Spawner {
        level: VerbLevel,
    }

    impl Verbose for Spawner {
        fn verb_level(&self) -> VerbLevel {
            self.level
        }

        fn stamp(&self) -> String {
            "[spawner]".to_string()
        }
    }

    #[test]
    fn test_verb_level_ordering() {
        let quiet = Spawner { level: VerbLevel::None };
        let deep = Spawner { level: VerbLevel::Deep };

        assert!(quiet.is_verbose(VerbLevel::None));
        assert!(!quiet.is_verbose(VerbLevel::Verbose));
        assert!(deep.is_verbose(VerbLevel::Verbose));
        assert!(deep.is_verbose(VerbLevel::Deep));
        assert_eq!(VerbLevel::default(), VerbLevel::None);
    }
}
