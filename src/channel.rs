//! # Channel Set Definitions
//!
//! A channel set is a named group of bit flags. Each bit is one diagnostic
//! channel that can be toggled independently; the set's identity is the key
//! under which the registry keeps its mask.
//!
//! Sets are an open extensibility point. The host application can describe a
//! set at runtime with [`ChannelSetDescriptor`], or declare a typed set at
//! compile time with the [`channel_set!`](crate::channel_set) macro:
//!
//! ```rust
//! verbosity::channel_set! {
//!     /// Flags for the save system
//!     pub struct SaveFlags("save") {
//!         NONE("none") = 0,
//!         DISK("disk") = 1 << 0,
//!         CLOUD("cloud") = 1 << 1,
//!         ALL("all") = !0,
//!     }
//! }
//!
//! use verbosity::channel::ChannelSet;
//! assert_eq!(SaveFlags::IDENTITY, "save");
//! assert_eq!(SaveFlags::descriptor().display_name(SaveFlags::CLOUD), "cloud");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// One value within a channel set's bit space.
///
/// `0` is the "none" flag and is matched by every mask. A flag with several
/// bits set only matches when all of them are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelFlag(u32);

impl ChannelFlag {
    pub const NONE: ChannelFlag = ChannelFlag(0);
    pub const ALL: ChannelFlag = ChannelFlag(u32::MAX);

    pub const fn from_bits(bits: u32) -> Self {
        ChannelFlag(bits)
    }

    /// Flag with only bit `index` set.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more; use [`ChannelFlag::checked_bit`] for
    /// indices that come from outside the program.
    pub const fn bit(index: u32) -> Self {
        assert!(index < u32::BITS, "channel bit index out of range");
        ChannelFlag(1 << index)
    }

    /// Flag with only bit `index` set, or `None` past the mask width
    pub const fn checked_bit(index: u32) -> Option<Self> {
        match 1u32.checked_shl(index) {
            Some(bits) => Some(ChannelFlag(bits)),
            None => None,
        }
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn is_single(self) -> bool {
        self.0.count_ones() == 1
    }

    /// Submask test: true when every bit of `other` is also set in `self`
    pub const fn contains(self, other: ChannelFlag) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: ChannelFlag) -> Self {
        ChannelFlag(self.0 | other.0)
    }
}

impl From<u32> for ChannelFlag {
    fn from(bits: u32) -> Self {
        ChannelFlag(bits)
    }
}

impl From<ChannelFlag> for u32 {
    fn from(flag: ChannelFlag) -> Self {
        flag.0
    }
}

impl BitOr for ChannelFlag {
    type Output = ChannelFlag;

    fn bitor(self, rhs: ChannelFlag) -> ChannelFlag {
        self.union(rhs)
    }
}

impl BitOrAssign for ChannelFlag {
    fn bitor_assign(&mut self, rhs: ChannelFlag) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ChannelFlag {
    type Output = ChannelFlag;

    fn bitand(self, rhs: ChannelFlag) -> ChannelFlag {
        ChannelFlag(self.0 & rhs.0)
    }
}

impl fmt::Display for ChannelFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A flag value paired with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFlag {
    pub name: String,
    pub value: ChannelFlag,
}

/// Runtime description of one channel set: its identity and its named flags.
///
/// The registry itself only needs the identity; the descriptor is what lets
/// the emitter and configuration surfaces put names on bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSetDescriptor {
    identity: String,
    flags: Vec<NamedFlag>,
}

impl ChannelSetDescriptor {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            flags: Vec::new(),
        }
    }

    /// Add a named flag. A later flag with the same name replaces the earlier one.
    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<ChannelFlag>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.flags.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.value = value,
            None => self.flags.push(NamedFlag { name, value }),
        }
        self
    }

    /// Registry key of this set
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn flags(&self) -> &[NamedFlag] {
        &self.flags
    }

    /// Look up a flag by name, ignoring ASCII case
    pub fn flag(&self, name: &str) -> Option<ChannelFlag> {
        self.flags
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value)
    }

    /// Union of every named flag except the all-ones sentinel
    pub fn channel_mask(&self) -> ChannelFlag {
        self.flags
            .iter()
            .filter(|f| f.value != ChannelFlag::ALL)
            .fold(ChannelFlag::NONE, |acc, f| acc | f.value)
    }

    /// Number of bits needed to hold every named channel
    pub fn bit_width(&self) -> u32 {
        u32::BITS - self.channel_mask().bits().leading_zeros()
    }

    /// Resolve a command-line style token: a flag name, a decimal integer or
    /// a `0x` prefixed hexadecimal integer.
    pub fn parse(&self, token: &str) -> Option<ChannelFlag> {
        if let Some(flag) = self.flag(token) {
            return Some(flag);
        }
        let token = token.trim();
        match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok().map(ChannelFlag),
            None => token.parse::<u32>().ok().map(ChannelFlag),
        }
    }

    /// Names of the single-bit channels enabled in `mask`
    pub fn enabled_names(&self, mask: ChannelFlag) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|f| f.value.is_single() && mask.contains(f.value))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Human readable name of a flag value.
    ///
    /// An exact match wins (so combined sentinels such as `all` keep their
    /// name); otherwise the single-bit names are joined with `|` and any
    /// unnamed remainder is shown in hex.
    pub fn display_name(&self, flag: ChannelFlag) -> String {
        if let Some(named) = self.flags.iter().find(|f| f.value == flag) {
            return named.name.clone();
        }
        if flag.is_none() {
            return "none".to_string();
        }

        let mut parts: Vec<String> = Vec::new();
        let mut covered = ChannelFlag::NONE;
        for named in self.flags.iter().filter(|f| f.value.is_single()) {
            if flag.contains(named.value) {
                parts.push(named.name.clone());
                covered |= named.value;
            }
        }
        let rest = flag.bits() & !covered.bits();
        if rest != 0 {
            parts.push(ChannelFlag(rest).to_string());
        }
        parts.join("|")
    }
}

/// A channel set known at compile time
pub trait ChannelSet {
    /// Stable registry key of this set
    const IDENTITY: &'static str;

    fn descriptor() -> ChannelSetDescriptor;
}

/// Declare a typed channel set.
///
/// Generates a unit struct with one associated [`ChannelFlag`] constant per
/// flag and a [`ChannelSet`] implementation whose descriptor carries the
/// given display names.
#[macro_export]
macro_rules! channel_set {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($identity:literal) {
            $($flag:ident($label:literal) = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name;

        impl $name {
            $(
                pub const $flag: $crate::channel::ChannelFlag =
                    $crate::channel::ChannelFlag::from_bits($value);
            )*
        }

        impl $crate::channel::ChannelSet for $name {
            const IDENTITY: &'static str = $identity;

            fn descriptor() -> $crate::channel::ChannelSetDescriptor {
                $crate::channel::ChannelSetDescriptor::new($identity)
                    $(.with_flag($label, $crate::channel::ChannelFlag::from_bits($value)))*
            }
        }
    };
}

channel_set! {
    /// General purpose channels shared by most applications
    pub struct Universal("universal") {
        NONE("none") = 0,
        ENGINE("engine") = 1 << 1,
        LOADING("loading") = 1 << 2,
        INPUT("input") = 1 << 3,
        AUDIO("audio") = 1 << 4,
        LOCALIZATION("localization") = 1 << 5,
        UI("ui") = 1 << 6,
        SHADER("shader") = 1 << 7,
        ALL("all") = !0,
    }
}

channel_set! {
    /// Channels for host framework subsystems
    pub struct Host("host") {
        NONE("none") = 0,
        INPUT_SYSTEM("input_system") = 1 << 1,
        CANVAS("canvas") = 1 << 2,
        ADDRESSABLES("addressables") = 1 << 3,
        ALL("all") = !0,
    }
}

/// Descriptors of the sets shipped with this crate
pub fn builtin_descriptors() -> Vec<ChannelSetDescriptor> {
    vec![Universal::descriptor(), Host::descriptor()]
}
