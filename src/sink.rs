//! Log sinks: where emitted lines end up.
//!
//! The host's console is an external collaborator; [`LogSink`] is the seam.
//! [`TracingSink`] forwards to the process's tracing subscriber and
//! [`MemorySink`] keeps lines for in-app consoles and tests.

use crate::constants::SINK_TARGET;
use std::sync::{Mutex, PoisonError};

pub trait LogSink: Send + Sync {
    /// Write one fully formatted line. `target` describes the object the
    /// line is about, when the caller supplied one.
    fn write(&self, message: &str, target: Option<&str>);
}

/// Forwards lines to `tracing::info!` under the `verbosity::sink` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, message: &str, target: Option<&str>) {
        match target {
            Some(target) => tracing::info!(target: SINK_TARGET, context = target, "{}", message),
            None => tracing::info!(target: SINK_TARGET, "{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkLine {
    pub message: String,
    pub target: Option<String>,
}

/// Keeps every written line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<SinkLine>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line written so far
    pub fn lines(&self) -> Vec<SinkLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything written so far
    pub fn drain(&self) -> Vec<SinkLine> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl LogSink for MemorySink {
    fn write(&self, message: &str, target: Option<&str>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkLine {
                message: message.to_string(),
                target: target.map(str::to_string),
            });
    }
}
