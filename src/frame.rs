//! Resolved frames: ordered pulse/space durations for one transmission burst

use crate::error::{CodecError, Result};
use crate::hw;
use crate::token::Polarity;

/// A duration that has been resolved to a concrete unit
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Entry {
    /// Microseconds
    Micros(f64),
    /// Exact hardware ticks (1 tick = 0.5 microseconds)
    Ticks(u32),
}

impl Entry {
    /// The entry's duration in microseconds
    pub fn micros(&self) -> f64 {
        match *self {
            Entry::Micros(us) => us,
            Entry::Ticks(ticks) => ticks as f64 * hw::TICK_US,
        }
    }

    /// Whether the entry has zero duration (an alternation filler)
    pub fn is_zero(&self) -> bool {
        match *self {
            Entry::Micros(us) => us == 0.0,
            Entry::Ticks(ticks) => ticks == 0,
        }
    }
}

/// One complete burst of alternating pulse/space durations
///
/// Entries strictly alternate polarity; the first entry of a frame is always
/// a pulse. A zero-duration filler may be inserted solely to preserve
/// alternation. Once closed, a frame accepts no further entries.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    entries: Vec<Entry>,
    closed: bool,
}

impl Frame {
    /// Create a new open, empty frame
    pub fn new() -> Self {
        Frame::default()
    }

    /// Append an entry to the frame
    pub fn push(&mut self, entry: Entry) -> Result<()> {
        if self.closed {
            return Err(CodecError::frame_closed(
                "cannot append to a terminated frame",
            ));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Polarity implied for the next entry slot
    pub fn next_polarity(&self) -> Polarity {
        if self.entries.len() % 2 == 0 {
            Polarity::Pulse
        } else {
            Polarity::Space
        }
    }

    /// Total duration of the frame in microseconds
    pub fn duration_us(&self) -> f64 {
        self.entries.iter().map(Entry::micros).sum()
    }

    /// Mark the frame as terminated
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the frame has been terminated
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The resolved entries, in order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries in the frame
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the frame holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
