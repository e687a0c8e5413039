//! # Values Rotation
//!
//! One of five fixed company values is shown at a time, advancing one step
//! per minute tick. The index starts on the last entry so the first tick
//! lands on the first value.

use crate::display::{DisplaySurface, SurfaceId};

pub const VALUES: [&str; 5] = [
    "Be Bold",
    "Focus on Impact",
    "Move Fast",
    "Be Open",
    "Build Social Value",
];

const INITIAL_INDEX: usize = VALUES.len() - 1;

#[derive(Debug)]
pub struct MessageRotator {
    index: usize,
}

impl Default for MessageRotator {
    fn default() -> Self {
        Self {
            index: INITIAL_INDEX,
        }
    }
}

impl MessageRotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one step and show the new value.
    pub fn on_tick<D: DisplaySurface>(&mut self, display: &mut D) -> &'static str {
        self.index = (self.index + 1) % VALUES.len();
        let value = VALUES[self.index];
        display.set_text(SurfaceId::Value, value);
        value
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
