//! # Display Surfaces
//!
//! The watchface only ever sets text on four named surfaces; layout, fonts
//! and colours belong to whatever implements [`DisplaySurface`].
//!
//! Two implementations ship with the crate:
//! - [`MemorySurface`]: keeps the current text and a write history, for
//!   tests and headless runs
//! - [`TerminalSurface`]: redraws a boxed text face on every write, for
//!   development on a desktop host

use std::collections::BTreeMap;
use std::io::{self, Write};

/// The logical text areas of the face, in top-to-bottom order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceId {
    Title,
    Time,
    Value,
    Weather,
}

impl SurfaceId {
    pub const ALL: [SurfaceId; 4] = [
        SurfaceId::Title,
        SurfaceId::Time,
        SurfaceId::Value,
        SurfaceId::Weather,
    ];

    fn index(self) -> usize {
        match self {
            SurfaceId::Title => 0,
            SurfaceId::Time => 1,
            SurfaceId::Value => 2,
            SurfaceId::Weather => 3,
        }
    }
}

pub trait DisplaySurface {
    /// Replace the text shown on `surface`.
    fn set_text(&mut self, surface: SurfaceId, text: &str);
}

/// In-memory surface recording every write.
#[derive(Debug, Default)]
pub struct MemorySurface {
    current: BTreeMap<SurfaceId, String>,
    writes: Vec<(SurfaceId, String)>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text currently shown on `surface`, if anything was ever written.
    pub fn text(&self, surface: SurfaceId) -> Option<&str> {
        self.current.get(&surface).map(String::as_str)
    }

    /// Every write in order.
    pub fn writes(&self) -> &[(SurfaceId, String)] {
        &self.writes
    }

    /// Writes to one surface, in order.
    pub fn writes_to(&self, surface: SurfaceId) -> Vec<&str> {
        self.writes
            .iter()
            .filter(|(id, _)| *id == surface)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl DisplaySurface for MemorySurface {
    fn set_text(&mut self, surface: SurfaceId, text: &str) {
        self.current.insert(surface, text.to_owned());
        self.writes.push((surface, text.to_owned()));
    }
}

/// Width of the terminal face, including the border.
const FACE_WIDTH: usize = 26;

/// Terminal rendering of the face.
///
/// Each write redraws the full face so the terminal always shows the
/// current state. Text longer than the face is clipped.
pub struct TerminalSurface<W: Write> {
    out: W,
    texts: [String; 4],
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            texts: Default::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render the face as lines of text.
    pub fn render(&self) -> Vec<String> {
        let inner = FACE_WIDTH - 2;
        let mut lines = Vec::with_capacity(SurfaceId::ALL.len() + 2);
        lines.push(format!("┌{}┐", "─".repeat(inner)));
        for surface in SurfaceId::ALL {
            let text: String = self.texts[surface.index()].chars().take(inner).collect();
            lines.push(format!("│{:^width$}│", text, width = inner));
        }
        lines.push(format!("└{}┘", "─".repeat(inner)));
        lines
    }

    fn redraw(&mut self) -> io::Result<()> {
        for line in self.render() {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn set_text(&mut self, surface: SurfaceId, text: &str) {
        self.texts[surface.index()] = text.to_owned();
        if let Err(e) = self.redraw() {
            log::warn!("Terminal redraw failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_surface_tracks_current_text_and_history() {
        let mut surface = MemorySurface::new();
        assert_eq!(surface.text(SurfaceId::Time), None);

        surface.set_text(SurfaceId::Time, "00:00");
        surface.set_text(SurfaceId::Value, "FB Values");
        surface.set_text(SurfaceId::Time, "09:41");

        assert_eq!(surface.text(SurfaceId::Time), Some("09:41"));
        assert_eq!(surface.writes_to(SurfaceId::Time), vec!["00:00", "09:41"]);
        assert_eq!(surface.writes().len(), 3);
    }

    #[test]
    fn terminal_face_centres_each_surface() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.set_text(SurfaceId::Title, "facebook");
        surface.set_text(SurfaceId::Time, "09:41");

        let lines = surface.render();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("facebook"));
        assert!(lines[2].contains("09:41"));
        // every line has the same display width
        let widths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|&w| w == FACE_WIDTH));
    }

    #[test]
    fn terminal_face_clips_long_text() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.set_text(SurfaceId::Value, &"x".repeat(80));
        let lines = surface.render();
        assert_eq!(lines[3].chars().count(), FACE_WIDTH);
    }

    #[test]
    fn terminal_face_writes_on_every_update() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.set_text(SurfaceId::Weather, "80% 72F");
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert!(out.contains("80% 72F"));
    }
}
