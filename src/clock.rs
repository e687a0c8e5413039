//! Minute clock refresh.

use crate::display::{DisplaySurface, SurfaceId};
use crate::text::{format_bounded, TimeText};
use chrono::NaiveDateTime;

/// Format `now` as a zero-padded 12-hour `HH:MM`.
pub fn format_time(now: &NaiveDateTime) -> TimeText {
    format_bounded(format_args!("{}", now.format("%I:%M")))
}

/// Writes the current time to the time surface.
#[derive(Debug, Default)]
pub struct ClockRefresher {
    shown: TimeText,
}

impl ClockRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh<D: DisplaySurface>(&mut self, now: &NaiveDateTime, display: &mut D) {
        self.shown = format_time(now);
        display.set_text(SurfaceId::Time, &self.shown);
    }

    /// Last time written, empty before the first refresh.
    pub fn shown(&self) -> &str {
        &self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemorySurface;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn twelve_hour_clock_keeps_leading_zero() {
        assert_eq!(format_time(&at(9, 5)).as_str(), "09:05");
        assert_eq!(format_time(&at(21, 5)).as_str(), "09:05");
        assert_eq!(format_time(&at(0, 0)).as_str(), "12:00");
        assert_eq!(format_time(&at(12, 30)).as_str(), "12:30");
        assert_eq!(format_time(&at(23, 59)).as_str(), "11:59");
    }

    #[test]
    fn refresh_writes_time_surface() {
        let mut display = MemorySurface::new();
        let mut clock = ClockRefresher::new();
        clock.refresh(&at(14, 7), &mut display);

        assert_eq!(display.text(SurfaceId::Time), Some("02:07"));
        assert_eq!(clock.shown(), "02:07");
    }
}
