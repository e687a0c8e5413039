//! # Bounded Display Text
//!
//! Every string that reaches a display surface is written through a fixed-size
//! buffer. The sizes below are the physical buffer sizes, one byte of which is
//! reserved for the terminator the display firmware expects, so a buffer of
//! `N` bytes holds at most `N - 1` bytes of text.
//!
//! ## Truncation
//! Writes that do not fit are cut at the last whole UTF-8 character that fits
//! and everything after that point is discarded, the same way `snprintf`
//! behaves on the device. Formatting never fails because of length.

use core::fmt::{self, Write};
use heapless::String;

/// Time buffer: `"HH:MM"` plus room for a suffix.
pub const TIME_BUFFER: usize = 8;
/// Temperature with its unit, formatted before composition.
pub const TEMPERATURE_BUFFER: usize = 8;
/// Conditions text received from the companion.
pub const CONDITIONS_BUFFER: usize = 32;
/// Composed battery/temperature line.
pub const WEATHER_BUFFER: usize = 32;

pub type TimeText = String<{ TIME_BUFFER - 1 }>;
pub type TemperatureText = String<{ TEMPERATURE_BUFFER - 1 }>;
pub type ConditionsText = String<{ CONDITIONS_BUFFER - 1 }>;
pub type WeatherText = String<{ WEATHER_BUFFER - 1 }>;

/// `fmt::Write` adapter that stops accepting input at the first character
/// that would overflow the buffer.
struct Truncating<const N: usize> {
    buf: String<N>,
    full: bool,
}

impl<const N: usize> Write for Truncating<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.full {
            return Ok(());
        }
        for ch in s.chars() {
            if self.buf.push(ch).is_err() {
                self.full = true;
                break;
            }
        }
        Ok(())
    }
}

/// Format `args` into a bounded string, truncating on overflow.
///
/// # Example
/// ```
/// use watchface_lib::text::format_bounded;
///
/// let text: heapless::String<4> = format_bounded(format_args!("{}%", 12345));
/// assert_eq!(text.as_str(), "1234");
/// ```
pub fn format_bounded<const N: usize>(args: fmt::Arguments<'_>) -> String<N> {
    let mut out = Truncating {
        buf: String::new(),
        full: false,
    };
    // Truncating::write_str never errors; a Display impl could, and then we
    // keep whatever was written before it failed.
    let _ = out.write_fmt(args);
    out.buf
}

/// Copy `s` into a bounded string, truncating on overflow.
pub fn bounded<const N: usize>(s: &str) -> String<N> {
    format_bounded(format_args!("{s}"))
}
