//! # Weather Request / Response
//!
//! Weather data lives on the companion side. The watch asks for it on a
//! fixed cadence and merges whatever comes back with its own battery level.
//!
//! ## Request Cadence
//! A request goes out on ticks where `minute % interval == 0` (every 30
//! minutes by default), at most one per tick. Requests are fire-and-forget:
//! a failed delivery is logged by the watchface and the next chance is the
//! next interval boundary.
//!
//! ## Response Handling
//! A reply must carry both `TEMPERATURE` and `CONDITIONS`. Anything less is
//! ignored and the weather surface keeps its previous text. The composed
//! line is `"<battery>% <temperature>F"`.
//!
//! The conditions text is read and bounded but does not appear in the
//! composed line; the face has always shown only battery and temperature.

use crate::battery::BatteryTracker;
use crate::display::{DisplaySurface, SurfaceId};
use crate::message::{
    Dictionary, MessageError, Outbox, TupleValue, KEY_CONDITIONS, KEY_REQUEST_WEATHER,
    KEY_TEMPERATURE,
};
use crate::text::{bounded, format_bounded, ConditionsText, TemperatureText, WeatherText};
use log::{debug, error, info};

/// Default minutes between weather requests.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 30;

/// The single-field marker sent to ask for weather.
pub fn weather_request() -> Dictionary {
    Dictionary::new().with(KEY_REQUEST_WEATHER, TupleValue::UInt8(0))
}

#[derive(Debug)]
pub struct WeatherRequester {
    interval_minutes: u32,
}

impl Default for WeatherRequester {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MINUTES)
    }
}

impl WeatherRequester {
    /// An interval of 0 is treated as 1.
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval_minutes: interval_minutes.max(1),
        }
    }

    /// Whether a tick at `minute` past the hour should ask for weather.
    pub fn is_due(&self, minute: u32) -> bool {
        minute % self.interval_minutes == 0
    }

    /// Queue a weather request if `minute` is on the interval.
    ///
    /// Returns `Ok(true)` when a request was queued, `Ok(false)` when the
    /// minute is off-interval.
    pub fn on_tick<O: Outbox>(&self, minute: u32, outbox: &mut O) -> Result<bool, MessageError> {
        if !self.is_due(minute) {
            return Ok(false);
        }
        outbox.send(weather_request())?;
        debug!("Weather request queued at minute {minute}");
        Ok(true)
    }
}

/// One weather reply, valid only while it is being handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSample {
    pub temperature_f: i32,
    pub conditions: ConditionsText,
}

impl WeatherSample {
    /// Extract both fields, or `None` if either is missing or mistyped.
    pub fn from_dictionary(dict: &Dictionary) -> Option<Self> {
        let temperature_f = dict.get(KEY_TEMPERATURE)?.as_i32()?;
        let conditions = dict.get(KEY_CONDITIONS)?.as_str()?;
        Some(Self {
            temperature_f,
            conditions: bounded(conditions),
        })
    }
}

/// Compose the weather line shown on the face.
///
/// The temperature goes through its own 8-byte buffer first, so an
/// out-of-range reading is cut to 7 bytes before the line is built.
///
/// # Example
/// ```
/// use watchface_lib::text::bounded;
/// use watchface_lib::weather::{compose, WeatherSample};
///
/// let sample = WeatherSample { temperature_f: 72, conditions: bounded("Clear") };
/// assert_eq!(compose(80, &sample).as_str(), "80% 72F");
/// ```
pub fn compose(battery_percent: u8, sample: &WeatherSample) -> WeatherText {
    let temperature: TemperatureText = format_bounded(format_args!("{}F", sample.temperature_f));
    format_bounded(format_args!("{}% {}", battery_percent, temperature))
}

#[derive(Debug, Default)]
pub struct WeatherResponseHandler {
    shown: Option<WeatherText>,
}

impl WeatherResponseHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle an inbound message. Returns `true` if the weather surface was
    /// updated.
    pub fn on_message<D: DisplaySurface>(
        &mut self,
        dict: &Dictionary,
        battery: &BatteryTracker,
        display: &mut D,
    ) -> bool {
        let Some(sample) = WeatherSample::from_dictionary(dict) else {
            debug!("Ignoring incomplete weather message ({} fields)", dict.len());
            return false;
        };

        let line = compose(battery.percent(), &sample);
        info!(
            "Weather update: {} (conditions {:?})",
            line.as_str(),
            sample.conditions.as_str()
        );
        display.set_text(SurfaceId::Weather, &line);
        self.shown = Some(line);
        true
    }

    /// Last composed line, if any reply has been handled.
    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }
}

pub fn on_outbox_sent() {
    info!("Outbox send success!");
}

pub fn on_outbox_failed(reason: MessageError) {
    error!("Outbox send failed: {reason}");
}

pub fn on_inbox_dropped(reason: MessageError) {
    error!("Message dropped: {reason}");
}
