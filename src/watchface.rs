//! # Watchface State and Event Loop
//!
//! [`Watchface`] owns every piece of mutable state on the face: the battery
//! level, the rotation index and the last composed strings. It is driven by
//! a single consumer loop that handles one [`Event`] at a time, each to
//! completion, so no state is ever shared or locked.
//!
//! ## Tick Order
//! Every minute tick runs, in order:
//! 1. clock refresh
//! 2. weather request, if the minute is on the interval
//! 3. values rotation
//!
//! ## Startup
//! The face is built from a battery snapshot, writes its placeholders and
//! title, then [`Watchface::start`] shows the current time. Rotation and
//! weather wait for the first tick.

use crate::battery::{BatteryChargeState, BatteryTracker};
use crate::clock::ClockRefresher;
use crate::config::Config;
use crate::display::{DisplaySurface, SurfaceId};
use crate::event::{Event, EventReceiver};
use crate::message::Outbox;
use crate::rotator::MessageRotator;
use crate::weather::{self, WeatherRequester, WeatherResponseHandler};
use chrono::{NaiveDateTime, Timelike};
use log::{error, info};

pub struct Watchface<D: DisplaySurface, O: Outbox> {
    display: D,
    outbox: O,
    battery: BatteryTracker,
    clock: ClockRefresher,
    requester: WeatherRequester,
    responder: WeatherResponseHandler,
    rotator: MessageRotator,
}

impl<D: DisplaySurface, O: Outbox> Watchface<D, O> {
    /// Build the face and write its initial text.
    pub fn new(mut display: D, outbox: O, battery: BatteryChargeState, config: &Config) -> Self {
        let face = &config.face;
        display.set_text(SurfaceId::Title, &face.title);
        display.set_text(SurfaceId::Time, &face.time_placeholder);
        display.set_text(SurfaceId::Value, &face.value_placeholder);
        display.set_text(SurfaceId::Weather, &face.weather_placeholder);

        Self {
            display,
            outbox,
            battery: BatteryTracker::new(battery),
            clock: ClockRefresher::new(),
            requester: WeatherRequester::new(config.messaging.weather_interval_minutes),
            responder: WeatherResponseHandler::new(),
            rotator: MessageRotator::new(),
        }
    }

    /// Show the current time without waiting for the first tick.
    pub fn start(&mut self, now: &NaiveDateTime) {
        self.clock.refresh(now, &mut self.display);
        info!(
            "Watchface started at {} with battery {}%",
            self.clock.shown(),
            self.battery.percent()
        );
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Tick(now) => self.on_tick(&now),
            Event::Battery(state) => self.battery.on_battery_event(state),
            Event::InboxReceived(dict) => {
                self.responder
                    .on_message(&dict, &self.battery, &mut self.display);
            }
            Event::InboxDropped(reason) => weather::on_inbox_dropped(reason),
            Event::OutboxSent => weather::on_outbox_sent(),
            Event::OutboxFailed(reason) => weather::on_outbox_failed(reason),
        }
    }

    pub fn on_tick(&mut self, now: &NaiveDateTime) {
        self.clock.refresh(now, &mut self.display);

        if let Err(e) = self.requester.on_tick(now.minute(), &mut self.outbox) {
            error!("Weather request not queued: {}", e);
        }

        self.rotator.on_tick(&mut self.display);
    }

    /// Consume events until every producer has gone away.
    pub async fn run(mut self, mut events: EventReceiver) -> Self {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        info!("Event queue closed, watchface loop exiting");
        self
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn battery_percent(&self) -> u8 {
        self.battery.percent()
    }

    pub fn rotation_index(&self) -> usize {
        self.rotator.index()
    }

    /// Last composed weather line, if any reply has been shown.
    pub fn weather_line(&self) -> Option<&str> {
        self.responder.shown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemorySurface;
    use crate::message::RecordingOutbox;
    use chrono::NaiveDate;

    fn face(percent: u8) -> Watchface<MemorySurface, RecordingOutbox> {
        Watchface::new(
            MemorySurface::new(),
            RecordingOutbox::default(),
            BatteryChargeState::discharging(percent),
            &Config::default(),
        )
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 16)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn construction_writes_placeholders_and_holds_battery_snapshot() {
        let face = face(63);
        let display = face.display();
        assert_eq!(display.text(SurfaceId::Title), Some("facebook"));
        assert_eq!(display.text(SurfaceId::Time), Some("00:00"));
        assert_eq!(display.text(SurfaceId::Value), Some("FB Values"));
        assert_eq!(display.text(SurfaceId::Weather), Some("?? % ?? F"));
        assert_eq!(face.battery_percent(), 63);
        assert_eq!(face.rotation_index(), 4);
    }

    #[test]
    fn start_shows_time_but_does_not_rotate_or_request() {
        let mut face = face(50);
        face.start(&at(8, 0));
        assert_eq!(face.display().text(SurfaceId::Time), Some("08:00"));
        assert_eq!(face.display().text(SurfaceId::Value), Some("FB Values"));
        assert!(face.outbox().sent().is_empty());
    }

    #[test]
    fn tick_runs_clock_then_request_then_rotation() {
        let mut face = face(50);
        face.handle(Event::Tick(at(13, 30)));

        let writes: Vec<SurfaceId> = face.display().writes()[4..].iter().map(|(s, _)| *s).collect();
        assert_eq!(writes, vec![SurfaceId::Time, SurfaceId::Value]);
        assert_eq!(face.display().text(SurfaceId::Time), Some("01:30"));
        assert_eq!(face.display().text(SurfaceId::Value), Some("Be Bold"));
        assert_eq!(face.outbox().sent().len(), 1);
    }

    #[test]
    fn delivery_outcomes_do_not_touch_the_display() {
        let mut face = face(50);
        let before = face.display().writes().len();
        face.handle(Event::OutboxSent);
        face.handle(Event::OutboxFailed(crate::message::MessageError::NotConnected));
        face.handle(Event::InboxDropped(crate::message::MessageError::BufferOverflow));
        assert_eq!(face.display().writes().len(), before);
        assert!(face.outbox().sent().is_empty());
    }
}
