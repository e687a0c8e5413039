//! # Battery Tracking
//!
//! The watchface keeps the last known charge percentage so it can be merged
//! into the weather line whenever a reply arrives. The tracker is created
//! from a platform snapshot, so there is never an "unknown" level.
//!
//! On a Linux host the platform is the kernel's power-supply class
//! (`/sys/class/power_supply/*/capacity`). Machines without a battery fall
//! back to a configured percentage.

use crate::event::{Event, EventSender};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default sysfs root for power supplies.
pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

#[derive(Error, Debug)]
pub enum BatteryError {
    #[error("battery IO: {0}")]
    Io(#[from] io::Error),

    #[error("unparseable capacity {0:?}")]
    Capacity(String),
}

/// Charge state as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatteryChargeState {
    /// 0–100
    pub charge_percent: u8,
    pub is_charging: bool,
    pub is_plugged: bool,
}

impl BatteryChargeState {
    pub fn discharging(charge_percent: u8) -> Self {
        Self {
            charge_percent,
            is_charging: false,
            is_plugged: false,
        }
    }
}

/// Something that can report the current charge on demand.
pub trait BatterySource {
    fn peek(&self) -> BatteryChargeState;
}

/// Last known battery level.
#[derive(Debug)]
pub struct BatteryTracker {
    percent: u8,
}

impl BatteryTracker {
    /// Start from the platform snapshot.
    pub fn new(snapshot: BatteryChargeState) -> Self {
        Self {
            percent: snapshot.charge_percent,
        }
    }

    /// Record a charge change. The platform guarantees 0–100.
    pub fn on_battery_event(&mut self, state: BatteryChargeState) {
        debug!("Battery level {}% -> {}%", self.percent, state.charge_percent);
        self.percent = state.charge_percent;
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }
}

/// Battery read from the Linux power-supply class.
#[derive(Debug, Clone)]
pub struct SysfsBattery {
    dir: Option<PathBuf>,
    fallback_percent: u8,
}

impl SysfsBattery {
    /// Use the first supply under `root` whose `type` is `Battery`.
    pub fn discover<P: AsRef<Path>>(root: P, fallback_percent: u8) -> Self {
        let dir = fs::read_dir(root.as_ref()).ok().and_then(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .find(|path| {
                    fs::read_to_string(path.join("type"))
                        .map(|t| t.trim() == "Battery")
                        .unwrap_or(false)
                })
        });

        match &dir {
            Some(path) => info!("Using battery at {}", path.display()),
            None => info!(
                "No battery found under {}, reporting {}%",
                root.as_ref().display(),
                fallback_percent
            ),
        }

        Self {
            dir,
            fallback_percent,
        }
    }

    /// Read the supply directly.
    pub fn read(&self) -> Result<BatteryChargeState, BatteryError> {
        let Some(dir) = &self.dir else {
            return Ok(BatteryChargeState::discharging(self.fallback_percent));
        };

        let raw = fs::read_to_string(dir.join("capacity"))?;
        let capacity: u32 = raw
            .trim()
            .parse()
            .map_err(|_| BatteryError::Capacity(raw.trim().to_owned()))?;
        let charge_percent = capacity.min(100) as u8;

        // `status` is optional on some drivers
        let status = fs::read_to_string(dir.join("status")).unwrap_or_default();
        let status = status.trim();

        Ok(BatteryChargeState {
            charge_percent,
            is_charging: status == "Charging",
            is_plugged: matches!(status, "Charging" | "Full" | "Not charging"),
        })
    }
}

impl BatterySource for SysfsBattery {
    fn peek(&self) -> BatteryChargeState {
        self.read().unwrap_or_else(|e| {
            warn!("Battery read failed: {}", e);
            BatteryChargeState::discharging(self.fallback_percent)
        })
    }
}

/// Post a battery event whenever the reading changes.
///
/// `last` is the snapshot the watchface was created with, so the first
/// event only fires on an actual change. Returns when the event queue
/// closes.
pub async fn poll<S: BatterySource>(
    source: S,
    interval: Duration,
    mut last: BatteryChargeState,
    events: EventSender,
) {
    let mut ticker = tokio::time::interval(interval);
    // first tick of a tokio interval completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let state = source.peek();
        if state == last {
            continue;
        }
        last = state;
        if events.send(Event::Battery(state)).await.is_err() {
            debug!("Event queue closed, battery poller stopping");
            return;
        }
    }
}
