//! # Values Watchface Entry Point
//!
//! This binary wires the watchface to a Linux host: a terminal face, the
//! sysfs battery, a minute tick task and a companion that fetches weather.
//!
//! Flags:
//! - `--offline`: the companion answers with the configured fixed sample
//! - `--config <path>`: read settings from `path` instead of `watchface.toml`

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::Local;
use log::{info, warn};
use std::env;
use std::time::Duration;
use tokio::sync::mpsc;
use watchface_lib::{
    battery::{self, BatterySource, SysfsBattery, POWER_SUPPLY_ROOT},
    companion::{self, Companion, CurrentWeather, WeatherProvider},
    config::{Config, CONFIG_FILE},
    display::TerminalSurface,
    event,
    message::ChannelOutbox,
    scheduler, Watchface,
};

/// Command line options.
#[derive(Debug, PartialEq)]
struct Options {
    offline: bool,
    config_path: String,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Options> {
    let mut options = Options {
        offline: false,
        config_path: CONFIG_FILE.to_string(),
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--offline" => options.offline = true,
            "--config" => {
                options.config_path = args.next().context("--config needs a path")?;
            }
            other => anyhow::bail!("unknown argument {other:?}"),
        }
    }
    Ok(options)
}

fn weather_provider(config: &Config, offline: bool) -> anyhow::Result<WeatherProvider> {
    let sample = CurrentWeather {
        temperature_f: config.companion.offline_temperature_f,
        conditions: config.companion.offline_conditions.clone(),
    };

    if offline || config.companion.api_key.is_empty() {
        if !offline {
            warn!("No OpenWeatherMap API key configured, using offline weather");
        }
        if let Err(e) = companion::reply_for(&sample, config.messaging.inbox_size) {
            warn!("Offline weather sample will be dropped by the inbox: {}", e);
        }
        return Ok(WeatherProvider::Fixed(sample));
    }

    WeatherProvider::open_weather_map(&config.companion.query, &config.companion.api_key)
        .context("building HTTP client")
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = parse_args(env::args().skip(1))?;
    let config = Config::load_from_path(&options.config_path);

    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, options.offline))
}

async fn run(config: Config, offline: bool) -> anyhow::Result<()> {
    let (events_tx, events_rx) = event::channel();
    // one request in flight, like the device outbox
    let (requests_tx, requests_rx) = mpsc::channel(1);

    // Battery snapshot first so the face never sees an unknown level
    let battery_source = SysfsBattery::discover(POWER_SUPPLY_ROOT, config.battery.fallback_percent);
    let snapshot = battery_source.peek();

    let outbox = ChannelOutbox::new(requests_tx, events_tx.clone(), config.messaging.outbox_size);
    let mut face = Watchface::new(TerminalSurface::stdout(), outbox, snapshot, &config);
    face.start(&Local::now().naive_local());

    let companion = Companion::new(
        weather_provider(&config, offline)?,
        config.messaging.inbox_size,
        events_tx.clone(),
    );
    tokio::spawn(companion.run(requests_rx));
    tokio::spawn(scheduler::run_ticks(events_tx.clone()));
    tokio::spawn(battery::poll(
        battery_source,
        Duration::from_secs(config.battery.poll_seconds.max(1)),
        snapshot,
        events_tx,
    ));

    tokio::select! {
        _ = face.run(events_rx) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("waiting for Ctrl-C")?;
            info!("Shutting down");
        }
    }

    Ok(())
}
