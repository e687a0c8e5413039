//! # Companion Process
//!
//! The companion sits on the other end of the message channel. It answers
//! every request with the current temperature and conditions, fetched from
//! OpenWeatherMap (imperial units) or taken from a fixed offline sample.
//!
//! ## Message Flow
//! 1. **Receive**: a request arrives from the watch's outbox
//! 2. **Acknowledge**: `OutboxSent` is posted back, the watch's send is done
//! 3. **Fetch**: current weather is looked up
//! 4. **Reply**: `{TEMPERATURE, CONDITIONS}` is posted as `InboxReceived`,
//!    or `InboxDropped(BufferOverflow)` if it would not fit the watch inbox
//!
//! A failed fetch produces no reply. The companion logs it and the watch
//! keeps its last weather line until the next request.

use crate::event::{Event, EventSender};
use crate::message::{Dictionary, MessageError, TupleValue, KEY_CONDITIONS, KEY_TEMPERATURE};
use log::{debug, error, info};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

const OWM_CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Errors that can occur while fetching weather for the watch.
#[derive(Error, Debug)]
pub enum CompanionError {
    /// HTTP request failed (network, server, or protocol error).
    /// The request URL is stripped so the API key never reaches a log.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Response body was not the expected JSON
    #[error("bad weather payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Response parsed but lacked a field we need
    #[error("weather payload missing {0}")]
    MissingField(&'static str),
}

impl From<reqwest::Error> for CompanionError {
    fn from(e: reqwest::Error) -> Self {
        CompanionError::Http(e.without_url())
    }
}

/// Weather as the companion sees it, before it goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temperature_f: i32,
    pub conditions: String,
}

impl CurrentWeather {
    pub fn to_dictionary(&self) -> Dictionary {
        Dictionary::new()
            .with(KEY_TEMPERATURE, TupleValue::Int32(self.temperature_f))
            .with(KEY_CONDITIONS, TupleValue::CString(self.conditions.clone()))
    }
}

// ── OWM JSON structures ─────────────────────────────────────────────

#[derive(Deserialize)]
struct OwmCurrentRoot {
    main: Option<OwmMain>,
    weather: Option<Vec<OwmWeather>>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: Option<f64>,
}

#[derive(Deserialize)]
struct OwmWeather {
    main: Option<String>,
}

/// Parse an OpenWeatherMap current-weather response fetched with
/// `units=imperial`. Conditions are the short group name ("Clear", "Rain").
pub fn parse_owm_current(json: &str) -> Result<CurrentWeather, CompanionError> {
    let root: OwmCurrentRoot = serde_json::from_str(json)?;

    let temp = root
        .main
        .and_then(|m| m.temp)
        .ok_or(CompanionError::MissingField("main.temp"))?;
    let conditions = root
        .weather
        .and_then(|w| w.into_iter().next())
        .and_then(|w| w.main)
        .ok_or(CompanionError::MissingField("weather[0].main"))?;

    Ok(CurrentWeather {
        temperature_f: temp.round() as i32,
        conditions,
    })
}

/// Where the companion gets its weather.
pub enum WeatherProvider {
    OpenWeatherMap {
        client: reqwest::Client,
        endpoint: String,
        query: String,
        api_key: String,
    },
    Fixed(CurrentWeather),
}

impl WeatherProvider {
    pub fn open_weather_map(query: &str, api_key: &str) -> Result<Self, CompanionError> {
        Self::open_weather_map_at(OWM_CURRENT_URL, query, api_key)
    }

    /// Same as [`open_weather_map`](Self::open_weather_map) against another
    /// current-weather endpoint.
    pub fn open_weather_map_at(
        endpoint: &str,
        query: &str,
        api_key: &str,
    ) -> Result<Self, CompanionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(WeatherProvider::OpenWeatherMap {
            client,
            endpoint: endpoint.to_owned(),
            query: query.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    pub async fn fetch(&self) -> Result<CurrentWeather, CompanionError> {
        match self {
            WeatherProvider::OpenWeatherMap {
                client,
                endpoint,
                query,
                api_key,
            } => {
                info!("Fetching current weather for {}", query);
                let body = client
                    .get(format!("{endpoint}?{query}"))
                    .query(&[("units", "imperial"), ("appid", api_key.as_str())])
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                parse_owm_current(&body)
            }
            WeatherProvider::Fixed(weather) => Ok(weather.clone()),
        }
    }
}

pub struct Companion {
    provider: WeatherProvider,
    inbox_size: usize,
    events: EventSender,
}

impl Companion {
    /// `inbox_size` is the watch's inbox buffer; larger replies are dropped.
    pub fn new(provider: WeatherProvider, inbox_size: usize, events: EventSender) -> Self {
        Self {
            provider,
            inbox_size,
            events,
        }
    }

    /// Serve requests until the watch's outbox or event queue goes away.
    pub async fn run(self, mut requests: mpsc::Receiver<Dictionary>) {
        while let Some(request) = requests.recv().await {
            if !self.handle_request(request).await {
                break;
            }
        }
        debug!("Companion stopped");
    }

    /// Returns `false` once the event queue is closed.
    async fn handle_request(&self, request: Dictionary) -> bool {
        debug!("Companion received request with {} fields", request.len());
        if self.events.send(Event::OutboxSent).await.is_err() {
            return false;
        }

        let weather = match self.provider.fetch().await {
            Ok(weather) => weather,
            Err(e) => {
                error!("Weather fetch failed: {}", e);
                return true;
            }
        };

        let reply = weather.to_dictionary();
        let event = match reply.fits(self.inbox_size) {
            Ok(()) => Event::InboxReceived(reply),
            Err(reason) => Event::InboxDropped(reason),
        };
        self.events.send(event).await.is_ok()
    }
}

/// Build the reply a companion would send, without a channel.
///
/// Handy for checking a sample against an inbox size up front.
pub fn reply_for(weather: &CurrentWeather, inbox_size: usize) -> Result<Dictionary, MessageError> {
    let reply = weather.to_dictionary();
    reply.fits(inbox_size)?;
    Ok(reply)
}
