//! # Values Watchface Core Library
//!
//! This library holds everything a watchface needs beyond pixels: the minute
//! scheduling, the values rotation, and the message contract with a companion
//! process that supplies weather. It is built so the whole face can run, and
//! be tested, against in-memory collaborators.
//!
//! ## Design Philosophy
//!
//! ### One Consumer, Many Producers
//! - **Single event loop**: minute ticks, battery changes and companion
//!   messages are all [`event::Event`]s on one queue
//! - **Run to completion**: each event is handled without awaiting, so state
//!   in [`watchface::Watchface`] is never shared or locked
//! - **Per-source ordering**: events from one producer arrive in order; no
//!   ordering is promised between producers
//!
//! ### Bounded Text
//! Everything written to a surface goes through a fixed-size
//! [`heapless::String`] with `snprintf`-style truncation (see [`text`]).
//!
//! ### Degrade, Don't Fail
//! A lost request, a dropped reply or a partial payload is logged and the
//! face keeps showing its last good text. Nothing in the core returns an
//! error to the loop.
//!
//! ## Data Flow
//! 1. **Tick**: clock refresh → weather request (every 30 min) → values rotation
//! 2. **Reply**: companion weather + current battery → `"<battery>% <temp>F"`
//! 3. **Battery**: charge changes update the level used by the next reply

pub mod battery;
pub mod clock;
pub mod companion;
pub mod config;
pub mod display;
pub mod event;
pub mod message;
pub mod rotator;
pub mod scheduler;
pub mod text;
pub mod watchface;
pub mod weather;

pub use battery::{BatteryChargeState, BatterySource, BatteryTracker};
pub use display::{DisplaySurface, SurfaceId};
pub use event::Event;
pub use message::{Dictionary, Outbox, TupleValue};
pub use watchface::Watchface;
