//! Events delivered to the watchface loop.
//!
//! Every producer (minute ticks, battery changes, the companion link) posts
//! into one bounded queue. The watchface is the only consumer and handles
//! one event at a time, so none of its state needs locking.

use crate::battery::BatteryChargeState;
use crate::message::{Dictionary, MessageError};
use chrono::NaiveDateTime;
use tokio::sync::mpsc;

/// Queue depth; producers are slow (minutes) so this only absorbs bursts.
pub const EVENT_QUEUE_DEPTH: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Wall-clock minute boundary, truncated to the minute
    Tick(NaiveDateTime),
    /// Battery charge changed
    Battery(BatteryChargeState),
    /// Message from the companion
    InboxReceived(Dictionary),
    /// An inbound message was lost before it reached us
    InboxDropped(MessageError),
    /// The companion acknowledged our last message
    OutboxSent,
    /// Our last message was not delivered
    OutboxFailed(MessageError),
}

pub type EventSender = mpsc::Sender<Event>;
pub type EventReceiver = mpsc::Receiver<Event>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_QUEUE_DEPTH)
}
