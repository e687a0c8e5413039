//! # Watch ⇄ Companion Message Contract
//!
//! Messages exchanged with the companion process are small dictionaries of
//! integer keys to typed values. This module defines that dictionary, the
//! result codes reported for deliveries, and the [`Outbox`] seam the
//! watchface sends through.
//!
//! ## Wire Size
//! Buffers on both sides are fixed (128 bytes by default). The encoded size of
//! a dictionary follows the classic watch message layout:
//! - 1 byte tuple count
//! - per tuple: 4 byte key, 1 byte type, 2 byte length, then the value
//! - strings carry their terminator
//!
//! A dictionary that does not fit the buffer is rejected with
//! [`MessageError::BufferOverflow`].
//!
//! ## Delivery
//! [`Outbox::send`] returns once the message is queued. Whether it was
//! actually delivered is reported later as an [`Event`](crate::event::Event)
//! (`OutboxSent` / `OutboxFailed`).

use crate::event::{Event, EventSender};
use log::error;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Key of the temperature field in a weather reply.
pub const KEY_TEMPERATURE: u32 = 0;
/// Key of the conditions field in a weather reply.
pub const KEY_CONDITIONS: u32 = 1;
/// Key of the single marker field in a weather request.
pub const KEY_REQUEST_WEATHER: u32 = 0;

/// Default inbox and outbox size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 128;

const DICT_HEADER_LEN: usize = 1;
const TUPLE_HEADER_LEN: usize = 4 + 1 + 2;

/// Reasons a message could not be sent or received.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageError {
    /// No companion is connected
    #[error("not connected")]
    NotConnected,
    /// A previous message is still in flight
    #[error("busy sending")]
    BusySending,
    /// The encoded message does not fit the buffer
    #[error("buffer overflow")]
    BufferOverflow,
}

/// A typed dictionary value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TupleValue {
    ByteArray(Vec<u8>),
    CString(String),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    Int8(i8),
    Int16(i16),
    Int32(i32),
}

impl TupleValue {
    /// Encoded size of the value payload, without the tuple header.
    pub fn encoded_len(&self) -> usize {
        match self {
            TupleValue::ByteArray(bytes) => bytes.len(),
            TupleValue::CString(s) => s.len() + 1,
            TupleValue::UInt8(_) | TupleValue::Int8(_) => 1,
            TupleValue::UInt16(_) | TupleValue::Int16(_) => 2,
            TupleValue::UInt32(_) | TupleValue::Int32(_) => 4,
        }
    }

    /// Integer view of the value. `UInt32` values above `i32::MAX` and
    /// non-integer values yield `None`.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            TupleValue::UInt8(v) => Some(v.into()),
            TupleValue::UInt16(v) => Some(v.into()),
            TupleValue::UInt32(v) => i32::try_from(v).ok(),
            TupleValue::Int8(v) => Some(v.into()),
            TupleValue::Int16(v) => Some(v.into()),
            TupleValue::Int32(v) => Some(v),
            TupleValue::ByteArray(_) | TupleValue::CString(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TupleValue::CString(s) => Some(s),
            _ => None,
        }
    }
}

/// Key/value message exchanged with the companion.
///
/// # Example
/// ```
/// use watchface_lib::message::{Dictionary, TupleValue, KEY_TEMPERATURE};
///
/// let dict = Dictionary::new().with(KEY_TEMPERATURE, TupleValue::Int32(72));
/// assert_eq!(dict.get(KEY_TEMPERATURE).and_then(TupleValue::as_i32), Some(72));
/// assert_eq!(dict.encoded_len(), 1 + 7 + 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dictionary {
    tuples: BTreeMap<u32, TupleValue>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: u32, value: TupleValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, replacing any previous value under `key`.
    pub fn insert(&mut self, key: u32, value: TupleValue) -> Option<TupleValue> {
        self.tuples.insert(key, value)
    }

    pub fn get(&self, key: u32) -> Option<&TupleValue> {
        self.tuples.get(&key)
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Size of the dictionary on the wire.
    pub fn encoded_len(&self) -> usize {
        DICT_HEADER_LEN
            + self
                .tuples
                .values()
                .map(|v| TUPLE_HEADER_LEN + v.encoded_len())
                .sum::<usize>()
    }

    /// Check the dictionary against a buffer of `capacity` bytes.
    pub fn fits(&self, capacity: usize) -> Result<(), MessageError> {
        if self.encoded_len() > capacity {
            Err(MessageError::BufferOverflow)
        } else {
            Ok(())
        }
    }
}

/// The outbound half of the message channel.
pub trait Outbox {
    /// Queue `message` for delivery.
    ///
    /// An `Err` means the message was rejected before it was queued. Once
    /// queued, the delivery outcome arrives later as an event.
    fn send(&mut self, message: Dictionary) -> Result<(), MessageError>;
}

/// Outbox backed by a tokio channel to the companion task.
///
/// A full or closed channel is reported asynchronously as
/// `Event::OutboxFailed`, the same way a lost delivery would be.
pub struct ChannelOutbox {
    requests: mpsc::Sender<Dictionary>,
    events: EventSender,
    capacity: usize,
}

impl ChannelOutbox {
    pub fn new(requests: mpsc::Sender<Dictionary>, events: EventSender, capacity: usize) -> Self {
        Self {
            requests,
            events,
            capacity,
        }
    }

    fn report_failure(&self, reason: MessageError) {
        if self.events.try_send(Event::OutboxFailed(reason)).is_err() {
            error!("Event queue unavailable, outbox failure ({reason}) lost");
        }
    }
}

impl Outbox for ChannelOutbox {
    fn send(&mut self, message: Dictionary) -> Result<(), MessageError> {
        message.fits(self.capacity)?;
        match self.requests.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.report_failure(MessageError::BusySending),
            Err(TrySendError::Closed(_)) => self.report_failure(MessageError::NotConnected),
        }
        Ok(())
    }
}

/// Outbox that keeps every accepted message in memory.
#[derive(Debug)]
pub struct RecordingOutbox {
    capacity: usize,
    sent: Vec<Dictionary>,
}

impl Default for RecordingOutbox {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }
}

impl RecordingOutbox {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            sent: Vec::new(),
        }
    }

    pub fn sent(&self) -> &[Dictionary] {
        &self.sent
    }
}

impl Outbox for RecordingOutbox {
    fn send(&mut self, message: Dictionary) -> Result<(), MessageError> {
        message.fits(self.capacity)?;
        self.sent.push(message);
        Ok(())
    }
}
