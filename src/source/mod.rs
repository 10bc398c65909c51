//! Raw input event sources
//!
//! The poll worker needs exactly one capability from its environment: fetch the
//! next raw `(type, code, value)` event, report that nothing is ready yet, or
//! report that the device dropped events and has to be re-synchronised.
//!
//! ```text
//! EventSource ──► ReadStatus::Event(RawEvent)   apply, read again immediately
//!             ──► ReadStatus::NotReady          idle wait, back to ReadMode::Normal
//!             ──► ReadStatus::Resync(RawEvent)  apply, next read in ReadMode::Sync
//! ```
//!
//! [`evdev_source::EvdevSource`] talks to a Linux `/dev/input/event*` node,
//! [`scripted::ScriptedSource`] replays a fixed script without hardware.

#[cfg(target_os = "linux")]
pub mod evdev_source;
pub mod scripted;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::controller::codes;

pub use scripted::{ScriptProbe, ScriptStep, ScriptedSource};

#[cfg(target_os = "linux")]
pub use evdev_source::EvdevSource;

/// Event type classification of a raw input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Sync,
    Key,
    Absolute,
    Other(u16),
}

impl EventKind {
    pub fn from_type(event_type: u16) -> Self {
        match event_type {
            codes::EV_SYN => EventKind::Sync,
            codes::EV_KEY => EventKind::Key,
            codes::EV_ABS => EventKind::Absolute,
            other => EventKind::Other(other),
        }
    }
}

/// One raw event as delivered by the device transport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
    pub timestamp: DateTime<Local>,
}

impl RawEvent {
    pub fn new(kind: EventKind, code: u16, value: i32) -> Self {
        Self {
            kind,
            code,
            value,
            timestamp: Local::now(),
        }
    }

    pub fn key(code: u16, value: i32) -> Self {
        Self::new(EventKind::Key, code, value)
    }

    pub fn abs(code: u16, value: i32) -> Self {
        Self::new(EventKind::Absolute, code, value)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// How the next read should be served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Incremental events in arrival order
    #[default]
    Normal,
    /// Replay of the device's current state after a drop
    Sync,
}

/// Outcome of a single read attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadStatus {
    Event(RawEvent),
    NotReady,
    /// Buffered events were lost; the carried event is part of the resync
    Resync(RawEvent),
}

/// Identity reported by a device when it is attached
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub bus_type: u16,
    pub vendor: u16,
    pub product: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to open input device {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input device handshake failed: {0}")]
    Handshake(String),

    #[error("Input device disconnected: {0}")]
    Disconnected(String),

    #[error("Failed to read input events: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability consumed by the poll worker
///
/// Implementations are owned by exactly one worker thread for their whole
/// attached lifetime, hence the `Send` bound.
pub trait EventSource: Send {
    /// Acquire the underlying device. Called once before the first read.
    fn attach(&mut self) -> Result<DeviceInfo, SourceError>;

    /// Fetch the next event without blocking for longer than a short timeout.
    ///
    /// An `Err` after a successful attach means the device is gone.
    fn next_event(&mut self, mode: ReadMode) -> Result<ReadStatus, SourceError>;

    /// Release the underlying device. Reads after this are not expected.
    fn release(&mut self) {}
}

impl<T: EventSource + ?Sized> EventSource for Box<T> {
    fn attach(&mut self) -> Result<DeviceInfo, SourceError> {
        (**self).attach()
    }

    fn next_event(&mut self, mode: ReadMode) -> Result<ReadStatus, SourceError> {
        (**self).next_event(mode)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
