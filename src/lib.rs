//! Thread-safe gamepad state polling over Linux evdev
//!
//! A [`GamepadHandle`] attaches to an input device, starts one background
//! worker that decodes raw events into a fixed button/axis table, and lets any
//! thread read that table at any time.

pub mod config;
pub mod controller;
pub mod source;

pub use config::{ConfigError, GamepadSettings};
pub use controller::{
    AxisId, ButtonId, GamepadError, GamepadHandle, GamepadSnapshot, StopReason, WorkerStatus,
};
pub use source::{DeviceInfo, EventSource, RawEvent, ReadMode, ReadStatus, SourceError};
