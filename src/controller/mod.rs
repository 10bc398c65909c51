//! Controller subsystem for gamepad state polling
//!
//! Implements a single-writer pipeline:
//!
//! 1. [`codec`] - Raw event decoding into canonical button/axis writes
//! 2. [`state`] - Shared state table behind one mutex
//! 3. [`poll_worker`] - Background thread feeding the table from an event source
//! 4. [`gamepad_handle`] - Public accessors and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! EventSource ──► PollWorker ──► codec ──► SharedState ◄── GamepadHandle
//!                 (own thread)                             (any thread, read only)
//! ```

pub mod codec;
pub mod codes;
pub mod gamepad_handle;
pub mod ids;
pub mod poll_worker;
pub mod state;

pub use codec::{decode, rescale_axis, StateUpdate, MAX_AXIS_VALUE};
pub use gamepad_handle::{GamepadError, GamepadHandle};
pub use ids::{AxisId, ButtonId};
pub use poll_worker::{PollOutcome, StopReason, WorkerStatus};
pub use state::{GamepadSnapshot, GamepadState, SharedState};
