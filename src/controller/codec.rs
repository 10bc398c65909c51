//! Event decoding
//!
//! Maps one raw event onto the canonical state table. Pure and total: anything
//! the table does not model decodes to `None` rather than an error.
//!
//! - Keys pass their value through unchanged.
//! - Stick and trigger axes are rescaled from [0, 255] to [-1, 1]; both stick
//!   Y axes are negated so that positive means forward.
//! - The hat switch is split into a pair of mutually exclusive d-pad buttons.

use super::codes;
use super::ids::{AxisId, ButtonId};
use crate::source::{EventKind, RawEvent};

/// Upper bound of the raw axis range
pub const MAX_AXIS_VALUE: i32 = 255;

/// A write (or pair of writes) to apply to the state table in one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateUpdate {
    Button(ButtonId, i32),
    Axis(AxisId, f32),
    /// Both halves of a hat axis, negative direction first
    ButtonPair([(ButtonId, i32); 2]),
}

/// Directional buttons a hat axis decomposes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HatPair {
    negative: ButtonId,
    positive: ButtonId,
}

const HAT_X: HatPair = HatPair {
    negative: ButtonId::DPadLeft,
    positive: ButtonId::DPadRight,
};

const HAT_Y: HatPair = HatPair {
    negative: ButtonId::DPadUp,
    positive: ButtonId::DPadDown,
};

pub fn decode(event: &RawEvent) -> Option<StateUpdate> {
    match event.kind {
        EventKind::Key => decode_key(event.code, event.value),
        EventKind::Absolute => decode_abs(event.code, event.value),
        EventKind::Sync | EventKind::Other(_) => None,
    }
}

pub fn button_for_key(code: u16) -> Option<ButtonId> {
    let button = match code {
        codes::BTN_SELECT => ButtonId::Select,
        codes::BTN_START => ButtonId::Start,
        codes::BTN_MODE => ButtonId::Mode,
        codes::BTN_NORTH => ButtonId::North,
        codes::BTN_WEST => ButtonId::West,
        codes::BTN_SOUTH => ButtonId::South,
        codes::BTN_EAST => ButtonId::East,
        codes::BTN_TR => ButtonId::RightBumper,
        codes::BTN_TR2 => ButtonId::RightTrigger,
        codes::BTN_TL => ButtonId::LeftBumper,
        codes::BTN_TL2 => ButtonId::LeftTrigger,
        codes::BTN_THUMBR => ButtonId::RightStick,
        codes::BTN_THUMBL => ButtonId::LeftStick,
        _ => return None,
    };
    Some(button)
}

/// Axis for a linear absolute code, with whether it is sign-inverted
pub fn axis_for_abs(code: u16) -> Option<(AxisId, bool)> {
    let mapping = match code {
        codes::ABS_X => (AxisId::LeftStickX, false),
        codes::ABS_Y => (AxisId::LeftStickY, true),
        codes::ABS_RX => (AxisId::RightStickX, false),
        codes::ABS_RY => (AxisId::RightStickY, true),
        codes::ABS_Z => (AxisId::LeftTrigger, false),
        codes::ABS_RZ => (AxisId::RightTrigger, false),
        _ => return None,
    };
    Some(mapping)
}

/// `2/255 * raw - 1`, kept inside [-1, 1] for raw values outside [0, 255]
pub fn rescale_axis(raw: i32) -> f32 {
    (2.0 * raw as f32 / MAX_AXIS_VALUE as f32 - 1.0).clamp(-1.0, 1.0)
}

fn decode_key(code: u16, value: i32) -> Option<StateUpdate> {
    button_for_key(code).map(|button| StateUpdate::Button(button, value))
}

fn decode_abs(code: u16, value: i32) -> Option<StateUpdate> {
    match code {
        codes::ABS_HAT0X => decode_hat(HAT_X, value),
        codes::ABS_HAT0Y => decode_hat(HAT_Y, value),
        _ => axis_for_abs(code).map(|(axis, inverted)| {
            let rescaled = rescale_axis(value);
            StateUpdate::Axis(axis, if inverted { -rescaled } else { rescaled })
        }),
    }
}

fn decode_hat(pair: HatPair, value: i32) -> Option<StateUpdate> {
    let (negative, positive) = match value {
        0 => (0, 0),
        1 => (0, 1),
        -1 => (1, 0),
        _ => return None,
    };
    Some(StateUpdate::ButtonPair([
        (pair.negative, negative),
        (pair.positive, positive),
    ]))
}
