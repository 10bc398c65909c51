//! Canonical button and axis identifiers
//!
//! Both sets are closed: every slot in the state table corresponds to exactly
//! one variant, so an out-of-range index cannot be expressed.

use serde::{Deserialize, Serialize};

/// Digital inputs, including the d-pad synthesised from the hat switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ButtonId {
    Select,
    Start,
    Mode,
    North,
    South,
    East,
    West,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

impl ButtonId {
    pub const COUNT: usize = 17;

    pub const ALL: [ButtonId; Self::COUNT] = [
        ButtonId::Select,
        ButtonId::Start,
        ButtonId::Mode,
        ButtonId::North,
        ButtonId::South,
        ButtonId::East,
        ButtonId::West,
        ButtonId::LeftBumper,
        ButtonId::RightBumper,
        ButtonId::LeftTrigger,
        ButtonId::RightTrigger,
        ButtonId::LeftStick,
        ButtonId::RightStick,
        ButtonId::DPadUp,
        ButtonId::DPadDown,
        ButtonId::DPadLeft,
        ButtonId::DPadRight,
    ];

    /// Slot in the state table
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            ButtonId::Select => "Select",
            ButtonId::Start => "Start",
            ButtonId::Mode => "Mode",
            ButtonId::North => "North",
            ButtonId::South => "South",
            ButtonId::East => "East",
            ButtonId::West => "West",
            ButtonId::LeftBumper => "L1",
            ButtonId::RightBumper => "R1",
            ButtonId::LeftTrigger => "L2",
            ButtonId::RightTrigger => "R2",
            ButtonId::LeftStick => "L3",
            ButtonId::RightStick => "R3",
            ButtonId::DPadUp => "Up",
            ButtonId::DPadDown => "Down",
            ButtonId::DPadLeft => "Left",
            ButtonId::DPadRight => "Right",
        }
    }
}

/// Analog inputs, each normalised to [-1.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AxisId {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftTrigger,
    RightTrigger,
}

impl AxisId {
    pub const COUNT: usize = 6;

    pub const ALL: [AxisId; Self::COUNT] = [
        AxisId::LeftStickX,
        AxisId::LeftStickY,
        AxisId::RightStickX,
        AxisId::RightStickY,
        AxisId::LeftTrigger,
        AxisId::RightTrigger,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            AxisId::LeftStickX => "LX",
            AxisId::LeftStickY => "LY",
            AxisId::RightStickX => "RX",
            AxisId::RightStickY => "RY",
            AxisId::LeftTrigger => "LT",
            AxisId::RightTrigger => "RT",
        }
    }
}
