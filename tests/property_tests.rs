//! Property-based tests for event decoding.
//!
//! Uses proptest with 500 cases to pin the rescale law, Y-axis inversion, hat
//! decomposition and the no-op behaviour for codes outside the layout.

use padstate::controller::{codes, decode, rescale_axis, GamepadState, StateUpdate};
use padstate::source::EventKind;
use padstate::{AxisId, ButtonId, RawEvent};
use proptest::prelude::*;

const TOLERANCE: f32 = 1e-5;

const LINEAR_AXES: [(u16, AxisId, bool); 6] = [
    (codes::ABS_X, AxisId::LeftStickX, false),
    (codes::ABS_Y, AxisId::LeftStickY, true),
    (codes::ABS_RX, AxisId::RightStickX, false),
    (codes::ABS_RY, AxisId::RightStickY, true),
    (codes::ABS_Z, AxisId::LeftTrigger, false),
    (codes::ABS_RZ, AxisId::RightTrigger, false),
];

const KNOWN_KEYS: [u16; 13] = [
    codes::BTN_SOUTH,
    codes::BTN_EAST,
    codes::BTN_NORTH,
    codes::BTN_WEST,
    codes::BTN_TL,
    codes::BTN_TR,
    codes::BTN_TL2,
    codes::BTN_TR2,
    codes::BTN_SELECT,
    codes::BTN_START,
    codes::BTN_MODE,
    codes::BTN_THUMBL,
    codes::BTN_THUMBR,
];

fn linear_axis() -> impl Strategy<Value = (u16, AxisId, bool)> {
    prop::sample::select(LINEAR_AXES.to_vec())
}

fn unknown_key() -> impl Strategy<Value = u16> {
    any::<u16>().prop_filter("must not be a mapped key", |code| !KNOWN_KEYS.contains(code))
}

fn unknown_abs() -> impl Strategy<Value = u16> {
    any::<u16>().prop_filter("must not be a mapped axis", |code| {
        !LINEAR_AXES.iter().any(|(mapped, _, _)| mapped == code)
            && *code != codes::ABS_HAT0X
            && *code != codes::ABS_HAT0Y
    })
}

fn dirty_state() -> GamepadState {
    let mut state = GamepadState::new();
    for (i, &button) in ButtonId::ALL.iter().enumerate() {
        state.set_button(button, (i % 2) as i32);
    }
    for (i, &axis) in AxisId::ALL.iter().enumerate() {
        state.set_axis(axis, i as f32 / 10.0 - 0.3);
    }
    state
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(500))]

    /// Every raw value in [0, 255] follows 2/255 * v - 1.
    #[test]
    fn prop_rescale_law(raw in 0i32..=255) {
        let expected = 2.0 / 255.0 * raw as f32 - 1.0;
        prop_assert!((rescale_axis(raw) - expected).abs() < TOLERANCE);
    }

    /// Rescaled values never leave [-1, 1], whatever the raw input.
    #[test]
    fn prop_rescale_stays_in_range(raw in any::<i32>()) {
        let value = rescale_axis(raw);
        prop_assert!((-1.0..=1.0).contains(&value), "{} rescaled to {}", raw, value);
    }

    /// Only the stick Y axes are negated.
    #[test]
    fn prop_inversion_applies_to_y_axes_only(raw in 0i32..=255, (code, axis, inverted) in linear_axis()) {
        let expected = if inverted { -rescale_axis(raw) } else { rescale_axis(raw) };
        prop_assert_eq!(decode(&RawEvent::abs(code, raw)), Some(StateUpdate::Axis(axis, expected)));
    }

    /// A hat value never leaves both directions of its pair pressed.
    #[test]
    fn prop_hat_pairs_are_mutually_exclusive(values in prop::collection::vec(-1i32..=1, 1..32)) {
        let mut state = GamepadState::new();
        let now = chrono::Local::now();
        for (i, value) in values.iter().enumerate() {
            let code = if i % 2 == 0 { codes::ABS_HAT0X } else { codes::ABS_HAT0Y };
            let update = decode(&RawEvent::abs(code, *value));
            prop_assert!(update.is_some());
            state.apply(&update.unwrap(), now);
            prop_assert!(state.button(ButtonId::DPadLeft) + state.button(ButtonId::DPadRight) <= 1);
            prop_assert!(state.button(ButtonId::DPadUp) + state.button(ButtonId::DPadDown) <= 1);
        }
    }

    /// Hat values outside {-1, 0, 1} decode to nothing.
    #[test]
    fn prop_hat_out_of_domain_is_noop(value in any::<i32>().prop_filter("outside hat domain", |v| !(-1..=1).contains(v))) {
        prop_assert_eq!(decode(&RawEvent::abs(codes::ABS_HAT0X, value)), None);
        prop_assert_eq!(decode(&RawEvent::abs(codes::ABS_HAT0Y, value)), None);
    }

    /// Unknown key codes leave every slot of the table untouched.
    #[test]
    fn prop_unknown_key_is_idempotent(code in unknown_key(), value in any::<i32>()) {
        let mut state = dirty_state();
        let before = state.clone();
        if let Some(update) = decode(&RawEvent::key(code, value)) {
            state.apply(&update, chrono::Local::now());
        }
        prop_assert_eq!(state, before);
    }

    /// Unknown absolute codes leave every slot of the table untouched.
    #[test]
    fn prop_unknown_abs_is_idempotent(code in unknown_abs(), value in any::<i32>()) {
        prop_assert_eq!(decode(&RawEvent::abs(code, value)), None);
    }

    /// Event types other than keys and absolute axes are ignored.
    #[test]
    fn prop_other_event_types_are_ignored(event_type in 4u16..0x20, code in any::<u16>(), value in any::<i32>()) {
        let event = RawEvent::new(EventKind::from_type(event_type), code, value);
        prop_assert_eq!(decode(&event), None);
    }

    /// Key values are passed through unchanged.
    #[test]
    fn prop_key_value_passthrough(index in 0usize..KNOWN_KEYS.len(), value in any::<i32>()) {
        match decode(&RawEvent::key(KNOWN_KEYS[index], value)) {
            Some(StateUpdate::Button(_, decoded)) => prop_assert_eq!(decoded, value),
            other => prop_assert!(false, "expected button update, got {:?}", other),
        }
    }
}
