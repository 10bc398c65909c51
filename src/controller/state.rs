//! Shared button/axis table
//!
//! [`GamepadState`] is the plain table. [`SharedState`] wraps it in the single
//! mutex that both the poll worker and every reader go through, so one decoded
//! event is always observed as a whole.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use super::codec::StateUpdate;
use super::ids::{AxisId, ButtonId};

#[derive(Debug, Clone, PartialEq)]
pub struct GamepadState {
    buttons: [i32; ButtonId::COUNT],
    axes: [f32; AxisId::COUNT],
    last_update: Option<DateTime<Local>>,
}

impl Default for GamepadState {
    fn default() -> Self {
        Self {
            buttons: [0; ButtonId::COUNT],
            axes: [0.0; AxisId::COUNT],
            last_update: None,
        }
    }
}

impl GamepadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, id: ButtonId, value: i32) {
        self.buttons[id.index()] = value;
    }

    /// Stores `value` clamped to [-1.0, 1.0]
    pub fn set_axis(&mut self, id: AxisId, value: f32) {
        self.axes[id.index()] = value.clamp(-1.0, 1.0);
    }

    pub fn button(&self, id: ButtonId) -> i32 {
        self.buttons[id.index()]
    }

    pub fn axis(&self, id: AxisId) -> f32 {
        self.axes[id.index()]
    }

    /// Values for `ids`, in the same order
    pub fn buttons(&self, ids: &[ButtonId]) -> Vec<i32> {
        ids.iter().map(|&id| self.button(id)).collect()
    }

    pub fn axes(&self, ids: &[AxisId]) -> Vec<f32> {
        ids.iter().map(|&id| self.axis(id)).collect()
    }

    pub fn apply(&mut self, update: &StateUpdate, at: DateTime<Local>) {
        match *update {
            StateUpdate::Button(id, value) => self.set_button(id, value),
            StateUpdate::Axis(id, value) => self.set_axis(id, value),
            StateUpdate::ButtonPair(pair) => {
                for (id, value) in pair {
                    self.set_button(id, value);
                }
            }
        }
        self.last_update = Some(at);
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn button_snapshot(&self) -> [i32; ButtonId::COUNT] {
        self.buttons
    }

    pub fn axis_snapshot(&self) -> [f32; AxisId::COUNT] {
        self.axes
    }

    pub fn snapshot(&self) -> GamepadSnapshot {
        GamepadSnapshot {
            buttons: self.button_snapshot(),
            axes: self.axis_snapshot(),
            last_update: self.last_update,
        }
    }
}

/// Copy of the whole table taken under one lock acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct GamepadSnapshot {
    pub buttons: [i32; ButtonId::COUNT],
    pub axes: [f32; AxisId::COUNT],
    pub last_update: Option<DateTime<Local>>,
}

impl GamepadSnapshot {
    pub fn button(&self, id: ButtonId) -> i32 {
        self.buttons[id.index()]
    }

    pub fn axis(&self, id: AxisId) -> f32 {
        self.axes[id.index()]
    }

    /// Buttons with a non-zero value
    pub fn pressed(&self) -> impl Iterator<Item = ButtonId> + '_ {
        ButtonId::ALL
            .into_iter()
            .filter(move |&id| self.button(id) != 0)
    }
}

/// The table plus its lock, shared between the poll worker and readers
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<GamepadState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking reader cannot leave the table half-written, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, GamepadState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn apply(&self, update: &StateUpdate, at: DateTime<Local>) {
        self.lock().apply(update, at);
    }

    /// Run `f` against the table while holding the lock
    pub fn read<R>(&self, f: impl FnOnce(&GamepadState) -> R) -> R {
        let guard = self.lock();
        f(&*guard)
    }

    pub fn button(&self, id: ButtonId) -> i32 {
        self.read(|state| state.button(id))
    }

    pub fn axis(&self, id: AxisId) -> f32 {
        self.read(|state| state.axis(id))
    }

    pub fn buttons(&self, ids: &[ButtonId]) -> Vec<i32> {
        self.read(|state| state.buttons(ids))
    }

    pub fn axes(&self, ids: &[AxisId]) -> Vec<f32> {
        self.read(|state| state.axes(ids))
    }

    pub fn snapshot(&self) -> GamepadSnapshot {
        self.read(GamepadState::snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let state = GamepadState::new();
        assert!(ButtonId::ALL.iter().all(|&id| state.button(id) == 0));
        assert!(AxisId::ALL.iter().all(|&id| state.axis(id) == 0.0));
        assert_eq!(state.last_update(), None);
    }

    #[test]
    fn bulk_reads_follow_request_order() {
        let mut state = GamepadState::new();
        state.set_button(ButtonId::Start, 1);
        state.set_button(ButtonId::DPadLeft, 1);
        state.set_axis(AxisId::RightTrigger, 0.5);

        assert_eq!(
            state.buttons(&[ButtonId::DPadLeft, ButtonId::Select, ButtonId::Start]),
            vec![1, 0, 1]
        );
        assert_eq!(
            state.axes(&[AxisId::RightTrigger, AxisId::LeftStickX, AxisId::RightTrigger]),
            vec![0.5, 0.0, 0.5]
        );
        assert!(state.buttons(&[]).is_empty());
    }

    #[test]
    fn bulk_and_single_reads_agree() {
        let shared = SharedState::new();
        let now = Local::now();
        shared.apply(&StateUpdate::Button(ButtonId::North, 1), now);
        shared.apply(&StateUpdate::Axis(AxisId::LeftStickY, -0.25), now);
        shared.apply(
            &StateUpdate::ButtonPair([(ButtonId::DPadUp, 1), (ButtonId::DPadDown, 0)]),
            now,
        );

        let bulk = shared.buttons(&ButtonId::ALL);
        let single: Vec<i32> = ButtonId::ALL.iter().map(|&id| shared.button(id)).collect();
        assert_eq!(bulk, single);

        let bulk = shared.axes(&AxisId::ALL);
        let single: Vec<f32> = AxisId::ALL.iter().map(|&id| shared.axis(id)).collect();
        assert_eq!(bulk, single);
    }

    #[test]
    fn pair_update_writes_both_buttons() {
        let mut state = GamepadState::new();
        let now = Local::now();
        state.apply(
            &StateUpdate::ButtonPair([(ButtonId::DPadLeft, 1), (ButtonId::DPadRight, 0)]),
            now,
        );
        assert_eq!(state.button(ButtonId::DPadLeft), 1);
        assert_eq!(state.button(ButtonId::DPadRight), 0);

        state.apply(
            &StateUpdate::ButtonPair([(ButtonId::DPadLeft, 0), (ButtonId::DPadRight, 1)]),
            now,
        );
        assert_eq!(state.button(ButtonId::DPadLeft), 0);
        assert_eq!(state.button(ButtonId::DPadRight), 1);
        assert_eq!(state.last_update(), Some(now));
    }

    #[test]
    fn axis_writes_are_clamped() {
        let mut state = GamepadState::new();
        state.set_axis(AxisId::LeftTrigger, 3.0);
        state.set_axis(AxisId::RightTrigger, -7.5);
        assert_eq!(state.axis(AxisId::LeftTrigger), 1.0);
        assert_eq!(state.axis(AxisId::RightTrigger), -1.0);
    }

    #[test]
    fn snapshot_lists_pressed_buttons() {
        let mut state = GamepadState::new();
        state.set_button(ButtonId::South, 1);
        state.set_button(ButtonId::DPadRight, 1);
        let snapshot = state.snapshot();
        let pressed: Vec<_> = snapshot.pressed().collect();
        assert_eq!(pressed, vec![ButtonId::South, ButtonId::DPadRight]);
        assert_eq!(snapshot.button(ButtonId::South), 1);
        assert_eq!(snapshot.axis(AxisId::LeftStickX), 0.0);
    }

    #[test]
    fn table_copies_are_indexed_by_id() {
        let mut state = GamepadState::new();
        state.set_button(ButtonId::Mode, 1);
        state.set_axis(AxisId::RightStickY, -0.5);

        let buttons = state.button_snapshot();
        let axes = state.axis_snapshot();
        assert_eq!(buttons[ButtonId::Mode.index()], 1);
        assert_eq!(buttons.iter().sum::<i32>(), 1);
        assert_eq!(axes[AxisId::RightStickY.index()], -0.5);

        state.set_button(ButtonId::Mode, 0);
        assert_eq!(buttons[ButtonId::Mode.index()], 1);
    }
}
