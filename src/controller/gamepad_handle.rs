//! Gamepad Handle - public façade over the poll worker and state table
//!
//! Owns the shared state table and the poll worker thread. Construction returns
//! only once the event source is attached; dropping the handle stops the worker
//! and blocks until its thread has exited.
//!
//! ```text
//! EventSource ──► PollWorker ──► codec::decode ──► SharedState ◄── GamepadHandle::{button, axis, buttons, axes}
//!                 (own thread)                     (one mutex)
//! ```

use tracing::{debug, error, info};

use super::ids::{AxisId, ButtonId};
use super::poll_worker::{StopReason, WorkerHandle, WorkerSettings, WorkerSpawnError, WorkerStatus};
use super::state::{GamepadSnapshot, SharedState};
use crate::config::GamepadSettings;
use crate::source::{DeviceInfo, EventSource, SourceError};

/// Errors that can occur while opening or stopping a gamepad
#[derive(Debug, thiserror::Error)]
pub enum GamepadError {
    /// The event source could not be opened or failed its handshake
    #[error("Event source error: {0}")]
    Source(#[from] SourceError),

    /// The operating system refused to start the poll worker thread
    #[error("Failed to spawn poll worker thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The poll worker thread panicked before it could be joined
    #[error("Poll worker panicked: {0}")]
    WorkerPanicked(String),

    /// No evdev support on this platform; use [`GamepadHandle::with_source`]
    #[error("Opening devices by path is not supported on this platform")]
    Unsupported,
}

impl From<WorkerSpawnError> for GamepadError {
    fn from(err: WorkerSpawnError) -> Self {
        match err {
            WorkerSpawnError::Source(e) => GamepadError::Source(e),
            WorkerSpawnError::Thread(e) => GamepadError::ThreadSpawn(e),
        }
    }
}

/// Handle to a running gamepad
///
/// All accessors take the same lock the poll worker writes under, so a bulk
/// read never mixes values from before and after a single raw event.
///
/// # Examples
///
/// ```rust,no_run
/// use padstate::{AxisId, ButtonId, GamepadHandle, GamepadSettings};
///
/// # fn main() -> Result<(), padstate::GamepadError> {
/// let settings = GamepadSettings {
///     device_path: "/dev/input/event5".into(),
///     ..Default::default()
/// };
/// let pad = GamepadHandle::open(Some(settings))?;
///
/// let dpad = pad.buttons(&[ButtonId::DPadUp, ButtonId::DPadDown]);
/// let throttle = pad.axis(AxisId::LeftStickY);
/// println!("dpad={:?} throttle={:.2}", dpad, throttle);
/// # Ok(())
/// # }
/// ```
pub struct GamepadHandle {
    shared: SharedState,
    worker: WorkerHandle,
    device: DeviceInfo,
}

impl GamepadHandle {
    /// Opens the evdev node named by `settings.device_path`
    pub fn open(settings: Option<GamepadSettings>) -> Result<Self, GamepadError> {
        let settings = settings.unwrap_or_default();

        #[cfg(target_os = "linux")]
        {
            let source = crate::source::EvdevSource::new(&settings.device_path);
            Self::with_source(source, Some(settings))
        }

        #[cfg(not(target_os = "linux"))]
        {
            error!(
                "Cannot open {}: evdev is only available on Linux",
                settings.device_path.display()
            );
            Err(GamepadError::Unsupported)
        }
    }

    /// Starts polling an arbitrary event source
    ///
    /// # Errors
    ///
    /// * [`GamepadError::Source`] - the source failed to attach
    /// * [`GamepadError::ThreadSpawn`] - the worker thread could not be started
    pub fn with_source<S>(source: S, settings: Option<GamepadSettings>) -> Result<Self, GamepadError>
    where
        S: EventSource + 'static,
    {
        let settings = settings.unwrap_or_default();
        info!("Initializing gamepad with settings: {:?}", settings);

        let shared = SharedState::new();
        let (worker, device) = WorkerHandle::spawn(
            Box::new(source),
            shared.clone(),
            WorkerSettings::from(&settings),
        )?;

        info!("Gamepad \"{}\" initialized successfully", device.name);
        Ok(Self {
            shared,
            worker,
            device,
        })
    }

    pub fn button(&self, id: ButtonId) -> i32 {
        self.shared.button(id)
    }

    pub fn axis(&self, id: AxisId) -> f32 {
        self.shared.axis(id)
    }

    /// Values for `ids` in request order, read under one lock acquisition
    pub fn buttons(&self, ids: &[ButtonId]) -> Vec<i32> {
        self.shared.buttons(ids)
    }

    /// Values for `ids` in request order, read under one lock acquisition
    pub fn axes(&self, ids: &[AxisId]) -> Vec<f32> {
        self.shared.axes(ids)
    }

    pub fn snapshot(&self) -> GamepadSnapshot {
        self.shared.snapshot()
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn status(&self) -> WorkerStatus {
        self.worker.status()
    }

    /// Stops the worker and waits for it, returning why the loop ended
    pub fn stop(mut self) -> Result<StopReason, GamepadError> {
        info!("Stopping gamepad \"{}\"", self.device.name);
        match self.worker.shutdown() {
            Some(Ok(reason)) => Ok(reason),
            Some(Err(panic)) => Err(GamepadError::WorkerPanicked(panic_message(panic))),
            None => Ok(StopReason::Requested),
        }
    }
}

impl Drop for GamepadHandle {
    fn drop(&mut self) {
        match self.worker.shutdown() {
            Some(Ok(reason)) => debug!("Gamepad dropped, worker exited: {:?}", reason),
            Some(Err(panic)) => error!("Poll worker panicked: {}", panic_message(panic)),
            None => {}
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
