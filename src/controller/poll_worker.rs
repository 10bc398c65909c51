use chrono::Local;
use statum::{machine, state};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::codec;
use super::state::SharedState;
use crate::config::GamepadSettings;
use crate::source::{DeviceInfo, EventSource, RawEvent, ReadMode, ReadStatus, SourceError};

// Worker settings
#[derive(Clone, Debug)]
pub struct WorkerSettings {
    pub idle_wait: Duration,
    pub stats_interval: chrono::Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_millis(1),
            stats_interval: chrono::Duration::seconds(10),
        }
    }
}

impl From<&GamepadSettings> for WorkerSettings {
    fn from(settings: &GamepadSettings) -> Self {
        Self {
            idle_wait: settings.idle_wait(),
            stats_interval: settings.stats_interval(),
        }
    }
}

// Why the poll loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    SourceLost(String),
}

/// Lifecycle of the poll worker as seen from the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Starting,
    Running,
    Stopped,
    /// The device went away; the state table holds the last known values
    Disconnected,
}

impl WorkerStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerStatus::Starting,
            1 => WorkerStatus::Running,
            2 => WorkerStatus::Stopped,
            _ => WorkerStatus::Disconnected,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerStatus::Starting => 0,
            WorkerStatus::Running => 1,
            WorkerStatus::Stopped => 2,
            WorkerStatus::Disconnected => 3,
        }
    }
}

// Status shared between the worker thread and its handle
#[derive(Debug, Clone, Default)]
pub struct StatusCell(Arc<AtomicU8>);

impl StatusCell {
    pub fn get(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, status: WorkerStatus) {
        self.0.store(status.as_u8(), Ordering::Release);
    }
}

/// Result of one read attempt in the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// An event was decoded and written to the state table
    Applied,
    /// An event arrived but the decoder does not model it
    Ignored,
    /// Nothing was ready
    Idle,
}

// Define worker states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum WorkerState {
    Starting,
    Running,
    Stopping(StopReason),
    Stopped(StopReason),
}

#[machine]
pub struct PollWorker<S: WorkerState> {
    // Owned for the worker's whole lifetime, never shared
    source: Box<dyn EventSource>,

    // Table written by this worker only
    shared: SharedState,

    // Cooperative stop flag, checked once per iteration
    stop: Arc<AtomicBool>,

    status: StatusCell,

    settings: WorkerSettings,

    // Normal until the source asks for a resync
    read_mode: ReadMode,
}

impl<S: WorkerState> PollWorker<S> {
    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }
}

impl PollWorker<Starting> {
    pub fn create(
        source: Box<dyn EventSource>,
        shared: SharedState,
        stop: Arc<AtomicBool>,
        status: StatusCell,
        settings: WorkerSettings,
    ) -> Self {
        debug!("Creating poll worker with settings: {:?}", settings);
        status.set(WorkerStatus::Starting);
        Self::new(source, shared, stop, status, settings, ReadMode::Normal)
    }

    /// Attach the event source and transition to Running
    ///
    /// Fails if the source cannot be opened; the worker never runs without one.
    pub fn attach(mut self) -> Result<(PollWorker<Running>, DeviceInfo), SourceError> {
        let info = match self.source.attach() {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to attach event source: {}", e);
                self.status.set(WorkerStatus::Stopped);
                return Err(e);
            }
        };

        info!("Input device name: \"{}\"", info.name);
        info!(
            "Input device ID: bus {:#x} vendor {:#x} product {:#x}",
            info.bus_type, info.vendor, info.product
        );

        self.status.set(WorkerStatus::Running);
        debug!("Poll worker attached, transitioning to Running state");
        Ok((self.transition(), info))
    }
}

impl PollWorker<Running> {
    /// One read from the source, applied to the state table if it decodes
    pub fn poll_once(&mut self) -> Result<PollOutcome, SourceError> {
        match self.source.next_event(self.read_mode)? {
            ReadStatus::Event(event) => Ok(self.apply(&event)),
            ReadStatus::Resync(event) => {
                if self.read_mode != ReadMode::Sync {
                    warn!("Event source requested resync, switching to sync reads");
                    self.read_mode = ReadMode::Sync;
                }
                Ok(self.apply(&event))
            }
            ReadStatus::NotReady => {
                if self.read_mode == ReadMode::Sync {
                    info!("Resync finished, back to normal reads");
                    self.read_mode = ReadMode::Normal;
                }
                Ok(PollOutcome::Idle)
            }
        }
    }

    fn apply(&mut self, event: &RawEvent) -> PollOutcome {
        match codec::decode(event) {
            Some(update) => {
                debug!("Applying {:?} from {:?}", update, event);
                self.shared.apply(&update, event.timestamp);
                PollOutcome::Applied
            }
            None => {
                debug!("Ignoring unmapped event: {:?}", event);
                PollOutcome::Ignored
            }
        }
    }

    // Run until the stop flag is set or the source fails
    pub fn run(mut self) -> PollWorker<Stopping> {
        info!("Starting poll loop");

        // For performance monitoring
        let mut event_count: u64 = 0;
        let mut last_log_time = Local::now();

        loop {
            if self.stop.load(Ordering::Acquire) {
                info!("Stop requested, leaving poll loop");
                return self.transition_with(StopReason::Requested);
            }

            match self.poll_once() {
                Ok(PollOutcome::Applied) | Ok(PollOutcome::Ignored) => event_count += 1,
                // Never sleeps while holding the state lock
                Ok(PollOutcome::Idle) => thread::sleep(self.settings.idle_wait),
                Err(e) => {
                    error!("Lost event source: {}", e);
                    return self.transition_with(StopReason::SourceLost(e.to_string()));
                }
            }

            // Log throughput periodically
            let now = Local::now();
            let elapsed = now - last_log_time;
            if elapsed > self.settings.stats_interval {
                info!(
                    "Poll worker stats: {} events in last {} seconds (avg {:.2}/sec)",
                    event_count,
                    elapsed.num_seconds(),
                    event_count as f64 / elapsed.num_milliseconds().max(1) as f64 * 1000.0
                );
                event_count = 0;
                last_log_time = now;
            }
        }
    }
}

impl PollWorker<Stopping> {
    /// Release the source and record the final status
    pub fn release(mut self) -> PollWorker<Stopped> {
        let reason = self
            .get_state_data()
            .cloned()
            .unwrap_or(StopReason::Requested);

        self.source.release();
        match &reason {
            StopReason::Requested => self.status.set(WorkerStatus::Stopped),
            StopReason::SourceLost(cause) => {
                warn!("Keeping last known gamepad state after losing the device: {}", cause);
                self.status.set(WorkerStatus::Disconnected);
            }
        }

        info!("Poll worker stopped: {:?}", reason);
        self.transition_with(reason)
    }
}

impl PollWorker<Stopped> {
    pub fn reason(&self) -> StopReason {
        self.get_state_data()
            .cloned()
            .unwrap_or(StopReason::Requested)
    }
}

/// Owner side of a running poll worker thread
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    status: StatusCell,
    thread: Option<JoinHandle<StopReason>>,
}

impl WorkerHandle {
    /// Attach `source` on the calling thread, then move the worker onto its own
    /// thread
    pub fn spawn(
        source: Box<dyn EventSource>,
        shared: SharedState,
        settings: WorkerSettings,
    ) -> Result<(Self, DeviceInfo), WorkerSpawnError> {
        info!("Spawning poll worker with settings: {:?}", settings);

        let stop = Arc::new(AtomicBool::new(false));
        let status = StatusCell::default();

        let worker = PollWorker::create(source, shared, stop.clone(), status.clone(), settings);
        let (running, info) = worker.attach()?;

        let thread = thread::Builder::new()
            .name("padstate-poll".to_string())
            .spawn(move || running.run().release().reason())
            .map_err(|e| {
                error!("Failed to spawn poll worker thread: {}", e);
                WorkerSpawnError::Thread(e)
            })?;

        info!("Poll worker successfully started");
        Ok((
            Self {
                stop,
                status,
                thread: Some(thread),
            },
            info,
        ))
    }

    pub fn status(&self) -> WorkerStatus {
        self.status.get()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal stop and wait for the thread to exit
    ///
    /// Returns `None` if the worker was already joined.
    pub fn shutdown(&mut self) -> Option<thread::Result<StopReason>> {
        let thread = self.thread.take()?;
        debug!("Signalling poll worker to stop");
        self.stop.store(true, Ordering::Release);
        let result = thread.join();
        debug!("Poll worker joined");
        Some(result)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerSpawnError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to spawn poll worker thread: {0}")]
    Thread(#[source] std::io::Error),
}
