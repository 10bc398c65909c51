//! Scripted event source
//!
//! Replays a fixed list of read outcomes, then reports `NotReady` forever (or a
//! disconnect, if the script ends with one). A [`ScriptProbe`] shares counters
//! with the source so a test can observe it after it moved into the worker.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{DeviceInfo, EventSource, RawEvent, ReadMode, ReadStatus, SourceError};

/// One scripted read outcome
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Event(RawEvent),
    NotReady,
    Resync(RawEvent),
    Disconnect(String),
}

#[derive(Debug, Default)]
struct ProbeInner {
    consumed: AtomicUsize,
    reads_after_end: AtomicUsize,
    released: AtomicBool,
    dropped: AtomicBool,
    modes: Mutex<Vec<ReadMode>>,
}

/// Observer for a [`ScriptedSource`] that has been handed to a worker
#[derive(Debug, Clone, Default)]
pub struct ScriptProbe {
    inner: Arc<ProbeInner>,
}

impl ScriptProbe {
    /// Number of script steps served so far
    pub fn consumed(&self) -> usize {
        self.inner.consumed.load(Ordering::Acquire)
    }

    /// Read mode requested for each served script step, in order
    pub fn modes(&self) -> Vec<ReadMode> {
        self.inner
            .modes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// True once the source itself has been dropped
    pub fn dropped(&self) -> bool {
        self.inner.dropped.load(Ordering::Acquire)
    }

    /// Poll until at least `steps` script steps were served or `timeout` passes
    pub fn wait_for(&self, steps: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.consumed() < steps {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Poll until the source was read again after its script ran out
    ///
    /// Reads are issued by the same thread that applies events, so once this
    /// returns `true` every scripted event has been fully processed.
    pub fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.inner.reads_after_end.load(Ordering::Acquire) == 0 {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

#[derive(Debug)]
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    info: DeviceInfo,
    attach_error: Option<String>,
    probe: ScriptProbe,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            info: DeviceInfo {
                name: "Scripted Gamepad".to_string(),
                ..Default::default()
            },
            attach_error: None,
            probe: ScriptProbe::default(),
        }
    }

    pub fn from_events(events: impl IntoIterator<Item = RawEvent>) -> Self {
        let mut source = Self::new();
        source
            .steps
            .extend(events.into_iter().map(ScriptStep::Event));
        source
    }

    pub fn event(mut self, event: RawEvent) -> Self {
        self.steps.push_back(ScriptStep::Event(event));
        self
    }

    pub fn not_ready(mut self) -> Self {
        self.steps.push_back(ScriptStep::NotReady);
        self
    }

    pub fn resync(mut self, event: RawEvent) -> Self {
        self.steps.push_back(ScriptStep::Resync(event));
        self
    }

    pub fn disconnect(mut self, reason: impl Into<String>) -> Self {
        self.steps.push_back(ScriptStep::Disconnect(reason.into()));
        self
    }

    /// Make `attach` fail with a handshake error
    pub fn failing_attach(mut self, reason: impl Into<String>) -> Self {
        self.attach_error = Some(reason.into());
        self
    }

    pub fn with_info(mut self, info: DeviceInfo) -> Self {
        self.info = info;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn probe(&self) -> ScriptProbe {
        self.probe.clone()
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for ScriptedSource {
    fn attach(&mut self) -> Result<DeviceInfo, SourceError> {
        match &self.attach_error {
            Some(reason) => Err(SourceError::Handshake(reason.clone())),
            None => Ok(self.info.clone()),
        }
    }

    fn next_event(&mut self, mode: ReadMode) -> Result<ReadStatus, SourceError> {
        let Some(step) = self.steps.pop_front() else {
            self.probe.inner.reads_after_end.fetch_add(1, Ordering::AcqRel);
            return Ok(ReadStatus::NotReady);
        };

        self.probe
            .inner
            .modes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mode);
        self.probe.inner.consumed.fetch_add(1, Ordering::AcqRel);

        match step {
            ScriptStep::Event(event) => Ok(ReadStatus::Event(event)),
            ScriptStep::NotReady => Ok(ReadStatus::NotReady),
            ScriptStep::Resync(event) => Ok(ReadStatus::Resync(event)),
            ScriptStep::Disconnect(reason) => Err(SourceError::Disconnected(reason)),
        }
    }

    fn release(&mut self) {
        debug!("Releasing scripted source with {} steps left", self.steps.len());
        self.probe.inner.released.store(true, Ordering::Release);
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.probe.inner.dropped.store(true, Ordering::Release);
    }
}
