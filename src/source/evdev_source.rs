//! evdev-backed event source for `/dev/input/event*` nodes

use std::collections::VecDeque;
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use evdev::raw_stream::RawDevice;
use evdev::{EventType, InputEvent, SynchronizationCode};
use tracing::{debug, error, info, warn};

use super::{DeviceInfo, EventKind, EventSource, RawEvent, ReadMode, ReadStatus, SourceError};

/// Reads a gamepad through the kernel evdev interface
///
/// The device is opened non-blocking in [`EventSource::attach`]. When the kernel
/// reports `SYN_DROPPED`, buffered events are discarded and the current key and
/// axis state is queued for replay in [`ReadMode::Sync`].
pub struct EvdevSource {
    path: PathBuf,
    device: Option<RawDevice>,
    pending: VecDeque<RawEvent>,
    sync_queue: VecDeque<RawEvent>,
}

impl EvdevSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            device: None,
            pending: VecDeque::new(),
            sync_queue: VecDeque::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn set_nonblocking(device: &RawDevice) -> io::Result<()> {
        let fd = device.as_raw_fd();
        // SAFETY: `fd` belongs to `device`, which outlives both calls.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: as above.
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn convert(event: &InputEvent) -> RawEvent {
        RawEvent {
            kind: EventKind::from_type(event.event_type().0),
            code: event.code(),
            value: event.value(),
            timestamp: DateTime::<Local>::from(event.timestamp()),
        }
    }

    fn read_error(err: io::Error) -> SourceError {
        if err.raw_os_error() == Some(libc::ENODEV) {
            SourceError::Disconnected(err.to_string())
        } else {
            SourceError::Io(err)
        }
    }

    /// Pull whatever the kernel has buffered into `pending`.
    ///
    /// Returns `true` if the batch contained `SYN_DROPPED` and the sync queue
    /// was rebuilt.
    fn fill_pending(&mut self) -> Result<bool, SourceError> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| SourceError::Disconnected("device not attached".to_string()))?;

        let events: Vec<InputEvent> = match device.fetch_events() {
            Ok(events) => events.collect(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) => return Err(Self::read_error(e)),
        };

        let dropped = events.iter().any(|event| {
            event.event_type() == EventType::SYNCHRONIZATION
                && event.code() == SynchronizationCode::SYN_DROPPED.0
        });

        if dropped {
            warn!(
                "Kernel dropped input events on {}, resynchronising",
                self.path.display()
            );
            self.pending.clear();
            self.sync_queue = Self::snapshot(device)?;
            debug!("Queued {} state events for resync", self.sync_queue.len());
            return Ok(true);
        }

        self.pending.extend(
            events
                .iter()
                .filter(|event| event.event_type() != EventType::SYNCHRONIZATION)
                .map(Self::convert),
        );
        Ok(false)
    }

    /// Current key and axis state expressed as events
    fn snapshot(device: &RawDevice) -> Result<VecDeque<RawEvent>, SourceError> {
        let mut queue = VecDeque::new();

        let key_state = device.get_key_state().map_err(Self::read_error)?;
        if let Some(supported) = device.supported_keys() {
            for key in supported.iter() {
                queue.push_back(RawEvent::key(key.0, i32::from(key_state.contains(key))));
            }
        }

        for (axis, abs_info) in device.get_absinfo().map_err(Self::read_error)? {
            queue.push_back(RawEvent::abs(axis.0, abs_info.value()));
        }

        Ok(queue)
    }
}

impl EventSource for EvdevSource {
    fn attach(&mut self) -> Result<DeviceInfo, SourceError> {
        info!("Opening input device {}", self.path.display());
        let device = RawDevice::open(&self.path).map_err(|source| {
            error!("Failed to open {}: {}", self.path.display(), source);
            SourceError::Open {
                path: self.path.clone(),
                source,
            }
        })?;

        Self::set_nonblocking(&device)
            .map_err(|e| SourceError::Handshake(format!("cannot enable non-blocking reads: {e}")))?;

        if device.supported_absolute_axes().is_none() && device.supported_keys().is_none() {
            return Err(SourceError::Handshake(format!(
                "{} reports neither keys nor absolute axes",
                self.path.display()
            )));
        }

        let input_id = device.input_id();
        let info = DeviceInfo {
            name: device.name().unwrap_or("Unknown device").to_string(),
            bus_type: input_id.bus_type().0,
            vendor: input_id.vendor(),
            product: input_id.product(),
        };

        self.pending.clear();
        self.sync_queue.clear();
        self.device = Some(device);
        Ok(info)
    }

    fn next_event(&mut self, mode: ReadMode) -> Result<ReadStatus, SourceError> {
        if mode == ReadMode::Sync {
            return Ok(match self.sync_queue.pop_front() {
                Some(event) => ReadStatus::Resync(event),
                None => ReadStatus::NotReady,
            });
        }

        if self.pending.is_empty() && self.fill_pending()? {
            return Ok(match self.sync_queue.pop_front() {
                Some(event) => ReadStatus::Resync(event),
                None => ReadStatus::NotReady,
            });
        }

        Ok(match self.pending.pop_front() {
            Some(event) => ReadStatus::Event(event),
            None => ReadStatus::NotReady,
        })
    }

    fn release(&mut self) {
        if self.device.take().is_some() {
            info!("Released input device {}", self.path.display());
        }
        self.pending.clear();
        self.sync_queue.clear();
    }
}
