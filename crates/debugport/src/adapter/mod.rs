// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The debug port transport adapter.
//!
//! [`DebugPort`] owns at most one bound transport and layers buffered,
//! timeout-aware, partial-I/O-tolerant `read`/`write` plus `poll` and a
//! drain-based `reset` on top of the transport's single-shot primitives.
//!
//! # State
//!
//! ```text
//! Unbound --bind--> Bound <--> Faulted
//!    ^                |           |
//!    +-----unbind-----+-----------+
//! ```
//!
//! Binding either applies a configuration (the requested one or the
//! fallback) or fails and leaves the adapter unbound. Faulted is entered
//! when a live operation sees a device error and left on the next
//! successful poll; it never blocks operations.
//!
//! # Interrupt safety
//!
//! `reset`, `read`, `write` and `poll` are the live path. They:
//! - take `&self` and keep all per-call state on the stack,
//! - touch only `read`, `write` and `get_control` of an [`IrqSafe`]
//!   transport,
//! - never allocate, lock, log, or loop without bound.
//!
//! `bind` and `unbind` run in ordinary context and are serialized by the
//! caller through `&mut self`.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use debugport_abi::TransportConfig;
use tracing::{debug, warn};

use crate::settings::AdapterSettings;
use crate::transport::{IrqSafe, SerialTransport, Transfer, TransportError};



// =============================================================================
// Errors and status
// =============================================================================

/// Status reported by the published debug port operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortError {
    /// No transport is bound.
    NotBound,
    /// The timeout budget ran out before the transfer completed.
    Timeout,
    /// The transport reported a hardware failure.
    DeviceError,
    /// The transport cannot honor the request.
    Unsupported,
    /// A parameter was out of range for the transport.
    InvalidParameter,
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBound => write!(f, "debug port not bound"),
            Self::Timeout => write!(f, "debug port timed out"),
            Self::DeviceError => write!(f, "debug port device error"),
            Self::Unsupported => write!(f, "operation not supported by debug port"),
            Self::InvalidParameter => write!(f, "invalid debug port parameter"),
        }
    }
}

impl From<TransportError> for PortError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => Self::Timeout,
            TransportError::DeviceError => Self::DeviceError,
            TransportError::Unsupported => Self::Unsupported,
            TransportError::InvalidParameter => Self::InvalidParameter,
        }
    }
}

/// Failure to bind a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindError {
    /// A transport is already bound.
    AlreadyBound,
    /// Both the requested and the fallback configuration were rejected.
    AttributesRejected(TransportError),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBound => write!(f, "debug port already bound"),
            Self::AttributesRejected(err) => {
                write!(f, "transport rejected line settings: {err}")
            }
        }
    }
}

/// Adapter lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdapterState {
    /// No transport attached.
    Unbound,
    /// Transport attached and healthy.
    Bound,
    /// Transport attached; the last live operation saw a device error.
    Faulted,
}

/// Result of a readiness poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStatus {
    /// At least one byte can be read.
    Ready,
    /// Nothing is waiting.
    NotReady,
}

// =============================================================================
// Published interface
// =============================================================================

/// The interrupt-safe debug port interface exposed to debuggers.
///
/// Every method may be called from interrupt context, re-entrantly, on any
/// processor.
pub trait DebugTransport {
    /// Discards all buffered inbound data.
    ///
    /// # Errors
    ///
    /// Returns `PortError::NotBound` if no transport is bound.
    fn reset(&self) -> Result<(), PortError>;

    /// Reads into `buf` within a budget of `timeout_us` microseconds.
    fn read(&self, timeout_us: u32, buf: &mut [u8]) -> Transfer<PortError>;

    /// Writes `data`.
    fn write(&self, timeout_us: u32, data: &[u8]) -> Transfer<PortError>;

    /// Reports whether a byte is waiting.
    ///
    /// # Errors
    ///
    /// Returns `PortError::DeviceError` if the transport cannot be queried,
    /// `PortError::NotBound` if no transport is bound.
    fn poll(&self) -> Result<PollStatus, PortError>;
}

// =============================================================================
// DebugPort
// =============================================================================

/// The live transport and the configuration actually in effect.
#[derive(Debug)]
pub struct BoundTransport<T> {
    transport: T,
    config: TransportConfig,
}

impl<T> BoundTransport<T> {
    /// The bound transport.
    #[inline]
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The configuration the transport accepted.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}

/// Debug port adapter over a serial transport.
#[derive(Debug)]
pub struct DebugPort<T> {
    bound: Option<BoundTransport<T>>,
    settings: AdapterSettings,
    faulted: AtomicBool,
}

impl<T> DebugPort<T> {
    /// Creates an unbound adapter.
    #[must_use]
    pub const fn new(settings: AdapterSettings) -> Self {
        Self {
            bound: None,
            settings,
            faulted: AtomicBool::new(false),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AdapterState {
        if self.bound.is_none() {
            AdapterState::Unbound
        } else if self.faulted.load(Ordering::Relaxed) {
            AdapterState::Faulted
        } else {
            AdapterState::Bound
        }
    }

    /// The bound transport and its configuration.
    #[inline]
    #[must_use]
    pub const fn bound(&self) -> Option<&BoundTransport<T>> {
        self.bound.as_ref()
    }

    /// The adapter's tunables.
    #[inline]
    #[must_use]
    pub const fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Releases the bound transport and returns it.
    ///
    /// Idempotent: returns `None` if nothing was bound.
    pub fn unbind(&mut self) -> Option<T> {
        self.faulted.store(false, Ordering::Relaxed);
        self.bound.take().map(|bound| {
            debug!("debug port unbound");
            bound.transport
        })
    }

    fn live(&self) -> Result<&BoundTransport<T>, PortError> {
        self.bound.as_ref().ok_or(PortError::NotBound)
    }

    fn note(&self, err: TransportError) {
        if err == TransportError::DeviceError {
            self.faulted.store(true, Ordering::Relaxed);
        }
    }
}

impl<T> Default for DebugPort<T> {
    fn default() -> Self {
        Self::new(AdapterSettings::DEFAULT)
    }
}

impl<T: SerialTransport> DebugPort<T> {
    /// Attaches `transport` and applies `config`.
    ///
    /// If the transport rejects `config`, the conservative fallback from
    /// [`TransportConfig::fallback`] is tried once. On success the transport
    /// is reset to flush stale data and the configuration in effect is
    /// returned. On failure the transport is dropped and the adapter stays
    /// unbound.
    ///
    /// # Errors
    ///
    /// Returns `BindError::AlreadyBound` if a transport is attached, or
    /// `BindError::AttributesRejected` with the fallback's error.
    pub fn bind(&mut self, transport: T, config: TransportConfig) -> Result<TransportConfig, BindError> {
        if self.bound.is_some() {
            return Err(BindError::AlreadyBound);
        }

        let effective = match transport.set_attributes(&config) {
            Ok(()) => config,
            Err(err) => {
                warn!(%err, %config, "transport rejected configuration, trying fallback");
                let fallback = config.fallback();
                transport.set_attributes(&fallback).map_err(|err| {
                    warn!(%err, "transport rejected fallback configuration");
                    BindError::AttributesRejected(err)
                })?;
                fallback
            }
        };

        if let Err(err) = transport.reset() {
            debug!(%err, "transport reset after bind failed, continuing");
        }

        self.faulted.store(false, Ordering::Relaxed);
        self.bound = Some(BoundTransport {
            transport,
            config: effective,
        });
        debug!(config = %effective, "debug port bound");
        Ok(effective)
    }
}

impl<T: IrqSafe> DebugPort<T> {
    /// Discards buffered inbound data one byte at a time.
    ///
    /// The transport's own reset may allocate or lock, so draining uses only
    /// `poll` and single-byte reads. Draining stops once `poll` reports
    /// nothing waiting, fails, or a read makes no progress; none of these
    /// are reported to the caller.
    ///
    /// # Errors
    ///
    /// Returns `PortError::NotBound` if no transport is bound.
    pub fn reset(&self) -> Result<(), PortError> {
        self.live()?;
        let mut bit_bucket = [0_u8; 1];
        while self.poll() == Ok(PollStatus::Ready) {
            if self.read(0, &mut bit_bucket).count == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Reads into `buf` within a budget of `timeout_us` microseconds.
    ///
    /// Repeats single-shot reads into the unfilled tail of `buf`. Each
    /// attempt that times out or delivers nothing charges one quantum
    /// against the budget (saturating at zero). At least one attempt is
    /// made; the loop stops when `buf` is full, the budget is spent, or the
    /// transport reports any other error.
    ///
    /// The status is that of the last attempt: `Ok` when `buf` was filled
    /// or the final attempt delivered data, `Timeout` when it timed out or
    /// delivered nothing, and any other error is the transport's,
    /// unchanged. With a zero budget this takes whatever is waiting and
    /// reports `Ok` if that was anything. The count never exceeds
    /// `buf.len()`.
    pub fn read(&self, timeout_us: u32, buf: &mut [u8]) -> Transfer<PortError> {
        let bound = match self.live() {
            Ok(bound) => bound,
            Err(err) => return Transfer::partial(0, err),
        };
        if buf.is_empty() {
            return Transfer::complete(0);
        }

        let quantum = self.settings.read_quantum_us();
        let mut budget = timeout_us;
        let mut filled = 0;
        let mut last = Ok(());
        loop {
            let remaining = buf.len() - filled;
            let attempt = bound.transport.read(&mut buf[filled..]);
            let got = attempt.count.min(remaining);
            filled += got;

            match attempt.status {
                Ok(()) if got > 0 => last = Ok(()),
                Ok(()) | Err(TransportError::Timeout) => {
                    budget = budget.saturating_sub(quantum);
                    last = Err(PortError::Timeout);
                }
                Err(err) => {
                    self.note(err);
                    return Transfer::partial(filled, err.into());
                }
            }

            if filled == buf.len() {
                return Transfer::complete(filled);
            }
            if budget == 0 {
                return Transfer {
                    count: filled,
                    status: last,
                };
            }
        }
    }

    /// Writes `data` in chunks of at most `write_chunk` bytes.
    ///
    /// Queries the control bits before every chunk to give a concurrent
    /// reader a chance to run; the result is not consulted. The last chunk
    /// is trimmed to the bytes that remain. Stops at the first transport
    /// error, or with `Timeout` if a write makes no progress.
    ///
    /// `_timeout_us` is accepted for interface compatibility. Each chunk is
    /// bounded by the transport's own timeout, so the call is bounded by
    /// `data.len()`. When every write is accepted in full this issues
    /// ⌈len / chunk⌉ transport writes; short writes add calls.
    pub fn write(&self, _timeout_us: u32, data: &[u8]) -> Transfer<PortError> {
        let bound = match self.live() {
            Ok(bound) => bound,
            Err(err) => return Transfer::partial(0, err),
        };

        let chunk = self.settings.write_chunk();
        let mut position = 0;
        while position < data.len() {
            let _ = bound.transport.get_control();

            let end = data.len().min(position + chunk);
            let attempt = bound.transport.write(&data[position..end]);
            let wrote = attempt.count.min(end - position);
            position += wrote;

            if let Err(err) = attempt.status {
                self.note(err);
                return Transfer::partial(position, err.into());
            }
            if wrote == 0 {
                return Transfer::partial(position, PortError::Timeout);
            }
        }
        Transfer::complete(position)
    }

    /// Reports whether a byte is waiting.
    ///
    /// `NotReady` exactly when the control query succeeds with
    /// `INPUT_BUFFER_EMPTY` set. Any failure of the query is a device error.
    ///
    /// # Errors
    ///
    /// Returns `PortError::DeviceError` if the control query fails, or
    /// `PortError::NotBound`.
    pub fn poll(&self) -> Result<PollStatus, PortError> {
        let bound = self.live()?;
        match bound.transport.get_control() {
            Ok(flags) => {
                self.faulted.store(false, Ordering::Relaxed);
                if flags.has_input() {
                    Ok(PollStatus::Ready)
                } else {
                    Ok(PollStatus::NotReady)
                }
            }
            Err(_) => {
                self.faulted.store(true, Ordering::Relaxed);
                Err(PortError::DeviceError)
            }
        }
    }
}

impl<T: IrqSafe> DebugTransport for DebugPort<T> {
    fn reset(&self) -> Result<(), PortError> {
        Self::reset(self)
    }

    fn read(&self, timeout_us: u32, buf: &mut [u8]) -> Transfer<PortError> {
        Self::read(self, timeout_us, buf)
    }

    fn write(&self, timeout_us: u32, data: &[u8]) -> Transfer<PortError> {
        Self::write(self, timeout_us, data)
    }

    fn poll(&self) -> Result<PollStatus, PortError> {
        Self::poll(self)
    }
}
