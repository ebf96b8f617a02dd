// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Character-stream transport boundary.
//!
//! The adapter never implements a transport; it consumes one provided by the
//! host environment (typically a UART behind the firmware serial interface).
//! The trait mirrors that interface: single-shot `read`/`write` that may
//! transfer fewer bytes than asked, a control/status query, and two
//! bind-time configuration operations.
//!
//! # Interrupt safety
//!
//! `set_attributes` and `reset` may allocate or take locks inside the
//! transport and are only called while binding. Everything the adapter does
//! after binding goes through `read`, `write` and `get_control`, which an
//! implementor vouches for by implementing [`IrqSafe`].

use core::fmt;

use debugport_abi::{ControlFlags, TransportConfig};


#[cfg(any(test, feature = "std"))]
mod mock;

#[cfg(any(test, feature = "std"))]
pub use mock::{MockTransport, ReadStep};

// =============================================================================
// Errors
// =============================================================================

/// Status reported by a single transport operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The operation ran out of time, possibly after a partial transfer.
    Timeout,
    /// The device reported a hardware failure.
    DeviceError,
    /// The device cannot honor the request (e.g. unsupported line settings).
    Unsupported,
    /// A parameter was out of range for the device.
    InvalidParameter,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "transport timed out"),
            Self::DeviceError => write!(f, "transport device error"),
            Self::Unsupported => write!(f, "operation not supported by transport"),
            Self::InvalidParameter => write!(f, "invalid transport parameter"),
        }
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// Byte count paired with the status that ended a transfer.
///
/// A failed transfer still reports how many bytes moved before it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Transfer<E> {
    /// Bytes actually transferred.
    pub count: usize,
    /// Terminating status.
    pub status: Result<(), E>,
}

impl<E> Transfer<E> {
    /// A transfer that finished cleanly.
    #[inline]
    pub const fn complete(count: usize) -> Self {
        Self {
            count,
            status: Ok(()),
        }
    }

    /// A transfer that stopped with `error` after `count` bytes.
    #[inline]
    pub const fn partial(count: usize, error: E) -> Self {
        Self {
            count,
            status: Err(error),
        }
    }

    /// Returns true if the transfer finished cleanly.
    #[inline]
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Converts the error type, keeping the count.
    #[inline]
    pub fn map_err<F>(self, op: impl FnOnce(E) -> F) -> Transfer<F> {
        Transfer {
            count: self.count,
            status: self.status.map_err(op),
        }
    }

    /// Discards a partial count on failure.
    ///
    /// # Errors
    ///
    /// Returns the terminating error if the transfer did not finish cleanly.
    #[inline]
    pub fn into_result(self) -> Result<usize, E> {
        let count = self.count;
        self.status.map(|()| count)
    }
}

// =============================================================================
// Transport Traits
// =============================================================================

/// A character-stream device the debug port layers on.
pub trait SerialTransport {
    /// Resets the device.
    ///
    /// May allocate or lock internally. Only called while binding.
    ///
    /// # Errors
    ///
    /// Returns the device status on failure.
    fn reset(&self) -> Result<(), TransportError>;

    /// Applies line parameters.
    ///
    /// May allocate or lock internally. Only called while binding.
    ///
    /// # Errors
    ///
    /// Returns the device status if the parameters are rejected.
    fn set_attributes(&self, config: &TransportConfig) -> Result<(), TransportError>;

    /// Reads up to `buf.len()` bytes in one attempt.
    fn read(&self, buf: &mut [u8]) -> Transfer<TransportError>;

    /// Writes up to `data.len()` bytes in one attempt.
    fn write(&self, data: &[u8]) -> Transfer<TransportError>;

    /// Queries control and status bits.
    ///
    /// # Errors
    ///
    /// Returns the device status if the query fails.
    fn get_control(&self) -> Result<ControlFlags, TransportError>;
}

/// Marker for transports whose live-path operations are interrupt safe.
///
/// # Safety
///
/// Implementors guarantee that [`SerialTransport::read`],
/// [`SerialTransport::write`] and [`SerialTransport::get_control`]:
/// - never allocate memory,
/// - never acquire a lock or raise a priority level,
/// - never block without bound,
/// - tolerate concurrent calls on the same instance from interrupt context
///   on this or another processor.
///
/// The adapter relies on this to offer interrupt-context `reset`, `read`,
/// `write` and `poll` without adding any synchronization of its own.
pub unsafe trait IrqSafe: SerialTransport {}

impl<T: SerialTransport + ?Sized> SerialTransport for &T {
    fn reset(&self) -> Result<(), TransportError> {
        (**self).reset()
    }

    fn set_attributes(&self, config: &TransportConfig) -> Result<(), TransportError> {
        (**self).set_attributes(config)
    }

    fn read(&self, buf: &mut [u8]) -> Transfer<TransportError> {
        (**self).read(buf)
    }

    fn write(&self, data: &[u8]) -> Transfer<TransportError> {
        (**self).write(data)
    }

    fn get_control(&self) -> Result<ControlFlags, TransportError> {
        (**self).get_control()
    }
}

// SAFETY: forwards to `T`, which upholds the contract.
unsafe impl<T: IrqSafe + ?Sized> IrqSafe for &T {}
