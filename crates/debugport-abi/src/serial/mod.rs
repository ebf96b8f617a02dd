// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Serial line parameters and transport control flags.
//!
//! Raw values match the firmware serial interface so that parameters taken
//! from a stored path node can be handed to the transport unchanged.

use core::fmt;

use bitflags::bitflags;


// =============================================================================
// Defaults
// =============================================================================

/// Default baud rate when no descriptor is stored.
pub const DEFAULT_BAUD_RATE: u64 = 115_200;

/// Default receive FIFO depth. Never carried by the descriptor.
pub const DEFAULT_RECEIVE_FIFO_DEPTH: u32 = 16;

/// Default per-operation transport timeout in microseconds.
///
/// Also the quantum charged against a read's budget per timed-out attempt.
pub const DEFAULT_TIMEOUT_US: u32 = 50_000;

/// Default number of data bits.
pub const DEFAULT_DATA_BITS: u8 = 8;

// =============================================================================
// Parity / Stop Bits
// =============================================================================

/// Parity setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Parity {
    /// Whatever the transport considers its default.
    #[default]
    Default = 0,
    /// No parity bit.
    None = 1,
    /// Even parity.
    Even = 2,
    /// Odd parity.
    Odd = 3,
    /// Parity bit always 1.
    Mark = 4,
    /// Parity bit always 0.
    Space = 5,
}

impl Parity {
    /// Try to convert from a raw value.
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Default),
            1 => Some(Self::None),
            2 => Some(Self::Even),
            3 => Some(Self::Odd),
            4 => Some(Self::Mark),
            5 => Some(Self::Space),
            _ => None,
        }
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Stop bit setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum StopBits {
    /// Whatever the transport considers its default.
    #[default]
    Default = 0,
    /// One stop bit.
    One = 1,
    /// One and a half stop bits.
    OneFive = 2,
    /// Two stop bits.
    Two = 3,
}

impl StopBits {
    /// Try to convert from a raw value.
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Default),
            1 => Some(Self::One),
            2 => Some(Self::OneFive),
            3 => Some(Self::Two),
            _ => None,
        }
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// TransportConfig
// =============================================================================

/// Fully populated serial line configuration.
///
/// There is no partially initialized form: every constructor yields a value
/// with all six fields set, falling back to the defaults above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransportConfig {
    /// Bits per second. Zero asks the transport for its own default.
    pub baud_rate: u64,
    /// Receive FIFO depth. Zero asks the transport for its own default.
    pub receive_fifo_depth: u32,
    /// Per-operation transport timeout in microseconds.
    pub timeout_us: u32,
    /// Parity.
    pub parity: Parity,
    /// Data bits per character. Zero asks the transport for its own default.
    pub data_bits: u8,
    /// Stop bits.
    pub stop_bits: StopBits,
}

impl TransportConfig {
    /// Configuration used when no descriptor is stored or it cannot be parsed.
    pub const DEFAULT: Self = Self {
        baud_rate: DEFAULT_BAUD_RATE,
        receive_fifo_depth: DEFAULT_RECEIVE_FIFO_DEPTH,
        timeout_us: DEFAULT_TIMEOUT_US,
        parity: Parity::Default,
        data_bits: DEFAULT_DATA_BITS,
        stop_bits: StopBits::One,
    };

    /// Builds a configuration from descriptor-carried line parameters.
    ///
    /// FIFO depth and timeout are not part of the descriptor format and are
    /// always the defaults. Unknown parity or stop-bit values map to
    /// `Default`.
    #[must_use]
    pub const fn from_line(baud_rate: u64, data_bits: u8, raw_parity: u8, raw_stop_bits: u8) -> Self {
        Self {
            baud_rate,
            receive_fifo_depth: DEFAULT_RECEIVE_FIFO_DEPTH,
            timeout_us: DEFAULT_TIMEOUT_US,
            parity: match Parity::from_raw(raw_parity) {
                Some(parity) => parity,
                None => Parity::Default,
            },
            data_bits,
            stop_bits: match StopBits::from_raw(raw_stop_bits) {
                Some(stop_bits) => stop_bits,
                None => StopBits::Default,
            },
        }
    }

    /// The maximally conservative configuration tried after a rejection.
    ///
    /// Zeroes baud rate, FIFO depth and data bits so the transport picks its
    /// own defaults, resets parity and stop bits to `Default`, and keeps the
    /// timeout.
    #[must_use]
    pub const fn fallback(&self) -> Self {
        Self {
            baud_rate: 0,
            receive_fifo_depth: 0,
            timeout_us: self.timeout_us,
            parity: Parity::Default,
            data_bits: 0,
            stop_bits: StopBits::Default,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} baud, {} data bits, parity {:?}, stop {:?}, fifo {}, timeout {}us",
            self.baud_rate,
            self.data_bits,
            self.parity,
            self.stop_bits,
            self.receive_fifo_depth,
            self.timeout_us
        )
    }
}

// =============================================================================
// Control Flags
// =============================================================================

bitflags! {
    /// Transport control and status bits as reported by `get_control`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ControlFlags: u32 {
        /// DTR asserted.
        const DATA_TERMINAL_READY = 0x0001;
        /// RTS asserted.
        const REQUEST_TO_SEND = 0x0002;
        /// CTS asserted.
        const CLEAR_TO_SEND = 0x0010;
        /// DSR asserted.
        const DATA_SET_READY = 0x0020;
        /// Ring indicator asserted.
        const RING_INDICATE = 0x0040;
        /// Carrier detect asserted.
        const CARRIER_DETECT = 0x0080;
        /// No received data is buffered.
        const INPUT_BUFFER_EMPTY = 0x0100;
        /// Transmit buffer drained.
        const OUTPUT_BUFFER_EMPTY = 0x0200;
        /// Hardware loopback enabled.
        const HARDWARE_LOOPBACK_ENABLE = 0x1000;
        /// Software loopback enabled.
        const SOFTWARE_LOOPBACK_ENABLE = 0x2000;
        /// Hardware flow control enabled.
        const HARDWARE_FLOW_CONTROL_ENABLE = 0x4000;
    }
}

impl ControlFlags {
    /// Returns true if at least one received byte is waiting.
    #[inline]
    #[must_use]
    pub const fn has_input(self) -> bool {
        !self.contains(Self::INPUT_BUFFER_EMPTY)
    }
}
