// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Adapter tunables.
//!
//! Settings are fixed when the adapter is created and never change while a
//! transport is bound, so live-path operations read them without
//! synchronization.

use core::fmt;
use core::num::{NonZeroU32, NonZeroUsize};

use debugport_abi::serial::DEFAULT_TIMEOUT_US;


/// Default size of each single-shot write.
pub const DEFAULT_WRITE_CHUNK: usize = 8;

/// Tunables for the read and write loops.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AdapterSettings {
    /// Microseconds charged against a read's budget per unproductive attempt.
    read_quantum_us: NonZeroU32,
    /// Maximum bytes per single-shot write.
    write_chunk: NonZeroUsize,
}

impl AdapterSettings {
    /// Quantum equal to the default transport timeout, 8-byte writes.
    #[expect(
        clippy::panic,
        reason = "evaluated at compile time, both defaults are non-zero literals"
    )]
    pub const DEFAULT: Self = match (
        NonZeroU32::new(DEFAULT_TIMEOUT_US),
        NonZeroUsize::new(DEFAULT_WRITE_CHUNK),
    ) {
        (Some(read_quantum_us), Some(write_chunk)) => Self {
            read_quantum_us,
            write_chunk,
        },
        _ => panic!("default adapter settings must be non-zero"),
    };

    /// Creates settings.
    ///
    /// Returns `None` if either value is zero: a zero quantum would let a
    /// read retry forever, a zero chunk would never make progress.
    #[must_use]
    pub const fn new(read_quantum_us: u32, write_chunk: usize) -> Option<Self> {
        match (NonZeroU32::new(read_quantum_us), NonZeroUsize::new(write_chunk)) {
            (Some(read_quantum_us), Some(write_chunk)) => Some(Self {
                read_quantum_us,
                write_chunk,
            }),
            _ => None,
        }
    }

    /// Returns a copy with a different read quantum, or `None` if zero.
    #[must_use]
    pub const fn with_read_quantum(self, read_quantum_us: u32) -> Option<Self> {
        Self::new(read_quantum_us, self.write_chunk.get())
    }

    /// Returns a copy with a different write chunk, or `None` if zero.
    #[must_use]
    pub const fn with_write_chunk(self, write_chunk: usize) -> Option<Self> {
        Self::new(self.read_quantum_us.get(), write_chunk)
    }

    /// Microseconds charged per unproductive read attempt.
    #[inline]
    #[must_use]
    pub const fn read_quantum_us(&self) -> u32 {
        self.read_quantum_us.get()
    }

    /// Maximum bytes per single-shot write.
    #[inline]
    #[must_use]
    pub const fn write_chunk(&self) -> usize {
        self.write_chunk.get()
    }
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for AdapterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterSettings")
            .field("read_quantum_us", &self.read_quantum_us.get())
            .field("write_chunk", &self.write_chunk.get())
            .finish()
    }
}
