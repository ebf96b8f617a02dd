// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Configuration resolver.
//!
//! Turns the stored `DEBUGPORT` descriptor into a fully populated
//! [`TransportConfig`]. Anything short of a well-formed path containing a
//! UART node yields the defaults and no descriptor, which makes the binding
//! selector accept the first suitable transport.

use alloc::vec::Vec;
use core::fmt;

use debugport_abi::{DEBUGPORT_GUID, DEBUGPORT_VARIABLE_NAME, DevicePath, TransportConfig};
use tracing::{debug, warn};

use crate::store::{FetchError, VariableStore, fetch_variable};


/// A stored path known to contain a UART node.
#[derive(Clone, PartialEq, Eq)]
pub struct Descriptor {
    bytes: Vec<u8>,
}

impl Descriptor {
    /// The stored path.
    #[must_use]
    pub fn path(&self) -> DevicePath<'_> {
        DevicePath::new(&self.bytes)
    }

    /// The raw stored bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Descriptor").field(&self.path()).finish()
    }
}

/// Outcome of resolving the stored descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    config: TransportConfig,
    descriptor: Option<Descriptor>,
}

impl Resolution {
    /// Defaults with no stored descriptor.
    #[must_use]
    pub const fn defaults() -> Self {
        Self {
            config: TransportConfig::DEFAULT,
            descriptor: None,
        }
    }

    /// Fetches the stored descriptor and resolves it.
    ///
    /// A missing variable or a store failure resolves to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::ResourceExhaustion` if the descriptor buffer
    /// cannot be allocated.
    pub fn load<S: VariableStore + ?Sized>(store: &S) -> Result<Self, FetchError> {
        match fetch_variable(store, DEBUGPORT_VARIABLE_NAME, &DEBUGPORT_GUID) {
            Ok(raw) => Ok(resolve(raw)),
            Err(FetchError::ResourceExhaustion) => Err(FetchError::ResourceExhaustion),
            Err(FetchError::Store(err)) => {
                warn!(%err, "debug port variable unreadable, using defaults");
                Ok(Self::defaults())
            }
        }
    }

    /// The configuration to request from the transport.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// The stored descriptor, if one designates a specific transport.
    #[inline]
    #[must_use]
    pub const fn descriptor(&self) -> Option<&Descriptor> {
        self.descriptor.as_ref()
    }

    /// Returns true if a stored descriptor designates a specific transport.
    #[inline]
    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        self.descriptor.is_some()
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Resolves raw descriptor bytes into a configuration.
///
/// Walks the path to its first UART node and takes baud rate, parity, data
/// bits and stop bits from it; FIFO depth and timeout are always defaults.
/// With no bytes, a malformed path, or no UART node before the end, returns
/// [`Resolution::defaults`] and drops the bytes.
#[must_use]
pub fn resolve(raw: Option<Vec<u8>>) -> Resolution {
    let Some(bytes) = raw else {
        debug!("no debug port descriptor stored, using defaults");
        return Resolution::defaults();
    };

    match DevicePath::new(&bytes).find_uart() {
        Ok(Some(uart)) => {
            let config = uart.config();
            debug!(%config, "debug port descriptor resolved");
            Resolution {
                config,
                descriptor: Some(Descriptor { bytes }),
            }
        }
        Ok(None) => {
            debug!("debug port descriptor has no UART node, using defaults");
            Resolution::defaults()
        }
        Err(err) => {
            warn!(%err, "malformed debug port descriptor, using defaults");
            Resolution::defaults()
        }
    }
}
