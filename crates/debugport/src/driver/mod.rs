// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Driver lifecycle glue.
//!
//! [`DebugPortDriver`] ties the pieces together for a host driver framework:
//! `supported` decides whether a candidate transport should become the debug
//! port, `start` binds it and publishes the interface, `stop` withdraws it.
//! All three run in ordinary context; only the published [`DebugPort`] is
//! reachable from interrupt context.

use alloc::vec::Vec;
use core::fmt;

use debugport_abi::path::{DEBUGPORT_NODE, END_ENTIRE_NODE};
use debugport_abi::{DevicePath, TransportConfig};
use tracing::{debug, info, warn};

use crate::adapter::{BindError, DebugPort};
use crate::host::{Host, HostError};
use crate::resolve::Resolution;
use crate::select::{self, Rejection};
use crate::settings::AdapterSettings;
use crate::store::{FetchError, VariableStore};
use crate::transport::IrqSafe;

#[cfg(test)]
mod driver_test;

/// Driver lifecycle failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverError {
    /// The candidate is not the transport to bind.
    Rejected(Rejection),
    /// The adapter could not bind the transport.
    Bind(BindError),
    /// A buffer could not be allocated.
    ResourceExhaustion,
    /// The host refused an operation.
    Host(HostError),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(rejection) => write!(f, "transport rejected: {rejection}"),
            Self::Bind(err) => write!(f, "bind failed: {err}"),
            Self::ResourceExhaustion => write!(f, "out of memory"),
            Self::Host(err) => write!(f, "host error: {err}"),
        }
    }
}

impl From<Rejection> for DriverError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<BindError> for DriverError {
    fn from(err: BindError) -> Self {
        Self::Bind(err)
    }
}

impl From<HostError> for DriverError {
    fn from(err: HostError) -> Self {
        Self::Host(err)
    }
}

impl From<FetchError> for DriverError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::ResourceExhaustion => Self::ResourceExhaustion,
            FetchError::Store(_) => Self::Host(HostError::DeviceError),
        }
    }
}

/// The transport currently serving as the debug port.
struct Active<H> {
    handle: H,
    path: Vec<u8>,
}

/// Debug port driver over a host, a variable store and a transport type.
pub struct DebugPortDriver<H: Host, S, T> {
    host: H,
    store: S,
    resolution: Option<Resolution>,
    port: DebugPort<T>,
    active: Option<Active<H::Handle>>,
}

impl<H: Host, S: VariableStore, T: IrqSafe> DebugPortDriver<H, S, T> {
    /// Creates a stopped driver.
    #[must_use]
    pub const fn new(host: H, store: S, settings: AdapterSettings) -> Self {
        Self {
            host,
            store,
            resolution: None,
            port: DebugPort::new(settings),
            active: None,
        }
    }

    /// Checks whether `candidate` should become the debug port.
    ///
    /// Rejects if a debug port is already active anywhere, if the stored
    /// descriptor designates something else, or if the transport cannot be
    /// opened exclusively. The trial open is released before returning.
    ///
    /// The descriptor is fetched afresh on every call and kept for the
    /// `start` that follows.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Rejected` with the reason, or
    /// `DriverError::ResourceExhaustion` if the descriptor cannot be fetched.
    pub fn supported(&mut self, candidate: H::Handle) -> Result<(), DriverError> {
        self.resolution = None;
        select::ensure_exclusive(&self.host)?;
        let resolution = self.resolution.insert(Resolution::load(&self.store)?);
        select::accept(&self.host, candidate, resolution)?;

        self.host
            .open_exclusive(candidate)
            .map_err(Rejection::Unavailable)?;
        self.host.close(candidate);
        Ok(())
    }

    /// Binds `transport` as the debug port and publishes the interface.
    ///
    /// Returns the line configuration in effect. Consumes the resolution
    /// left by `supported`, or fetches one if there is none. On any failure
    /// everything done so far is undone and the driver stays stopped.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Bind(BindError::AlreadyBound)` if already
    /// started, `DriverError::Rejected` if the transport cannot be opened,
    /// or the bind, allocation or publish failure.
    pub fn start(&mut self, candidate: H::Handle, transport: T) -> Result<TransportConfig, DriverError> {
        if self.active.is_some() {
            return Err(BindError::AlreadyBound.into());
        }
        let resolution = match self.resolution.take() {
            Some(resolution) => resolution,
            None => Resolution::load(&self.store)?,
        };
        let config = *resolution.config();

        self.host
            .open_exclusive(candidate)
            .map_err(Rejection::Unavailable)?;

        let effective = match self.port.bind(transport, config) {
            Ok(effective) => effective,
            Err(err) => {
                self.host.close(candidate);
                return Err(err.into());
            }
        };

        let published = published_path(self.host.device_path(candidate))
            .and_then(|path| {
                self.host.publish(DevicePath::new(&path))?;
                Ok(path)
            });
        let path = match published {
            Ok(path) => path,
            Err(err) => {
                warn!(?candidate, %err, "debug port not published, releasing transport");
                let _ = self.port.unbind();
                self.host.close(candidate);
                return Err(err);
            }
        };

        info!(?candidate, config = %effective, "debug port started");
        self.active = Some(Active {
            handle: candidate,
            path,
        });
        Ok(effective)
    }

    /// Withdraws the interface, unbinds the transport and releases it.
    ///
    /// Returns the transport, or `None` if the driver was not started.
    /// If the host refuses to withdraw the interface, the driver stays
    /// started and the call may be retried.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Host` if the interface cannot be withdrawn.
    pub fn stop(&mut self) -> Result<Option<T>, DriverError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        if let Err(err) = self.host.unpublish() {
            warn!(%err, "debug port interface could not be withdrawn");
            self.active = Some(active);
            return Err(err.into());
        }

        let transport = self.port.unbind();
        self.host.close(active.handle);
        info!(handle = ?active.handle, "debug port stopped");
        Ok(transport)
    }

    /// The published interface.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> &DebugPort<T> {
        &self.port
    }

    /// The host environment.
    #[inline]
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The handle serving as debug port, if started.
    #[must_use]
    pub fn active_handle(&self) -> Option<H::Handle> {
        self.active.as_ref().map(|active| active.handle)
    }

    /// The path the interface is published under, if started.
    #[must_use]
    pub fn published_path(&self) -> Option<DevicePath<'_>> {
        self.active.as_ref().map(|active| DevicePath::new(&active.path))
    }

    /// The resolution fetched by the last `supported`, until `start`
    /// consumes it.
    #[inline]
    #[must_use]
    pub const fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }
}

impl<H: Host, S, T> fmt::Debug for DebugPortDriver<H, S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugPortDriver")
            .field("active", &self.active.as_ref().map(|active| active.handle))
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

/// Builds `controller` + debug port vendor node + end node.
///
/// Without a usable controller path the result is the vendor node alone.
fn published_path(controller: Option<&[u8]>) -> Result<Vec<u8>, DriverError> {
    let prefix: &[u8] = match controller.map(|bytes| DevicePath::new(bytes).instance_bytes()) {
        Some(Ok(prefix)) => prefix,
        Some(Err(err)) => {
            debug!(%err, "transport path malformed, publishing bare node");
            &[]
        }
        None => &[],
    };

    let len = prefix.len() + DEBUGPORT_NODE.len() + END_ENTIRE_NODE.len();
    let mut path = Vec::new();
    path.try_reserve_exact(len)
        .map_err(|_| DriverError::ResourceExhaustion)?;
    path.extend_from_slice(prefix);
    path.extend_from_slice(&DEBUGPORT_NODE);
    path.extend_from_slice(&END_ENTIRE_NODE);
    Ok(path)
}
