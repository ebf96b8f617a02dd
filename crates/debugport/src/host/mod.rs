// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Host environment boundary.
//!
//! Device enumeration, exclusive opening of a transport, and publishing the
//! debug port interface all belong to the host's driver framework. The
//! adapter only needs the narrow view below.

use core::fmt;

use debugport_abi::DevicePath;


#[cfg(any(test, feature = "std"))]
mod mock;

#[cfg(any(test, feature = "std"))]
pub use mock::MockHost;

/// Status reported by the host environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostError {
    /// The transport is already opened by another owner.
    AccessDenied,
    /// The handle does not offer the stream capability.
    Unsupported,
    /// The host ran out of resources.
    OutOfResources,
    /// The host reported a device failure.
    DeviceError,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied => write!(f, "transport already opened exclusively"),
            Self::Unsupported => write!(f, "handle has no stream capability"),
            Self::OutOfResources => write!(f, "host out of resources"),
            Self::DeviceError => write!(f, "host device error"),
        }
    }
}

/// The host environment as seen by the debug port driver.
pub trait Host {
    /// Identity of a transport instance.
    type Handle: Copy + Eq + fmt::Debug;

    /// Returns true if a debug port interface is already active anywhere.
    fn debug_port_published(&self) -> bool;

    /// Resolves `path` to the transport whose own path is its longest prefix.
    ///
    /// Returns the transport and the part of `path` that follows its path.
    fn locate_transport<'p>(&self, path: DevicePath<'p>)
    -> Option<(Self::Handle, DevicePath<'p>)>;

    /// The enumerated path of a transport, if it has one.
    fn device_path(&self, handle: Self::Handle) -> Option<&[u8]>;

    /// Opens the transport's stream capability exclusively.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability is absent or already owned.
    fn open_exclusive(&self, handle: Self::Handle) -> Result<(), HostError>;

    /// Releases a capability obtained with `open_exclusive`.
    fn close(&self, handle: Self::Handle);

    /// Publishes the debug port interface under `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the interface cannot be installed.
    fn publish(&self, path: DevicePath<'_>) -> Result<(), HostError>;

    /// Withdraws the published debug port interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the interface cannot be removed.
    fn unpublish(&self) -> Result<(), HostError>;
}

/// Longest-prefix lookup over enumerated `(handle, path)` pairs.
///
/// A building block for [`Host::locate_transport`] on hosts that can list
/// their transports. Malformed candidate paths never match.
pub fn locate_longest_prefix<'p, H, I, B>(
    candidates: I,
    path: DevicePath<'p>,
) -> Option<(H, DevicePath<'p>)>
where
    I: IntoIterator<Item = (H, B)>,
    B: AsRef<[u8]>,
{
    let mut best: Option<(H, DevicePath<'p>)> = None;
    for (handle, candidate) in candidates {
        let Some(rest) = path.strip_prefix(DevicePath::new(candidate.as_ref())) else {
            continue;
        };
        let better = best
            .as_ref()
            .is_none_or(|(_, current)| rest.as_bytes().len() < current.as_bytes().len());
        if better {
            best = Some((handle, rest));
        }
    }
    best
}
