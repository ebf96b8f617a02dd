// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Binding selector.
//!
//! Decides whether a candidate transport is the one the debug port should
//! bind to. Only one debug port may be active system-wide. Without a stored
//! descriptor the first candidate wins; with one, the stored path must
//! designate the candidate exactly:
//!
//! 1. the path resolves to the candidate's handle,
//! 2. the node after the candidate's own path is a vendor messaging node of
//!    exactly 20 bytes,
//! 3. that node carries the debug port GUID.
//!
//! Any failed check rejects the candidate. Nothing here opens the transport.

use core::fmt;

use debugport_abi::path::{SUBTYPE_VENDOR, TYPE_MESSAGING, VENDOR_NODE_LEN};
use debugport_abi::{DEBUGPORT_GUID, DevicePath, Guid};
use tracing::debug;

use crate::host::{Host, HostError};
use crate::resolve::Resolution;


/// Which structural check a stored descriptor failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// The stored path resolves to no transport.
    NotLocated,
    /// The stored path resolves to a different transport.
    WrongDevice,
    /// The node after the transport is not a 20-byte vendor messaging node.
    UnexpectedNode,
    /// The vendor node carries a different GUID.
    WrongGuid,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLocated => write!(f, "stored path resolves to no transport"),
            Self::WrongDevice => write!(f, "stored path designates another transport"),
            Self::UnexpectedNode => write!(f, "stored path lacks a debug port vendor node"),
            Self::WrongGuid => write!(f, "vendor node is not a debug port node"),
        }
    }
}

/// Why a candidate transport was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// A debug port interface is already active.
    AlreadyPublished,
    /// The stored descriptor designates something else.
    ConfigurationMismatch(Mismatch),
    /// The transport cannot be opened exclusively.
    Unavailable(HostError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPublished => write!(f, "a debug port is already active"),
            Self::ConfigurationMismatch(mismatch) => write!(f, "{mismatch}"),
            Self::Unavailable(err) => write!(f, "transport unavailable: {err}"),
        }
    }
}

impl From<Mismatch> for Rejection {
    fn from(mismatch: Mismatch) -> Self {
        Self::ConfigurationMismatch(mismatch)
    }
}

/// Fails if a debug port interface is already active.
///
/// # Errors
///
/// Returns `Rejection::AlreadyPublished`.
pub fn ensure_exclusive<H: Host + ?Sized>(host: &H) -> Result<(), Rejection> {
    if host.debug_port_published() {
        debug!("debug port already published, rejecting");
        return Err(Rejection::AlreadyPublished);
    }
    Ok(())
}

/// Decides whether `candidate` is the transport to bind.
///
/// # Errors
///
/// Returns `Rejection::AlreadyPublished` if a debug port is active, or
/// `Rejection::ConfigurationMismatch` if the stored descriptor designates
/// something else.
pub fn accept<H: Host + ?Sized>(
    host: &H,
    candidate: H::Handle,
    resolution: &Resolution,
) -> Result<(), Rejection> {
    ensure_exclusive(host)?;

    let Some(descriptor) = resolution.descriptor() else {
        return Ok(());
    };

    match_descriptor(host, candidate, descriptor.path()).map_err(|mismatch| {
        debug!(?candidate, %mismatch, "debug port descriptor does not match");
        Rejection::ConfigurationMismatch(mismatch)
    })
}

/// Runs the three structural checks of `stored` against `candidate`.
///
/// # Errors
///
/// Returns the first check that failed.
pub fn match_descriptor<H: Host + ?Sized>(
    host: &H,
    candidate: H::Handle,
    stored: DevicePath<'_>,
) -> Result<(), Mismatch> {
    let (handle, rest) = host
        .locate_transport(stored)
        .ok_or(Mismatch::NotLocated)?;
    if handle != candidate {
        return Err(Mismatch::WrongDevice);
    }

    let Some(Ok(node)) = rest.nodes().next() else {
        return Err(Mismatch::UnexpectedNode);
    };
    let header = node.header();
    if header.node_type != TYPE_MESSAGING
        || header.sub_type != SUBTYPE_VENDOR
        || usize::from(header.length) != VENDOR_NODE_LEN
    {
        return Err(Mismatch::UnexpectedNode);
    }

    if Guid::read_from(node.payload()) != Some(DEBUGPORT_GUID) {
        return Err(Mismatch::WrongGuid);
    }
    Ok(())
}
