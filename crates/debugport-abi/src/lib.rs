// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Wire formats and line parameters shared by the debug port adapter.
//!
//! This crate defines the data contract between the debug port adapter,
//! the persistent configuration store, and the host environment:
//! - GUIDs naming the debug port interface, variable namespace, and path node
//! - The serialized device path format (header-first tagged node parser)
//! - Serial line parameters and their fallback defaults
//! - The transport control-flag bitmask
//!
//! # Design Principles
//!
//! - **Allocation-free**: Every type borrows or is `Copy`, usable from
//!   interrupt context
//! - **Validate before interpret**: Node lengths are checked before any
//!   kind-specific payload is read
//! - **Stable encoding**: Multi-byte fields are little-endian, matching the
//!   firmware path format
//!
//! # Modules
//!
//! - [`guid`]: 128-bit identifiers in mixed-endian wire layout
//! - [`path`]: Path node parser, node encoders, prefix matching
//! - [`serial`]: `TransportConfig`, `Parity`, `StopBits`, `ControlFlags`

#![no_std]

pub mod guid;
pub mod path;
pub mod serial;

// Re-export commonly used types at crate root
pub use guid::{DEBUGPORT_GUID, Guid};
pub use path::{DevicePath, Node, NodeHeader, PathError, RawNode, UartNode, VendorNode};
pub use serial::{ControlFlags, Parity, StopBits, TransportConfig};

/// Name of the stored variable holding the debug port path descriptor.
pub const DEBUGPORT_VARIABLE_NAME: &str = "DEBUGPORT";
