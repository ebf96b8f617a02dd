// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Debug port
//!
//! Interrupt-safe debug port adapter layered on a character-stream
//! transport.
//!
//! This crate provides:
//! - The transport boundary and the [`IrqSafe`] capability marker
//! - Resolution of the stored path descriptor into line settings
//! - Selection of the one transport that becomes the debug port
//! - [`DebugPort`], the adapter exposing reset, read, write and poll
//! - [`DebugPortDriver`], the supported/start/stop lifecycle
//!
//! Once bound, the adapter's operations may be called from interrupt
//! context and re-entrantly: they never allocate, lock or log. Everything
//! that does (fetching the descriptor, binding, publishing) happens in
//! ordinary context before that.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

pub mod adapter;
pub mod driver;
pub mod host;
pub mod resolve;
pub mod select;
pub mod settings;
pub mod store;
pub mod transport;

// Re-export commonly used types at crate root
pub use adapter::{AdapterState, BindError, DebugPort, DebugTransport, PollStatus, PortError};
pub use driver::{DebugPortDriver, DriverError};
pub use host::{Host, HostError};
pub use resolve::{Resolution, resolve};
pub use select::{Mismatch, Rejection};
pub use settings::AdapterSettings;
pub use store::{FetchError, StoreError, VariableStore};
pub use transport::{IrqSafe, SerialTransport, Transfer, TransportError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
