// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared test infrastructure for integration tests.
//!
//! This module provides:
//! - [`Loopback`] - A transport whose writes become its own input
//! - [`TableHost`] - A host with a fixed transport table
//! - [`MemoryStore`] - A variable store holding at most one descriptor
//! - Path builders for a two-UART machine
//!
//! # Design
//!
//! This module is **not** a test file, so it must comply with full clippy rules.
//! Test-specific allowances (like `unwrap_used`) are only permitted in `*_test.rs` files.

#![allow(dead_code, reason = "not every test file uses every helper")]

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;

use debugport::{
    HostError, IrqSafe, SerialTransport, StoreError, Transfer, TransportError, VariableStore,
    host::{Host, locate_longest_prefix},
};
use debugport_abi::path::END_ENTIRE_NODE;
use debugport_abi::{
    ControlFlags, DEBUGPORT_GUID, DEBUGPORT_VARIABLE_NAME, DevicePath, Guid, TransportConfig,
    UartNode,
};

// =============================================================================
// Paths
// =============================================================================

/// ACPI root node for PNP0A03.
pub const ROOT: [u8; 12] = [
    0x02, 0x01, 0x0C, 0x00, 0xD0, 0x41, 0x03, 0x0A, 0x00, 0x00, 0x00, 0x00,
];

/// PCI node for device 0x1F function 0.
pub const PCI_1F: [u8; 6] = [0x01, 0x01, 0x06, 0x00, 0x00, 0x1F];

/// PCI node for device 0x02 function 0.
pub const PCI_02: [u8; 6] = [0x01, 0x01, 0x06, 0x00, 0x00, 0x02];

/// Concatenates path pieces.
pub fn path(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Enumerated path of a UART behind `pci`.
pub fn uart_path(pci: &[u8], line: &TransportConfig) -> Vec<u8> {
    path(&[&ROOT, pci, &UartNode::from_config(line).encode(), &END_ENTIRE_NODE])
}

// =============================================================================
// Loopback transport
// =============================================================================

/// Transport whose writes are queued as its own input.
pub struct Loopback {
    queue: RefCell<VecDeque<u8>>,
    /// Fastest baud rate the line accepts.
    max_baud: u64,
    applied: Cell<Option<TransportConfig>>,
    writes: Cell<usize>,
}

impl Loopback {
    /// Loopback accepting any baud rate up to `max_baud`.
    pub fn new(max_baud: u64) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            max_baud,
            applied: Cell::new(None),
            writes: Cell::new(0),
        }
    }

    /// Queues bytes as if the remote end sent them.
    pub fn inject(&self, data: &[u8]) {
        self.queue.borrow_mut().extend(data);
    }

    /// The configuration last accepted by `set_attributes`.
    pub fn applied(&self) -> Option<TransportConfig> {
        self.applied.get()
    }

    /// Number of single-shot writes so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Bytes queued and not yet read.
    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl SerialTransport for Loopback {
    fn reset(&self) -> Result<(), TransportError> {
        self.queue.borrow_mut().clear();
        Ok(())
    }

    fn set_attributes(&self, config: &TransportConfig) -> Result<(), TransportError> {
        if config.baud_rate > self.max_baud {
            return Err(TransportError::InvalidParameter);
        }
        self.applied.set(Some(*config));
        Ok(())
    }

    fn read(&self, buf: &mut [u8]) -> Transfer<TransportError> {
        let mut queue = self.queue.borrow_mut();
        let count = buf.len().min(queue.len());
        for (slot, byte) in buf.iter_mut().zip(queue.drain(..count)) {
            *slot = byte;
        }
        if count == 0 {
            Transfer::partial(0, TransportError::Timeout)
        } else {
            Transfer::complete(count)
        }
    }

    fn write(&self, data: &[u8]) -> Transfer<TransportError> {
        self.writes.set(self.writes.get() + 1);
        self.queue.borrow_mut().extend(data);
        Transfer::complete(data.len())
    }

    fn get_control(&self) -> Result<ControlFlags, TransportError> {
        if self.queue.borrow().is_empty() {
            Ok(ControlFlags::INPUT_BUFFER_EMPTY | ControlFlags::OUTPUT_BUFFER_EMPTY)
        } else {
            Ok(ControlFlags::OUTPUT_BUFFER_EMPTY)
        }
    }
}

// SAFETY: test double driven from a single thread; never installed as a
// real interrupt-context transport.
unsafe impl IrqSafe for Loopback {}

// =============================================================================
// Host
// =============================================================================

/// Host with a fixed table of transports.
#[derive(Default)]
pub struct TableHost {
    transports: Vec<(u32, Vec<u8>)>,
    published: RefCell<Option<Vec<u8>>>,
    opened: RefCell<Vec<u32>>,
}

impl TableHost {
    /// Host enumerating `transports`.
    pub fn new(transports: Vec<(u32, Vec<u8>)>) -> Self {
        Self {
            transports,
            ..Self::default()
        }
    }

    /// Handles in enumeration order.
    pub fn handles(&self) -> Vec<u32> {
        self.transports.iter().map(|(handle, _)| *handle).collect()
    }

    /// The published path, if any.
    pub fn published(&self) -> Option<Vec<u8>> {
        self.published.borrow().clone()
    }

    /// Handles currently opened.
    pub fn opened(&self) -> Vec<u32> {
        self.opened.borrow().clone()
    }
}

impl Host for TableHost {
    type Handle = u32;

    fn debug_port_published(&self) -> bool {
        self.published.borrow().is_some()
    }

    fn locate_transport<'p>(&self, path: DevicePath<'p>) -> Option<(u32, DevicePath<'p>)> {
        locate_longest_prefix(
            self.transports
                .iter()
                .map(|(handle, bytes)| (*handle, bytes.as_slice())),
            path,
        )
    }

    fn device_path(&self, handle: u32) -> Option<&[u8]> {
        self.transports
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, bytes)| bytes.as_slice())
    }

    fn open_exclusive(&self, handle: u32) -> Result<(), HostError> {
        let mut opened = self.opened.borrow_mut();
        if opened.contains(&handle) {
            return Err(HostError::AccessDenied);
        }
        opened.push(handle);
        Ok(())
    }

    fn close(&self, handle: u32) {
        self.opened.borrow_mut().retain(|h| *h != handle);
    }

    fn publish(&self, path: DevicePath<'_>) -> Result<(), HostError> {
        *self.published.borrow_mut() = Some(path.as_bytes().to_vec());
        Ok(())
    }

    fn unpublish(&self) -> Result<(), HostError> {
        *self.published.borrow_mut() = None;
        Ok(())
    }
}

// =============================================================================
// Variable store
// =============================================================================

/// Store holding at most the debug port descriptor.
#[derive(Default)]
pub struct MemoryStore {
    descriptor: Option<Vec<u8>>,
}

impl MemoryStore {
    /// Store holding `descriptor`.
    pub const fn holding(descriptor: Vec<u8>) -> Self {
        Self {
            descriptor: Some(descriptor),
        }
    }
}

impl VariableStore for MemoryStore {
    fn get(&self, name: &str, namespace: &Guid, buf: &mut [u8]) -> Result<usize, StoreError> {
        if name != DEBUGPORT_VARIABLE_NAME || *namespace != DEBUGPORT_GUID {
            return Err(StoreError::NotFound);
        }
        let value = self.descriptor.as_ref().ok_or(StoreError::NotFound)?;
        let Some(target) = buf.get_mut(..value.len()) else {
            return Err(StoreError::BufferTooSmall {
                required: value.len(),
            });
        };
        target.copy_from_slice(value);
        Ok(value.len())
    }
}
