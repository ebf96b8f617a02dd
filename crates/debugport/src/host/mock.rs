// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mock host environment for testing.
//!
//! Holds a fixed list of transports with their enumerated paths and tracks
//! exclusive opens and the published debug port path.

use core::cell::{Cell, RefCell};
use std::vec::Vec;

use debugport_abi::DevicePath;

use super::{Host, HostError, locate_longest_prefix};

/// Mock host backed by in-memory state.
#[derive(Default)]
pub struct MockHost {
    /// Enumerated transports: handle and path.
    transports: Vec<(u32, Vec<u8>)>,
    /// Handles currently opened exclusively by someone else.
    foreign_owners: Vec<u32>,
    /// A debug port published by another driver.
    foreign_debug_port: Cell<bool>,
    /// Path of the debug port we published.
    published: RefCell<Option<Vec<u8>>>,
    /// Handles currently opened by us.
    opened: RefCell<Vec<u32>>,
    publish_fault: Cell<Option<HostError>>,
    unpublish_fault: Cell<Option<HostError>>,
    open_calls: Cell<usize>,
}

impl MockHost {
    /// Create a host with no transports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transport with the given enumerated path.
    #[must_use]
    pub fn with_transport(mut self, handle: u32, path: &[u8]) -> Self {
        self.transports.push((handle, path.to_vec()));
        self
    }

    /// Mark a transport as exclusively owned by another driver.
    #[must_use]
    pub fn with_foreign_owner(mut self, handle: u32) -> Self {
        self.foreign_owners.push(handle);
        self
    }

    /// Pretend another driver already published a debug port.
    pub fn set_foreign_debug_port(&self, present: bool) {
        self.foreign_debug_port.set(present);
    }

    /// Make the next `publish` fail.
    pub fn fail_publish(&self, error: HostError) {
        self.publish_fault.set(Some(error));
    }

    /// Make the next `unpublish` fail.
    pub fn fail_unpublish(&self, error: HostError) {
        self.unpublish_fault.set(Some(error));
    }

    /// Path published by the debug port, if any.
    #[must_use]
    pub fn published(&self) -> Option<Vec<u8>> {
        self.published.borrow().clone()
    }

    /// Handles currently opened exclusively through this host.
    #[must_use]
    pub fn opened(&self) -> Vec<u32> {
        self.opened.borrow().clone()
    }

    /// Number of `open_exclusive` calls so far.
    #[must_use]
    pub fn open_calls(&self) -> usize {
        self.open_calls.get()
    }
}

impl Host for MockHost {
    type Handle = u32;

    fn debug_port_published(&self) -> bool {
        self.foreign_debug_port.get() || self.published.borrow().is_some()
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
        self.open_calls.set(self.open_calls.get() + 1);
        if !self.transports.iter().any(|(h, _)| *h == handle) {
            return Err(HostError::Unsupported);
        }
        if self.foreign_owners.contains(&handle) || self.opened.borrow().contains(&handle) {
            return Err(HostError::AccessDenied);
        }
        self.opened.borrow_mut().push(handle);
        Ok(())
    }

    fn close(&self, handle: u32) {
        self.opened.borrow_mut().retain(|h| *h != handle);
    }

    fn publish(&self, path: DevicePath<'_>) -> Result<(), HostError> {
        if let Some(error) = self.publish_fault.take() {
            return Err(error);
        }
        *self.published.borrow_mut() = Some(path.as_bytes().to_vec());
        Ok(())
    }

    fn unpublish(&self) -> Result<(), HostError> {
        if let Some(error) = self.unpublish_fault.take() {
            return Err(error);
        }
        *self.published.borrow_mut() = None;
        Ok(())
    }
}
