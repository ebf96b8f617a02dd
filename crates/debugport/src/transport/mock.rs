// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mock transport for testing.
//!
//! This provides a transport backed by in-memory buffers and scripted
//! responses, allowing tests to drive the adapter through timeouts, short
//! transfers and device errors without hardware.

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use debugport_abi::{ControlFlags, TransportConfig};

use super::{IrqSafe, SerialTransport, Transfer, TransportError};

/// One scripted response to a `read` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadStep {
    /// Deliver these bytes (truncated to the caller's buffer) and succeed.
    Data(Vec<u8>),
    /// Deliver these bytes, then report a timeout.
    Timeout(Vec<u8>),
    /// Deliver nothing and report this error.
    Fail(TransportError),
}

/// Mock transport backed by in-memory buffers.
///
/// Reads consume scripted [`ReadStep`]s first, then the pending input
/// buffer. With neither available a read times out without data. The
/// control query reports `INPUT_BUFFER_EMPTY` whenever nothing is pending,
/// unless a scripted control response is queued.
#[derive(Default)]
pub struct MockTransport {
    /// Scripted read responses, consumed first.
    read_script: RefCell<VecDeque<ReadStep>>,
    /// Pending input bytes.
    input: RefCell<VecDeque<u8>>,
    /// Scripted control responses, consumed first.
    control_script: RefCell<VecDeque<Result<ControlFlags, TransportError>>>,
    /// Scripted attribute responses, consumed first (default: accept).
    attribute_script: RefCell<VecDeque<Result<(), TransportError>>>,
    /// Write call index at which to fail, and the error to report.
    write_fault: Cell<Option<(usize, TransportError)>>,
    /// Cap on bytes accepted per write call.
    write_limit: Cell<Option<usize>>,
    /// Bytes that have been written.
    output: RefCell<Vec<u8>>,
    /// Length of each write call.
    write_sizes: RefCell<Vec<usize>>,
    /// Every configuration passed to `set_attributes`.
    attributes: RefCell<Vec<TransportConfig>>,
    read_calls: Cell<usize>,
    control_calls: Cell<usize>,
    reset_calls: Cell<usize>,
}

impl MockTransport {
    /// Create an idle mock transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport with pre-loaded input data.
    #[must_use]
    pub fn with_input(input: &[u8]) -> Self {
        let mock = Self::new();
        mock.push_input(input);
        mock
    }

    /// Add more input data.
    pub fn push_input(&self, data: &[u8]) {
        self.input.borrow_mut().extend(data);
    }

    /// Queue a scripted read response.
    pub fn script_read(&self, step: ReadStep) {
        self.read_script.borrow_mut().push_back(step);
    }

    /// Queue a scripted control response.
    pub fn script_control(&self, response: Result<ControlFlags, TransportError>) {
        self.control_script.borrow_mut().push_back(response);
    }

    /// Queue a scripted `set_attributes` response.
    pub fn script_attributes(&self, response: Result<(), TransportError>) {
        self.attribute_script.borrow_mut().push_back(response);
    }

    /// Fail the write call with zero-based index `call` with `error`.
    pub fn fail_write(&self, call: usize, error: TransportError) {
        self.write_fault.set(Some((call, error)));
    }

    /// Accept at most `limit` bytes per write call.
    pub fn limit_writes(&self, limit: usize) {
        self.write_limit.set(Some(limit));
    }

    /// Get the output that has been written.
    #[must_use]
    pub fn output(&self) -> Vec<u8> {
        self.output.borrow().clone()
    }

    /// Length of each write call, in order.
    #[must_use]
    pub fn write_sizes(&self) -> Vec<usize> {
        self.write_sizes.borrow().clone()
    }

    /// Every configuration passed to `set_attributes`, in order.
    #[must_use]
    pub fn attributes(&self) -> Vec<TransportConfig> {
        self.attributes.borrow().clone()
    }

    /// Number of input bytes not yet read.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.borrow().len()
    }

    /// Number of `read` calls so far.
    #[must_use]
    pub fn read_calls(&self) -> usize {
        self.read_calls.get()
    }

    /// Number of `get_control` calls so far.
    #[must_use]
    pub fn control_calls(&self) -> usize {
        self.control_calls.get()
    }

    /// Number of `reset` calls so far.
    #[must_use]
    pub fn reset_calls(&self) -> usize {
        self.reset_calls.get()
    }

    fn has_pending(&self) -> bool {
        !self.read_script.borrow().is_empty() || !self.input.borrow().is_empty()
    }
}

/// Copies as much of `data` as fits into `buf`.
fn deliver(buf: &mut [u8], data: &[u8]) -> usize {
    let count = data.len().min(buf.len());
    buf[..count].copy_from_slice(&data[..count]);
    count
}

impl SerialTransport for MockTransport {
    fn reset(&self) -> Result<(), TransportError> {
        self.reset_calls.set(self.reset_calls.get() + 1);
        Ok(())
    }

    fn set_attributes(&self, config: &TransportConfig) -> Result<(), TransportError> {
        self.attributes.borrow_mut().push(*config);
        self.attribute_script.borrow_mut().pop_front().unwrap_or(Ok(()))
    }

    fn read(&self, buf: &mut [u8]) -> Transfer<TransportError> {
        self.read_calls.set(self.read_calls.get() + 1);

        let step = self.read_script.borrow_mut().pop_front();
        match step {
            Some(ReadStep::Data(data)) => Transfer::complete(deliver(buf, &data)),
            Some(ReadStep::Timeout(data)) => {
                Transfer::partial(deliver(buf, &data), TransportError::Timeout)
            }
            Some(ReadStep::Fail(error)) => Transfer::partial(0, error),
            None => {
                let mut input = self.input.borrow_mut();
                if input.is_empty() {
                    return Transfer::partial(0, TransportError::Timeout);
                }
                let mut count = 0;
                for slot in buf.iter_mut() {
                    let Some(byte) = input.pop_front() else {
                        break;
                    };
                    *slot = byte;
                    count += 1;
                }
                Transfer::complete(count)
            }
        }
    }

    fn write(&self, data: &[u8]) -> Transfer<TransportError> {
        let call = self.write_sizes.borrow().len();
        self.write_sizes.borrow_mut().push(data.len());

        if let Some((at, error)) = self.write_fault.get() {
            if at == call {
                return Transfer::partial(0, error);
            }
        }

        let accepted = self
            .write_limit
            .get()
            .map_or(data.len(), |limit| limit.min(data.len()));
        self.output
            .borrow_mut()
            .extend_from_slice(&data[..accepted]);
        Transfer::complete(accepted)
    }

    fn get_control(&self) -> Result<ControlFlags, TransportError> {
        self.control_calls.set(self.control_calls.get() + 1);

        if let Some(response) = self.control_script.borrow_mut().pop_front() {
            return response;
        }
        if self.has_pending() {
            Ok(ControlFlags::OUTPUT_BUFFER_EMPTY)
        } else {
            Ok(ControlFlags::INPUT_BUFFER_EMPTY | ControlFlags::OUTPUT_BUFFER_EMPTY)
        }
    }
}

// SAFETY: host-only test double. Its bookkeeping allocates, but it is never
// reachable from real interrupt context; what is under test is the adapter's
// call graph, which only touches `read`, `write` and `get_control`.
unsafe impl IrqSafe for MockTransport {}
