// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the driver lifecycle.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::vec::Vec;

use debugport_abi::path::{DEBUGPORT_NODE, END_ENTIRE_NODE};
use debugport_abi::{DEBUGPORT_GUID, DEBUGPORT_VARIABLE_NAME, Guid, UartNode};

use super::*;
use crate::adapter::{AdapterState, PollStatus};
use crate::host::MockHost;
use crate::store::StoreError;
use crate::transport::{MockTransport, TransportError};

const ROOT: [u8; 12] = [
    0x02, 0x01, 0x0C, 0x00, 0xD0, 0x41, 0x03, 0x0A, 0x00, 0x00, 0x00, 0x00,
];
const PCI_1F: [u8; 6] = [0x01, 0x01, 0x06, 0x00, 0x00, 0x1F];
const PCI_02: [u8; 6] = [0x01, 0x01, 0x06, 0x00, 0x00, 0x02];

fn path(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

fn uart() -> [u8; 19] {
    UartNode::from_config(&TransportConfig::DEFAULT).encode()
}

/// Store holding at most the debug port variable.
struct MemoryStore(RefCell<Result<Vec<u8>, StoreError>>);

impl MemoryStore {
    fn empty() -> Self {
        Self::failing(StoreError::NotFound)
    }

    fn failing(err: StoreError) -> Self {
        Self(RefCell::new(Err(err)))
    }

    fn holding(value: Vec<u8>) -> Self {
        Self(RefCell::new(Ok(value)))
    }

    fn store(&self, value: Vec<u8>) {
        *self.0.borrow_mut() = Ok(value);
    }
}

impl VariableStore for MemoryStore {
    fn get(&self, name: &str, namespace: &Guid, buf: &mut [u8]) -> Result<usize, StoreError> {
        if name != DEBUGPORT_VARIABLE_NAME || *namespace != DEBUGPORT_GUID {
            return Err(StoreError::NotFound);
        }
        let value = self.0.borrow();
        let value = value.as_ref().map_err(|err| *err)?;
        if buf.len() < value.len() {
            return Err(StoreError::BufferTooSmall {
                required: value.len(),
            });
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }
}

fn host() -> MockHost {
    MockHost::new()
        .with_transport(1, &path(&[&ROOT, &PCI_1F, &uart(), &END_ENTIRE_NODE]))
        .with_transport(2, &path(&[&ROOT, &PCI_02, &uart(), &END_ENTIRE_NODE]))
}

type Driver<'t> = DebugPortDriver<MockHost, MemoryStore, &'t MockTransport>;

fn driver<'t>(host: MockHost, store: MemoryStore) -> Driver<'t> {
    DebugPortDriver::new(host, store, AdapterSettings::DEFAULT)
}

#[test]
fn first_transport_wins_without_descriptor() {
    let mock = MockTransport::new();
    let mut driver = driver(host(), MemoryStore::empty());

    assert_eq!(driver.supported(1), Ok(()));
    assert_eq!(driver.host().opened(), Vec::<u32>::new());
    assert_eq!(driver.start(1, &mock), Ok(TransportConfig::DEFAULT));

    assert_eq!(driver.active_handle(), Some(1));
    assert_eq!(driver.host().opened(), [1]);
    assert_eq!(driver.port().state(), AdapterState::Bound);
    assert_eq!(mock.attributes(), [TransportConfig::DEFAULT]);

    let expected = path(&[&ROOT, &PCI_1F, &uart(), &DEBUGPORT_NODE, &END_ENTIRE_NODE]);
    assert_eq!(driver.host().published(), Some(expected.clone()));
    assert_eq!(driver.published_path().unwrap().as_bytes(), expected);

    assert_eq!(
        driver.supported(2),
        Err(DriverError::Rejected(Rejection::AlreadyPublished))
    );
}

#[test]
fn stored_descriptor_selects_transport_and_config() {
    let line = TransportConfig::from_line(9600, 7, 2, 3);
    let stored = path(&[
        &ROOT,
        &PCI_02,
        &UartNode::from_config(&line).encode(),
        &DEBUGPORT_NODE,
        &END_ENTIRE_NODE,
    ]);
    // The enumerated path must match the stored one node for node.
    let host = MockHost::new()
        .with_transport(1, &path(&[&ROOT, &PCI_1F, &uart(), &END_ENTIRE_NODE]))
        .with_transport(
            2,
            &path(&[&ROOT, &PCI_02, &UartNode::from_config(&line).encode(), &END_ENTIRE_NODE]),
        );
    let mock = MockTransport::new();
    let mut driver = driver(host, MemoryStore::holding(stored));

    assert_eq!(
        driver.supported(1),
        Err(DriverError::Rejected(Rejection::ConfigurationMismatch(
            crate::select::Mismatch::WrongDevice
        )))
    );
    assert_eq!(driver.host().open_calls(), 0);
    assert_eq!(driver.supported(2), Ok(()));
    assert!(driver.resolution().unwrap().is_explicit());

    let effective = driver.start(2, &mock).unwrap();
    assert_eq!(effective.baud_rate, 9600);
    assert_eq!(effective.data_bits, 7);
    assert_eq!(effective.receive_fifo_depth, TransportConfig::DEFAULT.receive_fifo_depth);
}

/// A descriptor designating transport 1.
fn descriptor_for_first() -> Vec<u8> {
    path(&[&ROOT, &PCI_1F, &uart(), &DEBUGPORT_NODE, &END_ENTIRE_NODE])
}

#[test]
fn descriptor_is_fetched_on_every_selection() {
    let store = MemoryStore::empty();
    let mut driver = DebugPortDriver::<_, _, &MockTransport>::new(
        host(),
        &store,
        AdapterSettings::DEFAULT,
    );

    assert_eq!(driver.supported(2), Ok(()));
    assert!(!driver.resolution().unwrap().is_explicit());

    store.store(descriptor_for_first());
    assert_eq!(
        driver.supported(2),
        Err(DriverError::Rejected(Rejection::ConfigurationMismatch(
            crate::select::Mismatch::WrongDevice
        )))
    );
    assert_eq!(driver.supported(1), Ok(()));
    assert!(driver.resolution().unwrap().is_explicit());
}

#[test]
fn start_consumes_the_selection() {
    let mock = MockTransport::new();
    let host = host();
    host.fail_publish(HostError::OutOfResources);
    let store = MemoryStore::empty();
    let mut driver = DebugPortDriver::new(host, &store, AdapterSettings::DEFAULT);

    assert_eq!(driver.supported(2), Ok(()));
    assert!(driver.start(2, &mock).is_err());
    assert!(driver.resolution().is_none());

    // A retry without a fresh selection fetches the current descriptor.
    store.store(descriptor_for_first());
    assert_eq!(
        driver.supported(2),
        Err(DriverError::Rejected(Rejection::ConfigurationMismatch(
            crate::select::Mismatch::WrongDevice
        )))
    );
    assert_eq!(driver.supported(1), Ok(()));
    assert!(driver.start(1, &mock).is_ok());
    assert_eq!(driver.active_handle(), Some(1));
    assert!(driver.resolution().is_none());
}

#[test]
fn unreadable_store_falls_back_to_defaults() {
    let mock = MockTransport::new();
    let mut driver = driver(host(), MemoryStore::failing(StoreError::DeviceError));

    assert_eq!(driver.supported(2), Ok(()));
    assert!(!driver.resolution().unwrap().is_explicit());
    assert_eq!(driver.start(2, &mock), Ok(TransportConfig::DEFAULT));
}

#[test]
fn owned_transport_is_unavailable() {
    let mock = MockTransport::new();
    let mut driver = driver(host().with_foreign_owner(1), MemoryStore::empty());

    let unavailable = Err(DriverError::Rejected(Rejection::Unavailable(
        HostError::AccessDenied,
    )));
    assert_eq!(driver.supported(1), unavailable);
    assert_eq!(driver.start(1, &mock).map(|_| ()), unavailable);
    assert!(driver.host().opened().is_empty());
    assert!(mock.attributes().is_empty());
}

#[test]
fn foreign_debug_port_blocks_support() {
    let host = host();
    host.set_foreign_debug_port(true);
    let mut driver: Driver<'_> = driver(host, MemoryStore::empty());

    assert_eq!(
        driver.supported(1),
        Err(DriverError::Rejected(Rejection::AlreadyPublished))
    );
}

#[test]
fn failed_publish_rolls_back() {
    let mock = MockTransport::new();
    let host = host();
    host.fail_publish(HostError::OutOfResources);
    let mut driver = driver(host, MemoryStore::empty());

    assert_eq!(
        driver.start(1, &mock),
        Err(DriverError::Host(HostError::OutOfResources))
    );
    assert_eq!(driver.active_handle(), None);
    assert_eq!(driver.port().state(), AdapterState::Unbound);
    assert!(driver.host().opened().is_empty());
    assert!(driver.host().published().is_none());

    // The fault was one-shot.
    assert_eq!(driver.start(1, &mock), Ok(TransportConfig::DEFAULT));
}

#[test]
fn failed_bind_releases_transport() {
    let mock = MockTransport::new();
    mock.script_attributes(Err(TransportError::InvalidParameter));
    mock.script_attributes(Err(TransportError::Unsupported));
    let mut driver = driver(host(), MemoryStore::empty());

    assert_eq!(
        driver.start(1, &mock),
        Err(DriverError::Bind(BindError::AttributesRejected(
            TransportError::Unsupported
        )))
    );
    assert!(driver.host().opened().is_empty());
    assert!(driver.host().published().is_none());
}

#[test]
fn start_twice_is_refused() {
    let first = MockTransport::new();
    let second = MockTransport::new();
    let mut driver = driver(host(), MemoryStore::empty());

    driver.start(1, &first).unwrap();
    assert_eq!(
        driver.start(2, &second),
        Err(DriverError::Bind(BindError::AlreadyBound))
    );
    assert_eq!(driver.host().opened(), [1]);
}

#[test]
fn stop_releases_everything_once() {
    let mock = MockTransport::new();
    let mut driver = driver(host(), MemoryStore::empty());
    driver.start(1, &mock).unwrap();

    assert!(driver.stop().unwrap().is_some());
    assert!(driver.host().published().is_none());
    assert!(driver.host().opened().is_empty());
    assert_eq!(driver.port().state(), AdapterState::Unbound);
    assert_eq!(driver.active_handle(), None);
    assert!(driver.resolution().is_none());

    assert!(driver.stop().unwrap().is_none());
    assert_eq!(driver.supported(2), Ok(()));
}

#[test]
fn refused_unpublish_keeps_port_running() {
    let mock = MockTransport::new();
    let mut driver = driver(host(), MemoryStore::empty());
    driver.start(1, &mock).unwrap();
    driver.host().fail_unpublish(HostError::DeviceError);

    assert!(matches!(
        driver.stop(),
        Err(DriverError::Host(HostError::DeviceError))
    ));
    assert_eq!(driver.active_handle(), Some(1));
    assert_eq!(driver.port().state(), AdapterState::Bound);

    assert!(driver.stop().unwrap().is_some());
}

#[test]
fn pathless_transport_publishes_bare_node() {
    let mock = MockTransport::new();
    let host = MockHost::new().with_transport(3, &[]);
    let mut driver = driver(host, MemoryStore::empty());

    driver.start(3, &mock).unwrap();
    assert_eq!(
        driver.host().published(),
        Some(path(&[&DEBUGPORT_NODE, &END_ENTIRE_NODE]))
    );
}

#[test]
fn published_port_carries_traffic() {
    let mock = MockTransport::with_input(b"g");
    let mut driver = driver(host(), MemoryStore::empty());
    driver.start(1, &mock).unwrap();

    let port = driver.port();
    assert_eq!(port.poll(), Ok(PollStatus::Ready));
    let mut buf = [0_u8; 1];
    assert_eq!(port.read(0, &mut buf).into_result(), Ok(1));
    assert_eq!(port.write(0, b"OK").into_result(), Ok(2));
    assert_eq!(mock.output(), b"OK");
}

#[test]
fn published_path_helper() {
    let controller = path(&[&ROOT, &PCI_1F, &END_ENTIRE_NODE]);
    assert_eq!(
        published_path(Some(controller.as_slice())).unwrap(),
        path(&[&ROOT, &PCI_1F, &DEBUGPORT_NODE, &END_ENTIRE_NODE])
    );
    assert_eq!(
        published_path(Some(&[0x01, 0x01, 0x02][..])).unwrap(),
        path(&[&DEBUGPORT_NODE, &END_ENTIRE_NODE])
    );
    assert_eq!(
        published_path(None).unwrap(),
        path(&[&DEBUGPORT_NODE, &END_ENTIRE_NODE])
    );
}

#[test]
fn driver_error_display() {
    assert_eq!(
        DriverError::from(Rejection::AlreadyPublished).to_string(),
        "transport rejected: a debug port is already active"
    );
    assert_eq!(DriverError::ResourceExhaustion.to_string(), "out of memory");
}
