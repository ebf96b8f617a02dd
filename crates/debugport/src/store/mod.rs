// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Persistent configuration storage boundary.
//!
//! The stored descriptor is a byte blob keyed by a name and a GUID
//! namespace. Its size is not known up front, so fetching starts with an
//! empty buffer and retries with the size the store asks for.

use alloc::vec::Vec;
use core::fmt;

use debugport_abi::Guid;


/// Upper bound on grow-and-retry rounds when the blob keeps growing.
const MAX_FETCH_ATTEMPTS: usize = 3;

/// Status reported by the variable store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// No variable with this name exists in the namespace.
    NotFound,
    /// The buffer is too small; retry with at least `required` bytes.
    BufferTooSmall {
        /// Size the store needs.
        required: usize,
    },
    /// The store failed.
    DeviceError,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "variable not found"),
            Self::BufferTooSmall { required } => {
                write!(f, "buffer too small, {required} bytes required")
            }
            Self::DeviceError => write!(f, "variable store device error"),
        }
    }
}

/// Failure to fetch a stored blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// The buffer for the blob could not be allocated.
    ResourceExhaustion,
    /// The store reported an error.
    Store(StoreError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceExhaustion => write!(f, "out of memory fetching variable"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Keyed blob storage provided by the host environment.
pub trait VariableStore {
    /// Copies the variable into `buf` and returns its size.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BufferTooSmall` with the needed size when `buf`
    /// cannot hold the variable, `StoreError::NotFound` if it does not exist.
    fn get(&self, name: &str, namespace: &Guid, buf: &mut [u8]) -> Result<usize, StoreError>;
}

impl<S: VariableStore + ?Sized> VariableStore for &S {
    fn get(&self, name: &str, namespace: &Guid, buf: &mut [u8]) -> Result<usize, StoreError> {
        (**self).get(name, namespace, buf)
    }
}

/// Fetches a variable into an owned buffer.
///
/// Asks with an empty buffer first, then grows to the size the store reports
/// and fetches again. If the variable grows between the two calls the
/// grow-and-fetch round is repeated, a bounded number of times.
///
/// Returns `Ok(None)` if the variable does not exist.
///
/// # Errors
///
/// Returns `FetchError::ResourceExhaustion` if the buffer cannot be
/// allocated and `FetchError::Store` for any other store failure.
pub fn fetch_variable<S: VariableStore + ?Sized>(
    store: &S,
    name: &str,
    namespace: &Guid,
) -> Result<Option<Vec<u8>>, FetchError> {
    let mut required = match store.get(name, namespace, &mut []) {
        Ok(_) => return Ok(Some(Vec::new())),
        Err(StoreError::NotFound) => return Ok(None),
        Err(StoreError::BufferTooSmall { required }) => required,
        Err(err) => return Err(err.into()),
    };

    let mut buf = Vec::new();
    for _ in 0..MAX_FETCH_ATTEMPTS {
        buf.clear();
        buf.try_reserve_exact(required)
            .map_err(|_| FetchError::ResourceExhaustion)?;
        buf.resize(required, 0);

        match store.get(name, namespace, &mut buf) {
            Ok(size) => {
                buf.truncate(size);
                return Ok(Some(buf));
            }
            Err(StoreError::BufferTooSmall { required: grown }) => required = grown,
            Err(StoreError::NotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }

    Err(StoreError::BufferTooSmall { required }.into())
}
