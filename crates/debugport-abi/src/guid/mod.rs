// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! 128-bit globally unique identifiers.
//!
//! GUIDs are stored in the firmware's mixed-endian layout: the first three
//! fields little-endian, the trailing eight bytes as-is. This is the layout
//! found inside vendor path nodes and used for variable namespaces.

use core::fmt;


/// Size of an encoded GUID in bytes.
pub const GUID_LEN: usize = 16;

/// A GUID in wire layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Guid([u8; GUID_LEN]);

impl Guid {
    /// Builds a GUID from its canonical textual fields.
    #[must_use]
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        let a = data1.to_le_bytes();
        let b = data2.to_le_bytes();
        let c = data3.to_le_bytes();
        Self([
            a[0], a[1], a[2], a[3], b[0], b[1], c[0], c[1], data4[0], data4[1], data4[2],
            data4[3], data4[4], data4[5], data4[6], data4[7],
        ])
    }

    /// Wraps raw wire bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; GUID_LEN]) -> Self {
        Self(bytes)
    }

    /// Reads a GUID from the start of `bytes`.
    ///
    /// Returns `None` if fewer than 16 bytes are available.
    #[must_use]
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..GUID_LEN)?;
        let mut raw = [0_u8; GUID_LEN];
        raw.copy_from_slice(head);
        Some(Self(raw))
    }

    /// Returns the wire bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; GUID_LEN] {
        &self.0
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let data1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let data2 = u16::from_le_bytes([b[4], b[5]]);
        let data3 = u16::from_le_bytes([b[6], b[7]]);
        write!(
            f,
            "{data1:08X}-{data2:04X}-{data3:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

/// Debug port GUID.
///
/// Names the published debug port interface, the namespace of the
/// `DEBUGPORT` variable, and the vendor messaging node that terminates a
/// debug port path.
pub const DEBUGPORT_GUID: Guid = Guid::from_fields(
    0xEBA4_E8D2,
    0x3858,
    0x41EC,
    [0xA2, 0x81, 0x26, 0x47, 0xBA, 0x96, 0x60, 0xD0],
);
