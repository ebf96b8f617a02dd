// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Serialized device path format.
//!
//! A device path is a packed sequence of variable-length nodes. Each node
//! begins with a four byte header:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 1 | `node_type` |
//! | 1 | 1 | `sub_type` |
//! | 2 | 2 | `length` (LE, includes header) |
//!
//! The walk always decodes the header first and checks the declared length
//! against the bytes that remain before any kind-specific payload is read.
//! A path ends at an end-entire node or when the bytes run out.
//!
//! ## UART node (messaging / 0x0E, 19 bytes)
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 4 | 4 | reserved |
//! | 8 | 8 | `baud_rate` (LE) |
//! | 16 | 1 | `data_bits` |
//! | 17 | 1 | `parity` |
//! | 18 | 1 | `stop_bits` |
//!
//! ## Vendor node (messaging / 0x0A, >= 20 bytes)
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 4 | 16 | vendor GUID |
//! | 20 | n | vendor data |

use core::fmt;
use core::iter::FusedIterator;

use crate::guid::{DEBUGPORT_GUID, GUID_LEN, Guid};
use crate::serial::TransportConfig;


// =============================================================================
// Constants
// =============================================================================

/// Length field of a bare header, such as an end node.
const HEADER_LENGTH: u16 = 4;

/// Length field of a UART node.
const UART_LENGTH: u16 = 19;

/// Length field of a vendor node without vendor data.
const VENDOR_LENGTH: u16 = 20;

/// Size of a node header in bytes.
pub const NODE_HEADER_LEN: usize = HEADER_LENGTH as usize;

/// Messaging node type.
pub const TYPE_MESSAGING: u8 = 0x03;

/// End node type.
pub const TYPE_END: u8 = 0x7F;

/// Messaging sub-type: vendor-defined.
pub const SUBTYPE_VENDOR: u8 = 0x0A;

/// Messaging sub-type: UART line parameters.
pub const SUBTYPE_UART: u8 = 0x0E;

/// End sub-type: end of this instance, another instance follows.
pub const SUBTYPE_END_INSTANCE: u8 = 0x01;

/// End sub-type: end of the entire path.
pub const SUBTYPE_END_ENTIRE: u8 = 0xFF;

/// Exact length of a UART node.
pub const UART_NODE_LEN: usize = UART_LENGTH as usize;

/// Length of a vendor node without vendor data.
pub const VENDOR_NODE_LEN: usize = VENDOR_LENGTH as usize;

const _: () = assert!(VENDOR_NODE_LEN == NODE_HEADER_LEN + GUID_LEN);

/// Encoded end-entire node.
pub const END_ENTIRE_NODE: [u8; NODE_HEADER_LEN] =
    NodeHeader::new(TYPE_END, SUBTYPE_END_ENTIRE, HEADER_LENGTH).encode();

/// Encoded vendor node carrying the debug port GUID.
///
/// Appended to a transport's path to form the published debug port path.
pub const DEBUGPORT_NODE: [u8; VENDOR_NODE_LEN] = encode_vendor(&DEBUGPORT_GUID);

/// Encodes a vendor messaging node carrying `guid` and no vendor data.
#[must_use]
pub const fn encode_vendor(guid: &Guid) -> [u8; VENDOR_NODE_LEN] {
    let header = NodeHeader::new(TYPE_MESSAGING, SUBTYPE_VENDOR, VENDOR_LENGTH).encode();
    let mut out = [0_u8; VENDOR_NODE_LEN];
    let mut i = 0;
    while i < NODE_HEADER_LEN {
        out[i] = header[i];
        i += 1;
    }
    let raw = guid.as_bytes();
    let mut j = 0;
    while j < GUID_LEN {
        out[NODE_HEADER_LEN + j] = raw[j];
        j += 1;
    }
    out
}

// =============================================================================
// Errors
// =============================================================================

/// Malformed path data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathError {
    /// Fewer than four bytes remain where a node header is expected.
    TruncatedHeader {
        /// Byte offset of the partial header.
        offset: usize,
    },
    /// Declared length is shorter than a header, runs past the end of the
    /// data, or does not fit the node kind.
    BadLength {
        /// Byte offset of the node.
        offset: usize,
        /// Declared node length.
        length: u16,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TruncatedHeader { offset } => {
                write!(f, "truncated node header at offset {offset}")
            }
            Self::BadLength { offset, length } => {
                write!(f, "invalid node length {length} at offset {offset}")
            }
        }
    }
}

// =============================================================================
// Node Header
// =============================================================================

/// Decoded node header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeHeader {
    /// Major node type.
    pub node_type: u8,
    /// Type-specific sub-type.
    pub sub_type: u8,
    /// Total node length including this header.
    pub length: u16,
}

impl NodeHeader {
    /// Creates a header.
    #[inline]
    #[must_use]
    pub const fn new(node_type: u8, sub_type: u8, length: u16) -> Self {
        Self {
            node_type,
            sub_type,
            length,
        }
    }

    /// Reads a header from the start of `bytes`.
    #[inline]
    #[must_use]
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..NODE_HEADER_LEN)?;
        Some(Self {
            node_type: raw[0],
            sub_type: raw[1],
            length: u16::from_le_bytes([raw[2], raw[3]]),
        })
    }

    /// Encodes the header.
    #[must_use]
    pub const fn encode(self) -> [u8; NODE_HEADER_LEN] {
        let len = self.length.to_le_bytes();
        [self.node_type, self.sub_type, len[0], len[1]]
    }

    /// Returns true for an end-entire node.
    #[inline]
    #[must_use]
    pub const fn is_end_entire(self) -> bool {
        self.node_type == TYPE_END && self.sub_type == SUBTYPE_END_ENTIRE
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// A length-validated node whose payload has not been interpreted yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawNode<'a> {
    header: NodeHeader,
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> RawNode<'a> {
    /// The node header.
    #[inline]
    #[must_use]
    pub const fn header(&self) -> NodeHeader {
        self.header
    }

    /// The whole node, header included.
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The bytes following the header.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[NODE_HEADER_LEN..]
    }

    /// Byte offset of this node within its path.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Interprets the payload according to the node kind.
    ///
    /// # Errors
    ///
    /// Returns `PathError::BadLength` if a recognized kind carries a length
    /// that does not fit its layout.
    pub fn decode(&self) -> Result<Node<'a>, PathError> {
        let bad_length = PathError::BadLength {
            offset: self.offset,
            length: self.header.length,
        };
        match (self.header.node_type, self.header.sub_type) {
            (TYPE_END, SUBTYPE_END_ENTIRE) => Ok(Node::EndEntire),
            (TYPE_END, SUBTYPE_END_INSTANCE) => Ok(Node::EndInstance),
            (TYPE_MESSAGING, SUBTYPE_UART) => {
                if self.bytes.len() != UART_NODE_LEN {
                    return Err(bad_length);
                }
                Ok(Node::Uart(UartNode::parse(self.payload())))
            }
            (TYPE_MESSAGING, SUBTYPE_VENDOR) => {
                let payload = self.payload();
                let guid = Guid::read_from(payload).ok_or(bad_length)?;
                Ok(Node::Vendor(VendorNode {
                    guid,
                    data: &payload[GUID_LEN..],
                }))
            }
            _ => Ok(Node::Other(*self)),
        }
    }
}

/// A decoded node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node<'a> {
    /// End of the entire path.
    EndEntire,
    /// End of one instance; another follows.
    EndInstance,
    /// UART line parameters.
    Uart(UartNode),
    /// Vendor-defined messaging node.
    Vendor(VendorNode<'a>),
    /// Any kind this crate does not interpret.
    Other(RawNode<'a>),
}

/// UART line parameters carried in a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UartNode {
    /// Bits per second.
    pub baud_rate: u64,
    /// Data bits per character.
    pub data_bits: u8,
    /// Raw parity value.
    pub parity: u8,
    /// Raw stop-bits value.
    pub stop_bits: u8,
}

impl UartNode {
    /// Builds a node from a configuration.
    #[must_use]
    pub const fn from_config(config: &TransportConfig) -> Self {
        Self {
            baud_rate: config.baud_rate,
            data_bits: config.data_bits,
            parity: config.parity.as_raw(),
            stop_bits: config.stop_bits.as_raw(),
        }
    }

    /// Parses the 15 payload bytes following the header.
    fn parse(payload: &[u8]) -> Self {
        let mut baud = [0_u8; 8];
        baud.copy_from_slice(&payload[4..12]);
        Self {
            baud_rate: u64::from_le_bytes(baud),
            data_bits: payload[12],
            parity: payload[13],
            stop_bits: payload[14],
        }
    }

    /// The line configuration this node requests.
    #[must_use]
    pub const fn config(&self) -> TransportConfig {
        TransportConfig::from_line(self.baud_rate, self.data_bits, self.parity, self.stop_bits)
    }

    /// Encodes the node, header included.
    #[must_use]
    pub fn encode(&self) -> [u8; UART_NODE_LEN] {
        let mut out = [0_u8; UART_NODE_LEN];
        out[..NODE_HEADER_LEN].copy_from_slice(
            &NodeHeader::new(TYPE_MESSAGING, SUBTYPE_UART, UART_LENGTH).encode(),
        );
        out[8..16].copy_from_slice(&self.baud_rate.to_le_bytes());
        out[16] = self.data_bits;
        out[17] = self.parity;
        out[18] = self.stop_bits;
        out
    }
}

/// Vendor-defined messaging node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VendorNode<'a> {
    /// Vendor GUID.
    pub guid: Guid,
    /// Vendor data following the GUID.
    pub data: &'a [u8],
}

// =============================================================================
// Device Path
// =============================================================================

/// A borrowed, serialized device path.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DevicePath<'a> {
    bytes: &'a [u8],
}

impl<'a> DevicePath<'a> {
    /// Wraps serialized path bytes. Nothing is validated until walked.
    #[inline]
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// The raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterates over length-validated nodes.
    #[inline]
    #[must_use]
    pub const fn nodes(&self) -> Nodes<'a> {
        Nodes {
            rest: self.bytes,
            offset: 0,
            done: false,
        }
    }

    /// Returns true if the path has no nodes before its end.
    #[must_use]
    pub fn is_end(&self) -> bool {
        match self.nodes().next() {
            None => true,
            Some(Ok(node)) => node.header().is_end_entire(),
            Some(Err(_)) => false,
        }
    }

    /// Walks the path to the first UART node.
    ///
    /// Returns `Ok(None)` if the path ends without one.
    ///
    /// # Errors
    ///
    /// Returns an error if a node before the UART node is malformed.
    pub fn find_uart(&self) -> Result<Option<UartNode>, PathError> {
        for raw in self.nodes() {
            match raw?.decode()? {
                Node::Uart(uart) => return Ok(Some(uart)),
                Node::EndEntire => return Ok(None),
                Node::EndInstance | Node::Vendor(_) | Node::Other(_) => {}
            }
        }
        Ok(None)
    }

    /// The bytes before the end-entire node.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn instance_bytes(&self) -> Result<&'a [u8], PathError> {
        for raw in self.nodes() {
            let raw = raw?;
            if raw.header().is_end_entire() {
                return Ok(&self.bytes[..raw.offset()]);
            }
        }
        Ok(self.bytes)
    }

    /// Strips `prefix` node-by-node and returns what follows it.
    ///
    /// Nodes must match byte for byte. The prefix's end-entire node is not
    /// compared. Returns `None` on mismatch or if either path is malformed
    /// within the compared range.
    #[must_use]
    pub fn strip_prefix(&self, prefix: DevicePath<'_>) -> Option<DevicePath<'a>> {
        let mut rest = self.nodes();
        for expected in prefix.nodes() {
            let expected = expected.ok()?;
            if expected.header().is_end_entire() {
                break;
            }
            let actual = rest.next()?.ok()?;
            if actual.bytes() != expected.bytes() {
                return None;
            }
        }
        Some(DevicePath::new(rest.remaining()))
    }
}

impl fmt::Debug for DevicePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for raw in self.nodes() {
            match raw {
                Ok(node) => {
                    let h = node.header();
                    list.entry(&format_args!("{:02X}/{:02X}[{}]", h.node_type, h.sub_type, h.length));
                }
                Err(err) => {
                    list.entry(&format_args!("<{err}>"));
                }
            }
        }
        list.finish()
    }
}

/// Iterator over the nodes of a [`DevicePath`].
///
/// Yields the end-entire node and then stops. A malformed node yields one
/// error and then stops.
#[derive(Clone, Debug)]
pub struct Nodes<'a> {
    rest: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Nodes<'a> {
    /// The bytes not yet consumed.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Result<RawNode<'a>, PathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.rest.is_empty() {
            return None;
        }
        let offset = self.offset;
        let Some(header) = NodeHeader::read_from(self.rest) else {
            self.done = true;
            return Some(Err(PathError::TruncatedHeader { offset }));
        };
        let len = usize::from(header.length);
        if len < NODE_HEADER_LEN || len > self.rest.len() {
            self.done = true;
            return Some(Err(PathError::BadLength {
                offset,
                length: header.length,
            }));
        }
        let (bytes, rest) = self.rest.split_at(len);
        self.rest = rest;
        self.offset += len;
        if header.is_end_entire() {
            self.done = true;
        }
        Some(Ok(RawNode {
            header,
            bytes,
            offset,
        }))
    }
}

impl FusedIterator for Nodes<'_> {}
