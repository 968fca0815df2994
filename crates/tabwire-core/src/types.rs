//! Decoded-row and wire-frame vocabulary shared by the buffering engine.
//!
//! The packet/token decoder lives outside this workspace; it hands us frames
//! whose byte sizes it has already measured. Keeping sizes on the decoded
//! values lets staging release bytes row-by-row as the caller drains them.

use serde::{Deserialize, Serialize};

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

/// One decoded result row together with the number of wire bytes it occupied.
///
/// The wire size is reported by the decoder, not recomputed here; it is the
/// unit the byte ledger reserves and releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
    wire_size: usize,
}

impl Row {
    pub fn new(values: Vec<Value>, wire_size: usize) -> Self {
        Self { values, wire_size }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Bytes this row occupied on the wire (ledger accounting unit).
    pub fn byte_size(&self) -> usize {
        self.wire_size
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// The decoded rows of one wire packet plus the packet's total byte size.
///
/// The packet size can exceed the sum of row sizes (headers, column metadata);
/// only row bytes are staged, so only row bytes are accounted.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRows {
    pub rows: Vec<Row>,
    /// Total wire bytes of the packet, framing overhead included. Reported
    /// for diagnostics; the ledger accounts row bytes only.
    pub byte_size: usize,
}

impl PacketRows {
    pub fn new(rows: Vec<Row>, byte_size: usize) -> Self {
        Self { rows, byte_size }
    }
}

/// One logical frame of a server response, as reported by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A packet's worth of decoded rows.
    Rows(PacketRows),
    /// End of the current result set. `more_results` signals that another
    /// result set of the same statement follows on the channel.
    ResultBoundary { more_results: bool },
}
