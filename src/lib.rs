//! tabwire: client-side response buffering for a tabular, packet-framed wire
//! protocol.
//!
//! A connection's single physical channel carries one in-flight response at a
//! time, yet callers may interleave several open cursors. This workspace
//! decides which cursor reads live and which reads from a staged copy, and
//! enforces one hard byte ceiling over everything staged per connection.
//!
//! The root crate just re-exports the members:
//! - [`tabwire_core`]: types, config, and the ledger/transport interfaces.
//! - [`tabwire_mem`]: the byte accountant and staging buffers.
//! - [`tabwire_cursor`]: connection, cursors, strategies, and channel
//!   ownership.

pub use tabwire_core as core;
pub use tabwire_cursor as cursor;
pub use tabwire_mem as mem;

pub use tabwire_core::config::{ConnectionConfig, CursorKind, RetrievalStrategy};
pub use tabwire_core::types::{Frame, PacketRows, Row, Value};
pub use tabwire_cursor::{Connection, Cursor, Error, Result};
pub use tabwire_mem::{ByteAccountant, StagingBuffer};
