//! tabwire-core: shared types and interfaces for the response-buffering client.
//!
//! This crate holds the vocabulary the rest of the workspace speaks: decoded
//! rows and wire frames, the abstract byte-accounting interfaces (implemented
//! by `tabwire-mem`), the transport seam (implemented by the surrounding
//! driver, or by `tabwire-cursor`'s scripted channel in tests), and the
//! connection configuration surface.
//!
//! No I/O and no allocation policy live here.

pub mod channel;
pub mod config;
pub mod error;
pub mod id;
pub mod ledger;
pub mod prelude;
pub mod types;

pub use channel::{ResponseChannel, TransportError};
pub use config::{ConnectionConfig, CursorKind, RetrievalStrategy};
pub use error::{Error, Result};
pub use id::{ConnectionId, CursorId};
pub use ledger::{ByteLedger, LedgerGuard};
pub use types::{Frame, PacketRows, Row, Value};
