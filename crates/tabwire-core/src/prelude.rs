//! Convenient re-exports for downstream crates.

pub use crate::channel::{ResponseChannel, TransportError};
pub use crate::config::{ConnectionConfig, CursorKind, RetrievalStrategy};
pub use crate::error::{Error, Result};
pub use crate::id::{ConnectionId, CursorId};
pub use crate::ledger::{ByteLedger, LedgerGuard};
pub use crate::types::{Frame, PacketRows, Row, Value};
