//! Per-cursor binding state machine.
//!
//! A cursor reads either live from the physical channel or from its staging
//! buffer, never both. The only transitions are:
//!
//! - `Live -> Exhausted`: the final result boundary is consumed.
//! - `Live -> Detached`: forced when another statement needs the channel; the
//!   response remainder is drained into staging first.
//! - `Detached -> Exhausted`: the last staged item is drained, or the cursor
//!   is closed.
//!
//! Once detached, a cursor never reclaims the channel.

use std::collections::VecDeque;

use tabwire_core::config::{CursorKind, RetrievalStrategy};
use tabwire_core::types::Row;
use tabwire_mem::StagingBuffer;

/// Where a cursor's rows come from.
pub enum Binding {
    /// Reading directly from the physical channel.
    Live {
        /// Rows decoded from the most recently pulled packet, not yet handed
        /// to the caller. These are not accounted: they are already "in the
        /// caller's hands" and move into staging only on detach.
        pending: VecDeque<Row>,
        /// Set when the current result set's boundary has been read but not
        /// yet acted on: `Some(more_results)`.
        boundary: Option<bool>,
        /// A forced detach failed. The cursor keeps nominal channel ownership
        /// (its response remainder is still on the wire) but can make no
        /// progress; only `close` is useful now.
        stalled: bool,
    },
    /// Reading from the staged remainder; the channel has moved on.
    Detached(StagingBuffer),
    /// Terminal: no channel, no buffer, no further rows.
    Exhausted,
}

impl Binding {
    pub fn live() -> Self {
        Binding::Live {
            pending: VecDeque::new(),
            boundary: None,
            stalled: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Binding::Exhausted)
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self, Binding::Live { stalled: true, .. })
    }
}

/// Everything the connection tracks for one open cursor.
pub struct CursorState {
    pub kind: CursorKind,
    /// Effective strategy (scrollable kinds are forced eager).
    pub strategy: RetrievalStrategy,
    pub binding: Binding,
}
