//! Retrieval policies and the drain routines they share.
//!
//! `Incremental` pulls one packet per caller demand while live and stages the
//! whole undelivered remainder only when forced to detach. `Eager` stages the
//! whole response at execution time, before the first row reaches the caller.
//! Both funnel through `stage_remainder`, which reserves every row's bytes
//! *before* buffering it, so a capacity failure leaves the ledger clean.

use std::collections::VecDeque;

use tabwire_core::channel::{ResponseChannel, TransportError};
use tabwire_core::config::{CursorKind, RetrievalStrategy};
use tabwire_core::types::{Frame, Row};
use tabwire_mem::{ByteAccountant, StagingBuffer};

use crate::error::Result;

/// The strategy a cursor actually runs under.
///
/// Scrollable result sets need random positional access, which requires full
/// materialization; they are eager no matter what the connection is
/// configured with. This is a semantic requirement of scrollability, not a
/// buffering preference.
pub fn effective_strategy(configured: RetrievalStrategy, kind: CursorKind) -> RetrievalStrategy {
    if kind.is_scrollable() {
        RetrievalStrategy::Eager
    } else {
        configured
    }
}

/// Drain the undelivered remainder of the current response into a new staging
/// buffer: first any rows already decoded but not yet handed to the caller,
/// then every remaining frame through the final result boundary.
///
/// On `CapacityExceeded` the partially filled buffer is dropped here, which
/// releases its bytes; the response remainder is then still on the wire and
/// the caller decides whether to discard it (eager execution) or leave the
/// cursor stalled (forced detach).
pub(crate) fn stage_remainder<C: ResponseChannel>(
    channel: &mut C,
    accountant: &ByteAccountant,
    pending: VecDeque<Row>,
    boundary: Option<bool>,
    tag: &'static str,
) -> Result<StagingBuffer> {
    let mut staging = StagingBuffer::new(accountant, tag);

    for row in pending {
        staging.push_row(row)?;
    }

    match boundary {
        // Final boundary already consumed live; nothing left on the wire.
        Some(false) => return Ok(staging),
        Some(true) => staging.push_boundary(true),
        None => {}
    }

    loop {
        match channel.next_frame()? {
            Frame::Rows(packet) => {
                for row in packet.rows {
                    staging.push_row(row)?;
                }
            }
            Frame::ResultBoundary { more_results } => {
                staging.push_boundary(more_results);
                if !more_results {
                    return Ok(staging);
                }
            }
        }
    }
}

/// Read and drop the rest of the current response so the channel's byte
/// stream stays aligned for the next statement.
pub(crate) fn discard_response<C: ResponseChannel>(
    channel: &mut C,
) -> std::result::Result<(), TransportError> {
    loop {
        match channel.next_frame()? {
            Frame::Rows(_) => {}
            Frame::ResultBoundary { more_results } => {
                if !more_results {
                    return Ok(());
                }
            }
        }
    }
}
