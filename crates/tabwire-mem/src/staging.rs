//! Staging buffers: the undrained remainder of one cursor's response.
//!
//! A staging buffer owns exactly one `Reservation` covering every row it
//! holds. Appends grow the reservation *before* the row is enqueued, so the
//! ledger never under-reports real memory; pops shrink it as rows leave.
//! Dropping the buffer releases whatever is left.

use std::collections::VecDeque;

use tabwire_core::ledger::LedgerGuard;
use tabwire_core::types::Row;

use crate::accountant::{ByteAccountant, Reservation};
use crate::error::Result;

/// One staged item, in server-emission order.
///
/// Result-set boundaries are staged alongside rows so a detached cursor can
/// still report "more results" framing; they account for zero bytes.
#[derive(Debug)]
pub enum Staged {
    Row(Row),
    ResultBoundary { more_results: bool },
}

/// Append-only FIFO store for the undelivered remainder of one response.
pub struct StagingBuffer {
    items: VecDeque<Staged>,
    reservation: Reservation,
}

impl StagingBuffer {
    /// Create an empty buffer accounted against `accountant`.
    ///
    /// Starting empty touches no counters; capacity is only checked as rows
    /// are appended.
    pub fn new(accountant: &ByteAccountant, tag: &'static str) -> Self {
        Self {
            items: VecDeque::new(),
            reservation: accountant.empty_reservation(tag),
        }
    }

    /// Stage a row, reserving its wire size first. On `CapacityExceeded`
    /// nothing is buffered and the ledger is unchanged.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        self.reservation.grow(row.byte_size())?;
        self.items.push_back(Staged::Row(row));
        Ok(())
    }

    /// Stage a result-set boundary (zero accounted bytes).
    pub fn push_boundary(&mut self, more_results: bool) {
        self.items.push_back(Staged::ResultBoundary { more_results });
    }

    /// Peek at the oldest staged item without consuming it.
    pub fn front(&self) -> Option<&Staged> {
        self.items.front()
    }

    /// Remove and return the oldest staged item, releasing a row's bytes.
    pub fn pop(&mut self) -> Option<Staged> {
        let item = self.items.pop_front()?;
        if let Staged::Row(row) = &item {
            self.reservation.shrink(row.byte_size());
        }
        Some(item)
    }

    /// Remove and return the oldest staged item only if it is a row.
    pub fn pop_row(&mut self) -> Option<Row> {
        if matches!(self.items.front(), Some(Staged::Row(_))) {
            if let Some(Staged::Row(row)) = self.items.pop_front() {
                self.reservation.shrink(row.byte_size());
                return Some(row);
            }
        }
        None
    }

    /// Peek the head boundary's `more_results` flag, if the head is a boundary.
    pub fn next_is_boundary(&self) -> Option<bool> {
        match self.items.front() {
            Some(Staged::ResultBoundary { more_results }) => Some(*more_results),
            _ => None,
        }
    }

    /// Consume the head boundary, returning its `more_results` flag.
    pub fn take_boundary(&mut self) -> Option<bool> {
        if matches!(self.items.front(), Some(Staged::ResultBoundary { .. })) {
            if let Some(Staged::ResultBoundary { more_results }) = self.items.pop_front() {
                return Some(more_results);
            }
        }
        None
    }

    /// Bytes currently reserved for this buffer.
    pub fn staged_bytes(&self) -> usize {
        self.reservation.bytes()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
