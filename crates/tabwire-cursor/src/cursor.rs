//! Cursor handle: the statement layer's view of one result stream.
//!
//! Rows always arrive in server-emission order whether the cursor is live or
//! detached; the caller cannot observe which side of the state machine it is
//! on except through timing and capacity errors.

use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use tabwire_core::channel::ResponseChannel;
use tabwire_core::id::CursorId;
use tabwire_core::types::{Frame, Row};

use crate::binding::Binding;
use crate::connection::ConnState;
use crate::error::{Error, Result};
use crate::strategy::discard_response;

/// Handle over one statement's result rows.
///
/// Handles are cheap to clone and share the connection's lock; dropping a
/// handle does *not* close the cursor. `close` is explicit, and
/// `Connection::close` force-closes whatever remains.
pub struct Cursor<C: ResponseChannel> {
    id: CursorId,
    state: Arc<Mutex<ConnState<C>>>,
}

impl<C: ResponseChannel> std::fmt::Debug for Cursor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<C: ResponseChannel> Clone for Cursor<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: ResponseChannel> Cursor<C> {
    pub(crate) fn new(id: CursorId, state: Arc<Mutex<ConnState<C>>>) -> Self {
        Self { id, state }
    }

    pub fn id(&self) -> CursorId {
        self.id
    }

    /// Deliver the next row of the current result set, or `Ok(None)` when the
    /// set is finished. Exhausted cursors keep returning `Ok(None)`.
    ///
    /// A live cursor pulls at most one packet's worth of rows from the
    /// channel per call; a detached cursor reads from staging, releasing each
    /// row's bytes as it leaves.
    pub fn next_row(&self) -> Result<Option<Row>> {
        let mut st = self.state.lock().unwrap();
        if st.closed {
            return Err(Error::ConnectionClosed);
        }
        let ConnState {
            channel,
            owner,
            cursors,
            ..
        } = &mut *st;
        let cur = cursors.get_mut(&self.id).ok_or(Error::CursorClosed)?;

        match &mut cur.binding {
            Binding::Exhausted => Ok(None),

            Binding::Detached(staging) => {
                if let Some(row) = staging.pop_row() {
                    return Ok(Some(row));
                }
                match staging.next_is_boundary() {
                    // End of this result set; the boundary is consumed by
                    // next_result_set.
                    Some(true) => Ok(None),
                    Some(false) => {
                        staging.take_boundary();
                        cur.binding = Binding::Exhausted;
                        Ok(None)
                    }
                    None => {
                        cur.binding = Binding::Exhausted;
                        Ok(None)
                    }
                }
            }

            Binding::Live { stalled: true, .. } => Err(Error::CursorStalled),

            Binding::Live {
                pending, boundary, ..
            } => {
                if let Some(row) = pending.pop_front() {
                    return Ok(Some(row));
                }
                if boundary.is_some() {
                    // Current result set already ended; wait for
                    // next_result_set.
                    return Ok(None);
                }
                debug_assert_eq!(owner.holder(), Some(self.id), "live cursor without channel");
                loop {
                    match channel.next_frame()? {
                        Frame::Rows(packet) => {
                            trace!(
                                cursor = %self.id,
                                packet_bytes = packet.byte_size,
                                rows = packet.rows.len(),
                                "packet pulled live"
                            );
                            pending.extend(packet.rows);
                            if let Some(row) = pending.pop_front() {
                                return Ok(Some(row));
                            }
                            // Metadata-only packet; keep pulling.
                        }
                        Frame::ResultBoundary { more_results: true } => {
                            *boundary = Some(true);
                            return Ok(None);
                        }
                        Frame::ResultBoundary {
                            more_results: false,
                        } => {
                            cur.binding = Binding::Exhausted;
                            owner.release(self.id);
                            return Ok(None);
                        }
                    }
                }
            }
        }
    }

    /// Advance to the statement's next result set, discarding whatever is
    /// left of the current one. Returns `Ok(false)` when there is none.
    pub fn next_result_set(&self) -> Result<bool> {
        let mut st = self.state.lock().unwrap();
        if st.closed {
            return Err(Error::ConnectionClosed);
        }
        let ConnState {
            channel,
            owner,
            cursors,
            ..
        } = &mut *st;
        let cur = cursors.get_mut(&self.id).ok_or(Error::CursorClosed)?;

        match &mut cur.binding {
            Binding::Exhausted => Ok(false),

            Binding::Detached(staging) => {
                while staging.pop_row().is_some() {}
                match staging.take_boundary() {
                    Some(true) => Ok(true),
                    Some(false) | None => {
                        cur.binding = Binding::Exhausted;
                        Ok(false)
                    }
                }
            }

            Binding::Live { stalled: true, .. } => Err(Error::CursorStalled),

            Binding::Live {
                pending, boundary, ..
            } => {
                pending.clear();
                if let Some(more) = boundary.take() {
                    if more {
                        return Ok(true);
                    }
                    cur.binding = Binding::Exhausted;
                    owner.release(self.id);
                    return Ok(false);
                }
                debug_assert_eq!(owner.holder(), Some(self.id), "live cursor without channel");
                loop {
                    match channel.next_frame()? {
                        Frame::Rows(_) => {}
                        Frame::ResultBoundary { more_results: true } => return Ok(true),
                        Frame::ResultBoundary {
                            more_results: false,
                        } => {
                            cur.binding = Binding::Exhausted;
                            owner.release(self.id);
                            return Ok(false);
                        }
                    }
                }
            }
        }
    }

    /// Close the cursor, releasing its staged bytes and, for a live (or
    /// stalled) cursor, reading out and dropping the rest of its response so
    /// the channel is clean for the next statement. Idempotent: closing an
    /// exhausted or already-closed cursor releases nothing further.
    pub fn close(&self) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        if st.closed {
            return Ok(());
        }
        let ConnState {
            channel,
            owner,
            cursors,
            id: conn_id,
            ..
        } = &mut *st;

        let Some(cur) = cursors.remove(&self.id) else {
            return Ok(());
        };

        match cur.binding {
            Binding::Live { .. } => {
                let drained = discard_response(channel);
                owner.release(self.id);
                debug!(connection = %conn_id, cursor = %self.id, "live cursor closed, response discarded");
                drained?;
                Ok(())
            }
            Binding::Detached(staging) => {
                debug!(
                    connection = %conn_id,
                    cursor = %self.id,
                    released_bytes = staging.staged_bytes(),
                    "detached cursor closed"
                );
                drop(staging);
                Ok(())
            }
            Binding::Exhausted => Ok(()),
        }
    }

    /// True once every row (and result set) has been delivered or the cursor
    /// was closed.
    pub fn is_exhausted(&self) -> bool {
        let st = self.state.lock().unwrap();
        match st.cursors.get(&self.id) {
            Some(cur) => cur.binding.is_exhausted(),
            None => true,
        }
    }

    /// True when a failed forced detach left this cursor unable to progress;
    /// the only useful operation left is `close`.
    pub fn is_stalled(&self) -> bool {
        let st = self.state.lock().unwrap();
        st.cursors
            .get(&self.id)
            .is_some_and(|cur| cur.binding.is_stalled())
    }
}
