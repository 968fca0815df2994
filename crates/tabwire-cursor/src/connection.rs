//! Connection: owns the channel, the accountant, and the cursor registry.
//!
//! All channel-owning operations (statement execution, packet pulls,
//! detach-drains) run under one per-connection mutex, the exclusion
//! discipline the physical channel requires. Different connections are fully
//! independent: each has its own accountant and its own ceiling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use tabwire_core::channel::ResponseChannel;
use tabwire_core::config::{ConnectionConfig, CursorKind, RetrievalStrategy};
use tabwire_core::id::{ConnectionId, CursorId};
use tabwire_mem::ByteAccountant;

use crate::binding::{Binding, CursorState};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::owner::ChannelOwner;
use crate::strategy::{discard_response, effective_strategy, stage_remainder};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

pub(crate) struct ConnState<C> {
    pub(crate) id: ConnectionId,
    pub(crate) channel: C,
    pub(crate) owner: ChannelOwner,
    pub(crate) cursors: HashMap<CursorId, CursorState>,
    pub(crate) accountant: ByteAccountant,
    pub(crate) config: ConnectionConfig,
    pub(crate) next_cursor: u64,
    pub(crate) closed: bool,
}

/// One client connection's buffering engine.
///
/// Cheap to clone; all clones (and all `Cursor` handles) share the same
/// locked state. Concurrent use from multiple threads serializes through the
/// connection lock.
pub struct Connection<C: ResponseChannel> {
    state: Arc<Mutex<ConnState<C>>>,
}

impl<C: ResponseChannel> Clone for Connection<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: ResponseChannel> Connection<C> {
    pub fn new(channel: C, config: ConnectionConfig) -> Self {
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let accountant = ByteAccountant::new(config.max_buffer_bytes);
        Self {
            state: Arc::new(Mutex::new(ConnState {
                id,
                channel,
                owner: ChannelOwner::new(),
                cursors: HashMap::new(),
                accountant,
                config,
                next_cursor: 0,
                closed: false,
            })),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.state.lock().unwrap().id
    }

    /// Execute a statement under the connection's configured strategy.
    ///
    /// If another cursor currently holds the channel this *detaches it first*:
    /// its response remainder is drained into staging, which may block for the
    /// remaining network reads and may fail with `CapacityExceeded` on that
    /// cursor's behalf. On such a failure the superseded cursor is stalled and
    /// must be closed; this statement is not executed.
    pub fn execute(&self, kind: CursorKind) -> Result<Cursor<C>> {
        let strategy = self.state.lock().unwrap().config.buffering;
        self.execute_with(strategy, kind)
    }

    /// Execute with a per-statement strategy override.
    pub fn execute_with(&self, strategy: RetrievalStrategy, kind: CursorKind) -> Result<Cursor<C>> {
        let mut st = self.state.lock().unwrap();
        if st.closed {
            return Err(Error::ConnectionClosed);
        }

        detach_holder(&mut st)?;

        st.channel.start_response()?;

        let id = CursorId::new(st.next_cursor);
        st.next_cursor += 1;
        let effective = effective_strategy(strategy, kind);

        let binding = match effective {
            RetrievalStrategy::Incremental => {
                st.owner.grant(id);
                Binding::live()
            }
            RetrievalStrategy::Eager => {
                let ConnState {
                    channel,
                    accountant,
                    id: conn_id,
                    ..
                } = &mut *st;
                match stage_remainder(channel, accountant, Default::default(), None, "eager") {
                    Ok(staging) if staging.is_empty() => Binding::Exhausted,
                    Ok(staging) => {
                        debug!(
                            connection = %conn_id,
                            cursor = %id,
                            staged_bytes = staging.staged_bytes(),
                            "eagerly materialized response"
                        );
                        Binding::Detached(staging)
                    }
                    Err(err) => {
                        // The partial staging was dropped (bytes released).
                        // Read out the rest of the failed response so the
                        // channel stays aligned for the next statement.
                        debug!(connection = %conn_id, cursor = %id, %err, "eager materialization failed");
                        if err.is_capacity_exceeded() {
                            discard_response(channel)?;
                        }
                        return Err(err);
                    }
                }
            }
        };

        st.cursors.insert(
            id,
            CursorState {
                kind,
                strategy: effective,
                binding,
            },
        );
        debug!(connection = %st.id, cursor = %id, strategy = ?effective, "cursor opened");

        Ok(Cursor::new(id, Arc::clone(&self.state)))
    }

    /// Total bytes currently staged on this connection (advisory).
    pub fn staged_bytes(&self) -> usize {
        self.state.lock().unwrap().accountant.reserved_bytes()
    }

    /// Highest staging level this connection has reached.
    pub fn peak_staged_bytes(&self) -> usize {
        self.state.lock().unwrap().accountant.peak_bytes()
    }

    pub fn buffer_ceiling(&self) -> usize {
        self.state.lock().unwrap().accountant.ceiling_bytes()
    }

    /// Cursors not yet closed or exhausted-and-closed.
    pub fn open_cursors(&self) -> usize {
        self.state.lock().unwrap().cursors.len()
    }

    /// Force-close every cursor and release all staged bytes. Idempotent.
    ///
    /// A live response still on the wire is read out and dropped on a best
    /// effort basis; the connection is unusable afterwards either way.
    pub fn close(&self) {
        let mut st = self.state.lock().unwrap();
        if st.closed {
            return;
        }
        st.closed = true;

        let ConnState {
            channel,
            owner,
            cursors,
            id,
            ..
        } = &mut *st;

        if let Some(holder) = owner.holder() {
            if cursors.contains_key(&holder) {
                if let Err(err) = discard_response(channel) {
                    debug!(connection = %id, %err, "discard on close failed");
                }
            }
            owner.clear();
        }

        // Dropping the registry drops every staging buffer, returning all
        // reserved bytes through their guards.
        cursors.clear();
        debug!(connection = %id, "connection closed");
    }
}

/// If another cursor holds the channel, force it through its detach
/// transition so the channel can be reassigned.
fn detach_holder<C: ResponseChannel>(st: &mut ConnState<C>) -> Result<()> {
    let Some(prev_id) = st.owner.holder() else {
        return Ok(());
    };

    let ConnState {
        channel,
        owner,
        cursors,
        accountant,
        id: conn_id,
        ..
    } = st;

    let Some(prev) = cursors.get_mut(&prev_id) else {
        // Registry and owner must agree; a missing holder is a core bug.
        debug_assert!(false, "channel holder {prev_id} not in cursor registry");
        owner.clear();
        return Ok(());
    };

    match &mut prev.binding {
        Binding::Exhausted => {
            owner.release(prev_id);
            Ok(())
        }
        Binding::Live { stalled: true, .. } => {
            // A previous detach already failed; the wire still carries that
            // cursor's remainder, so nothing new can execute until it closes.
            Err(Error::CursorStalled)
        }
        Binding::Live {
            pending, boundary, ..
        } => {
            let pending = std::mem::take(pending);
            let boundary = boundary.take();
            match stage_remainder(channel, accountant, pending, boundary, "detach") {
                Ok(staging) => {
                    debug!(
                        connection = %conn_id,
                        cursor = %prev_id,
                        staged_bytes = staging.staged_bytes(),
                        "cursor detached from channel"
                    );
                    prev.binding = if staging.is_empty() {
                        Binding::Exhausted
                    } else {
                        Binding::Detached(staging)
                    };
                    owner.release(prev_id);
                    Ok(())
                }
                Err(err) => {
                    // Partial staging already dropped (bytes released). The
                    // remainder is still on the wire: the cursor keeps nominal
                    // ownership so nobody else touches the channel until it is
                    // closed and the remainder discarded.
                    debug!(connection = %conn_id, cursor = %prev_id, %err, "forced detach failed");
                    prev.binding = Binding::Live {
                        pending: Default::default(),
                        boundary: None,
                        stalled: true,
                    };
                    Err(err)
                }
            }
        }
        Binding::Detached(_) => {
            debug_assert!(false, "detached cursor {prev_id} still registered as channel holder");
            owner.clear();
            Ok(())
        }
    }
}
