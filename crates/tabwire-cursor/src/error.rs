use thiserror::Error;

use tabwire_core::channel::TransportError;

/// Result type local to tabwire-cursor.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A reservation would have pushed staged bytes above the ceiling. Raised
    /// by the call that triggered the reservation: an eager execution, or an
    /// execution that forced another cursor's detach.
    #[error(transparent)]
    Capacity(#[from] tabwire_mem::Error),

    /// Propagated unchanged from the packet layer; never retried here, since
    /// the position in a partially consumed response would be ambiguous.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The cursor's forced detach failed; it can make no further progress and
    /// must be closed to resynchronize the channel.
    #[error("cursor stalled by a failed detach; close it to free the channel")]
    CursorStalled,

    /// Operation on a cursor that was already closed.
    #[error("cursor already closed")]
    CursorClosed,

    /// Operation on a closed connection.
    #[error("connection closed")]
    ConnectionClosed,
}

impl Error {
    /// True when the error is the buffering ceiling being exceeded.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Error::Capacity(tabwire_mem::Error::CapacityExceeded { .. }))
    }
}
