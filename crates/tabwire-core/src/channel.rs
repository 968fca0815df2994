//! Transport seam: the one interface the buffering engine needs from the
//! packet/decoder layer underneath it.
//!
//! A channel carries exactly one in-flight response at a time. Both methods
//! may block on network I/O; timeouts configured on the underlying transport
//! surface here as `TransportError::Timeout` and are propagated, never
//! retried: retrying a partially consumed response would leave the stream
//! position ambiguous.

use thiserror::Error;

use crate::types::Frame;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport timed out")]
    Timeout,

    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// The physical channel, as seen by the buffering engine.
pub trait ResponseChannel: Send {
    /// Begin the next server response on the channel. The statement itself is
    /// dispatched by the surrounding statement layer before this is called.
    fn start_response(&mut self) -> Result<(), TransportError>;

    /// Read and decode the next frame of the current response.
    ///
    /// After a `Frame::ResultBoundary { more_results: false }` the response is
    /// over; calling this again before `start_response` is a protocol error.
    fn next_frame(&mut self) -> Result<Frame, TransportError>;
}
