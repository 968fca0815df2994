//! tabwire-cursor: the buffering engine's state machines.
//!
//! One physical channel serves one in-flight response at a time, while
//! application code may interleave several open cursors. This crate decides,
//! per cursor, whether rows come live off the channel or out of a staged
//! copy, and detaches the previous holder when a new statement needs the
//! channel:
//!
//! - `binding`: the per-cursor Live/Detached/Exhausted state machine.
//! - `strategy`: incremental vs. eager retrieval policies and the shared
//!   drain routines.
//! - `owner`: the single-holder gate for the physical channel.
//! - `connection` / `cursor`: the public execute/next_row/close surface,
//!   serialized through one per-connection lock.
//! - `script`: an in-memory `ResponseChannel` for tests.

pub mod binding;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod owner;
pub mod script;
pub mod strategy;

pub use connection::Connection;
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use script::{ScriptStep, ScriptedChannel};

pub use tabwire_core::config::{ConnectionConfig, CursorKind, RetrievalStrategy};
pub use tabwire_core::id::CursorId;
