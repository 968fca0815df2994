#![forbid(unsafe_code)]
//! tabwire-mem: byte accounting and staging buffers.
//!
//! This crate provides concrete implementations for the *interfaces* defined
//! in `tabwire-core::ledger`. All staged response data on a connection must
//! flow through this crate so the configured ceiling is enforced with RAII
//! guards: a reservation and the memory it covers are one logical step, and
//! dropping the guard returns the bytes even on a panic.
//!
//! No transport or cursor logic lives here.

pub mod accountant;
pub mod error;
pub mod staging;

pub use accountant::{ByteAccountant, Reservation};
pub use error::{Error, Result};
pub use staging::{Staged, StagingBuffer};
