//! Abstract byte-accounting interfaces.
//!
//! The concrete implementation lives in `tabwire-mem`. We keep only traits
//! here so any crate can depend on the API without pulling in the allocator.

/// A guard returned by the ledger when bytes are reserved.
///
/// The concrete type lives in `tabwire-mem`. It must be RAII (releases on
/// Drop), `Send`, and panic-safe.
pub trait LedgerGuard: Send {
    /// Number of bytes currently accounted for by this guard.
    fn bytes(&self) -> usize;
    /// Optional debug tag for metrics/tracing.
    fn tag(&self) -> &'static str {
        "staged"
    }
}

/// A handle representing one connection's staging-byte ceiling.
///
/// Implemented by `tabwire-mem`. Buffering code calls `try_reserve` before
/// holding row data in memory. If `None` is returned, the operation that
/// needed the bytes must fail; there is no spill path.
pub trait ByteLedger: Send + Sync + 'static {
    type Guard: LedgerGuard;

    /// Attempt to reserve `bytes` under the ceiling. Returns a guard on success.
    fn try_reserve(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard>;

    /// Configured ceiling (bytes).
    fn ceiling_bytes(&self) -> usize;

    /// Approximate currently reserved bytes (advisory; not a correctness API).
    fn reserved_bytes(&self) -> usize;
}

// NOTE: Do *not* add default impls here that would silently admit bytes.
// The mem crate is the only place where guards should be constructed.
