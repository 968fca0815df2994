//! ByteAccountant + RAII reservation guards.
//!
//! Downstream code must *always* hold a `Reservation` covering any staged
//! bytes it keeps. Dropping the reservation returns the bytes to the
//! accountant (panic-safe).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tabwire_core::ledger::{ByteLedger, LedgerGuard};

use crate::error::{Error, Result};

/// Shared inner state for one connection's ledger.
struct AccountantInner {
    ceiling: usize,
    reserved: AtomicUsize,
    peak: AtomicUsize,
}

impl AccountantInner {
    fn new(ceiling: usize) -> Self {
        Self {
            ceiling,
            reserved: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn try_reserve(&self, bytes: usize) -> bool {
        loop {
            let cur = self.reserved.load(Ordering::Relaxed);
            let next = cur.saturating_add(bytes);
            if next > self.ceiling {
                return false;
            }
            if self
                .reserved
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                self.record_peak(next);
                return true;
            }
        }
    }

    /// Record a new "reserved bytes" value; updates the high-water mark if
    /// higher.
    fn record_peak(&self, reserved_bytes: usize) {
        let mut cur = self.peak.load(Ordering::Relaxed);
        while reserved_bytes > cur {
            match self.peak.compare_exchange(
                cur,
                reserved_bytes,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            reserved_bytes,
            peak = self.peak.load(Ordering::Relaxed),
            "staging usage"
        );
    }

    fn release(&self, bytes: usize) {
        let prev = self.reserved.fetch_sub(bytes, Ordering::AcqRel);
        // Releasing more than was reserved is a bug in this crate, not a
        // recoverable condition.
        debug_assert!(prev >= bytes, "ledger underflow: released {bytes}, held {prev}");
    }
}

/// Per-connection byte ledger with a fixed ceiling.
///
/// Cheap to clone; all clones share one counter.
#[derive(Clone)]
pub struct ByteAccountant {
    inner: Arc<AccountantInner>,
}

impl ByteAccountant {
    pub fn new(ceiling_bytes: usize) -> Self {
        Self {
            inner: Arc::new(AccountantInner::new(ceiling_bytes)),
        }
    }

    /// Currently reserved bytes (advisory).
    pub fn reserved_bytes(&self) -> usize {
        self.inner.reserved.load(Ordering::Relaxed)
    }

    pub fn ceiling_bytes(&self) -> usize {
        self.inner.ceiling
    }

    /// Highest reservation level observed so far.
    pub fn peak_bytes(&self) -> usize {
        self.inner.peak.load(Ordering::Relaxed)
    }

    /// Reserve `bytes` under the ceiling, or fail with `CapacityExceeded`
    /// leaving the counter untouched.
    pub fn reserve(&self, bytes: usize, tag: &'static str) -> Result<Reservation> {
        self.try_reserve(bytes, tag)
            .ok_or_else(|| self.capacity_error(bytes, tag))
    }

    /// An empty reservation to grow later; touches no counters.
    pub fn empty_reservation(&self, tag: &'static str) -> Reservation {
        Reservation {
            inner: Arc::clone(&self.inner),
            bytes: 0,
            tag,
        }
    }

    pub(crate) fn capacity_error(&self, requested: usize, tag: &'static str) -> Error {
        Error::CapacityExceeded {
            tag,
            requested,
            ceiling: self.ceiling_bytes(),
            reserved: self.reserved_bytes(),
        }
    }
}

/// RAII guard accounting for a number of staged bytes.
/// Dropping it returns the bytes to the accountant.
pub struct Reservation {
    inner: Arc<AccountantInner>,
    bytes: usize,
    tag: &'static str,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.inner.release(self.bytes);
            // NOTE: do not log here to keep the drop path fast.
            self.bytes = 0;
        }
    }
}

impl Reservation {
    /// Grow this reservation by `delta` bytes, ceiling-checked.
    pub fn grow(&mut self, delta: usize) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        if self.inner.try_reserve(delta) {
            self.bytes += delta;
            Ok(())
        } else {
            Err(Error::CapacityExceeded {
                tag: self.tag,
                requested: delta,
                ceiling: self.inner.ceiling,
                reserved: self.inner.reserved.load(Ordering::Relaxed),
            })
        }
    }

    /// Shrink this reservation by `delta` bytes. Never fails; shrinking below
    /// zero is a programming fault.
    pub fn shrink(&mut self, delta: usize) {
        debug_assert!(
            delta <= self.bytes,
            "reservation underflow: shrink {delta}, held {}",
            self.bytes
        );
        let delta = delta.min(self.bytes);
        if delta > 0 {
            self.inner.release(delta);
            self.bytes -= delta;
        }
    }
}

// ----- trait impls -----

impl LedgerGuard for Reservation {
    fn bytes(&self) -> usize {
        self.bytes
    }
    fn tag(&self) -> &'static str {
        self.tag
    }
}

impl ByteLedger for ByteAccountant {
    type Guard = Reservation;

    fn try_reserve(&self, bytes: usize, tag: &'static str) -> Option<Reservation> {
        if bytes == 0 {
            return Some(Reservation {
                inner: Arc::clone(&self.inner),
                bytes: 0,
                tag,
            });
        }
        if self.inner.try_reserve(bytes) {
            Some(Reservation {
                inner: Arc::clone(&self.inner),
                bytes,
                tag,
            })
        } else {
            None
        }
    }

    fn ceiling_bytes(&self) -> usize {
        self.inner.ceiling
    }

    fn reserved_bytes(&self) -> usize {
        self.inner.reserved.load(Ordering::Relaxed)
    }
}
