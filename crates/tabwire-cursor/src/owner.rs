//! Single-holder gate for the physical channel.
//!
//! Exactly one cursor may read live from the channel at any instant; this is
//! the invariant that makes detachment necessary at all. The owner only
//! tracks who holds the channel; the handover itself (detaching the previous
//! holder) is orchestrated by `connection`.

use tabwire_core::id::CursorId;

#[derive(Debug, Default)]
pub struct ChannelOwner {
    holder: Option<CursorId>,
}

impl ChannelOwner {
    pub fn new() -> Self {
        Self { holder: None }
    }

    pub fn holder(&self) -> Option<CursorId> {
        self.holder
    }

    /// Bind the channel to `id`. Granting while held is a programming fault.
    pub fn grant(&mut self, id: CursorId) {
        debug_assert!(self.holder.is_none(), "channel granted while held by {:?}", self.holder);
        self.holder = Some(id);
    }

    /// Release the channel from `id`. Releasing on another cursor's behalf is
    /// a programming fault.
    pub fn release(&mut self, id: CursorId) {
        debug_assert_eq!(self.holder, Some(id), "channel released by non-holder");
        if self.holder == Some(id) {
            self.holder = None;
        }
    }

    pub fn clear(&mut self) {
        self.holder = None;
    }
}
