use thiserror::Error;

/// Result type local to tabwire-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("staging ceiling exceeded for tag '{tag}': requested {requested} bytes, ceiling {ceiling}, reserved {reserved}")]
    CapacityExceeded {
        tag: &'static str,
        requested: usize,
        ceiling: usize,
        reserved: usize,
    },
}
