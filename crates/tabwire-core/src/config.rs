//! Connection configuration that the surrounding driver can serialize or
//! populate from the environment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How aggressively a cursor's response is pulled off the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    /// Pull one packet's worth of rows per caller demand while live.
    Incremental,
    /// Materialize the entire response into staging at execution time.
    Eager,
}

impl std::str::FromStr for RetrievalStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(RetrievalStrategy::Incremental),
            "eager" => Ok(RetrievalStrategy::Eager),
            other => Err(Error::Config(format!(
                "unknown buffering strategy '{other}' (expected 'incremental' or 'eager')"
            ))),
        }
    }
}

/// Result-set navigability requested by the statement layer.
///
/// Scrollable kinds need random positional access, which requires the whole
/// result set in memory; they are always materialized eagerly no matter what
/// `RetrievalStrategy` the connection is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

impl CursorKind {
    pub fn is_scrollable(self) -> bool {
        matches!(
            self,
            CursorKind::ScrollInsensitive | CursorKind::ScrollSensitive
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hard ceiling (in bytes) on staged response data held for this
    /// connection. Buffering must *never* exceed this.
    pub max_buffer_bytes: usize,

    /// Default retrieval strategy for statements on this connection.
    pub buffering: RetrievalStrategy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 512 * 1024 * 1024, // 512 MiB default
            buffering: RetrievalStrategy::Incremental,
        }
    }
}

impl ConnectionConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABWIRE_MAX_BUFFER_BYTES`: staging ceiling, plain bytes or with a
    ///   `k`/`m`/`g` suffix (e.g. `10k`)
    /// - `TABWIRE_RESPONSE_BUFFERING`: `incremental` or `eager`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABWIRE_MAX_BUFFER_BYTES") {
            if let Ok(v) = parse_buffer_size(&s) {
                cfg.max_buffer_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("TABWIRE_RESPONSE_BUFFERING") {
            if let Ok(v) = s.parse::<RetrievalStrategy>() {
                cfg.buffering = v;
            }
        }

        cfg
    }

    /// Set the ceiling from the human-readable size syntax (`"10k"`, `"200m"`).
    pub fn set_max_buffer(&mut self, size: &str) -> Result<()> {
        self.max_buffer_bytes = parse_buffer_size(size)?;
        Ok(())
    }
}

/// Parse a byte count with an optional `k`/`m`/`g`/`t` suffix
/// (case-insensitive). Suffixes are decimal: `"10k"` is 10_000 bytes.
pub fn parse_buffer_size(s: &str) -> Result<usize> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::Config("empty buffer size".to_string()));
    }

    let (digits, multiplier) = match s.as_bytes()[s.len() - 1].to_ascii_lowercase() {
        b'k' => (&s[..s.len() - 1], 1_000usize),
        b'm' => (&s[..s.len() - 1], 1_000_000),
        b'g' => (&s[..s.len() - 1], 1_000_000_000),
        b't' => (&s[..s.len() - 1], 1_000_000_000_000),
        _ => (s, 1),
    };

    let value: usize = digits
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid buffer size '{s}'")))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::Config(format!("buffer size '{s}' overflows usize")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_suffixed_sizes() {
        assert_eq!(parse_buffer_size("10000").unwrap(), 10_000);
        // Decimal suffixes: "10k" is exactly 10_000 bytes, not 10 KiB.
        assert_eq!(parse_buffer_size("10k").unwrap(), 10_000);
        assert_eq!(parse_buffer_size("2M").unwrap(), 2_000_000);
        assert_eq!(parse_buffer_size("1g").unwrap(), 1_000_000_000);
        assert!(parse_buffer_size("ten").is_err());
        assert!(parse_buffer_size("").is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut cfg = ConnectionConfig::default();
        cfg.set_max_buffer("10k").unwrap();
        cfg.buffering = RetrievalStrategy::Eager;

        let json = serde_json::to_string(&cfg).unwrap();
        let back: ConnectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_buffer_bytes, 10_000);
        assert_eq!(back.buffering, RetrievalStrategy::Eager);
    }
}
