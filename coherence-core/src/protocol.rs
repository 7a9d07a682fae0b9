//! Coherence protocol selection.

use std::fmt;
use std::str::FromStr;

/// Which coherence protocol a run uses.
///
/// `Protocol::None` is not a protocol at all — it is what an
/// unrecognized CLI argument falls through to, and a system built with
/// it simply does not run (see [`FromStr`] below). MOESI appears in the
/// upstream enum this simulator was distilled from but no MOESI-specific
/// transitions were ever implemented there, so it is deliberately absent
/// here rather than half-modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Invalidation-based protocol: writer evicts peer copies.
    Mesi,
    /// Update-based protocol: writer ships the word to peers.
    Dragon,
    /// Not a real protocol; selecting it means "do not run".
    None,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Mesi => "MESI",
            Protocol::Dragon => "DRAGON",
            Protocol::None => "NONE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Protocol {
    type Err = std::convert::Infallible;

    /// Parses a protocol name. Anything other than exactly `"MESI"` or
    /// `"DRAGON"` yields `Protocol::None` rather than an error — per the
    /// CLI contract, an unrecognized protocol is a configuration no-op,
    /// not a failure.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "MESI" => Protocol::Mesi,
            "DRAGON" => Protocol::Dragon,
            _ => Protocol::None,
        })
    }
}
