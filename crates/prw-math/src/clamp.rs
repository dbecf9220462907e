//! Ordering repair for counter triples.
//!
//! Query timing skew can hand back triples violating
//! `merged <= nondraft <= total` (each counter is a separate upstream
//! query, so the three can observe different moments). The repair rule
//! clamps the middle counter into the band implied by the other two.

/// Clamp `nondraft` into `[merged, total]`.
///
/// Pure and idempotent. When the band itself is inverted
/// (`merged > total`), `merged` wins, mirroring how the historical data
/// was repaired.
pub fn clamp_triple(total: u64, merged: u64, nondraft: u64) -> u64 {
    merged.max(nondraft.min(total))
}
