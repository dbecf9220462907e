//! Linear interpolation between sparse authoritative counts.

/// Interpolate a count at `target_t` on the line through
/// `(start_t, start_val)` and `(end_t, end_val)`.
///
/// Times are real-valued seconds; counts stay integral. The result is
/// rounded half to even, matching the behavior of the tool that produced
/// the historical table. Equal endpoint times (duplicate timestamps in
/// the series) degenerate to `start_val` rather than dividing by zero.
pub fn interpolate_linear(
    start_val: u64,
    end_val: u64,
    start_t: f64,
    end_t: f64,
    target_t: f64,
) -> u64 {
    if start_t == end_t {
        return start_val;
    }

    let ratio = (target_t - start_t) / (end_t - start_t);
    let value = start_val as f64 + (end_val as f64 - start_val as f64) * ratio;
    let rounded = value.round_ties_even();
    if rounded <= 0.0 {
        0
    } else {
        rounded as u64
    }
}
