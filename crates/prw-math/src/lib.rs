//! PR Watch numeric policy primitives.
//!
//! Pure functions with no I/O: sparse sample-index selection, linear
//! interpolation over timestamped counts, and the ordering clamp that
//! repairs inconsistent counter triples.

pub mod clamp;
pub mod interp;
pub mod sample;

pub use clamp::clamp_triple;
pub use interp::interpolate_linear;
pub use sample::{select_samples, DEFAULT_STRIDE};
