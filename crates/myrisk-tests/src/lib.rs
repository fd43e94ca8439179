//! Integration and property test suite for the MyRisk engine.
//!
//! The tests under `tests/` exercise the public engine surface end to end:
//! determinism, boundedness, fallback policies, monotonicity under outlier
//! injection and the provider screening scenario.

pub mod helpers;
