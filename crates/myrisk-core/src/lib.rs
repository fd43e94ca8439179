//! # myrisk-core
//! Foundation types, policy constants and traits for the MyRisk engine.

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
