//! Error types for the MyRisk engine.
//!
//! The engine never fails on awkward numbers (empty input, zero variance,
//! tiny samples); those follow documented fallback policies. Only contract
//! violations by the caller surface as errors.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid input in {field}: {reason}")] InvalidInput { field: String, reason: String },
}

impl InputError {
    /// Build an [`InputError::InvalidInput`] for `field`.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into(), reason: reason.into() }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidInput { field, .. } => field,
        }
    }
}
