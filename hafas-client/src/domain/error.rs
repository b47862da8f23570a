//! Domain error types.
//!
//! These errors represent validation failures when constructing domain
//! values. They are distinct from protocol and transport errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Latitude or longitude is not a finite number in range
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(&'static str),

    /// A station or stop was given an empty identifier
    #[error("{0} must have a non-empty identifier")]
    MissingIdentifier(&'static str),

    /// Journey has no legs
    #[error("journey must have at least one leg")]
    EmptyJourney,
}
