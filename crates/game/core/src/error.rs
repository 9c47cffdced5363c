//! Common error infrastructure for game-core.
//!
//! Domain-specific errors (e.g. `ActivityError`, `PlanError`) are defined in
//! their respective modules alongside the operations they validate. This
//! module provides the shared severity classification used to decide whether
//! an error is handled locally or terminates the session.
//!
//! # Propagation
//!
//! - **Validation** and **Recoverable** errors are handled where they arise:
//!   an activity is rejected or cancelled, map generation retries.
//! - **Integrity** errors (bad templates, missing raws) are fatal at load.
//! - **Internal** errors signal a broken invariant and end the session.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with same or alternative input.
    ///
    /// Examples: disconnected map (retried with a new seed), destination blocked
    Recoverable,

    /// Validation error - invalid input, rejected without retry.
    ///
    /// Examples: activity target missing, item not in backpack
    Validation,

    /// Data integrity error - content failed to load or resolve.
    ///
    /// Examples: unknown palette, duplicate raw name, malformed placeholder
    Integrity,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: actor without `GridElement` asserted present
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Integrity => "integrity",
            Self::Internal => "internal",
        }
    }

    /// Returns true if the error is handled locally.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if the error must terminate the session.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Integrity | Self::Internal)
    }
}

/// Common trait for all game-core errors.
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for the error variant, useful for logs and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_and_recoverable_partition_severities() {
        for severity in [
            ErrorSeverity::Recoverable,
            ErrorSeverity::Validation,
            ErrorSeverity::Integrity,
            ErrorSeverity::Internal,
        ] {
            assert_ne!(severity.is_fatal(), severity.is_recoverable(), "{}", severity.as_str());
        }
        assert!(ErrorSeverity::Integrity.is_fatal());
        assert!(ErrorSeverity::Validation.is_recoverable());
    }
}
