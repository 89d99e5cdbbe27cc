//! Error types for propbind.
//!
//! Every failure is raised at bind time; an installed binding performs no
//! further validation. Null arguments, which the binding contract also
//! forbids, are unrepresentable in this API and therefore have no error
//! variant.

use std::fmt;

/// Errors raised while constructing a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The expression is not a usable (possibly negated) property reference
    /// for the position it was passed in: a negated source, a source without
    /// a getter, or a target without a setter.
    InvalidExpression {
        /// Why the expression was rejected.
        reason: &'static str,
    },
    /// The non-nullable base types of the source and target properties
    /// differ. The four nullability pairings of one base type are all legal;
    /// different base types never are.
    IncompatibleTypes {
        /// The source property's base type name.
        source: &'static str,
        /// The target property's base type name.
        target: &'static str,
    },
    /// A negated target was requested for a non-boolean source property.
    InvalidNegation {
        /// The source property's base type name.
        source: &'static str,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidExpression { reason } => {
                write!(f, "Invalid binding expression: {reason}")
            }
            Self::IncompatibleTypes { source, target } => {
                write!(
                    f,
                    "Source and target property types must share a base type: {source} vs {target}"
                )
            }
            Self::InvalidNegation { source } => {
                write!(f, "A negated target requires a boolean source property, got {source}")
            }
        }
    }
}

impl std::error::Error for BindError {}

/// A specialized Result type for binding operations.
pub type Result<T> = std::result::Result<T, BindError>;
