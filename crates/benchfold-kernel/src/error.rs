//! Error types for kernel operations.

use crate::failure::PredicateError;
use crate::literal::CoercionError;
use crate::threshold::ThresholdError;
use crate::tree::TreeError;

/// Any kernel-level failure, for callers that attach their own context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BenchError {
    /// A literal does not fit the declared type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// A failure predicate could not be built.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    /// A threshold rule could not be built.
    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    /// The result tree could not be finalized.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
