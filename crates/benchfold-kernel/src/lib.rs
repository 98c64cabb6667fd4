//! # benchfold kernel
//!
//! The data model every other benchfold crate speaks: a typed result tree
//! whose nodes carry stable, path-derived identities, plus the two kinds of
//! judgement applied to values.
//!
//! This crate is **syntax-agnostic**: it does not know how schemas or
//! content documents are written. It only prescribes what an interpreted
//! result looks like and how a single value is judged.
//!
//! ## Architecture
//!
//! ```text
//! Literal / ValueKind   ← raw typed values and coercion
//!     │
//! StableHash / NamePath ← identity from the dotted name path
//!     │
//! NodeBuilder           ← provisional per-document tree
//!     │
//! ResultTree            ← finalized arena, classes settled
//!     │
//! FailureSet            ← predicates: did this value fail outright?
//! ThresholdRule         ← rules: did it drift from its history?
//!     │
//! VerdictReport         ← per-value outcome of one build
//! ```

pub mod catalog;
pub mod error;
pub mod failure;
pub mod identity;
pub mod literal;
pub mod threshold;
pub mod tree;
pub mod verdict;

pub use catalog::{ExtraThreshold, ThresholdCatalog};
pub use error::BenchError;
pub use failure::{Comparator, FailurePredicate, FailureSet, PredicateError};
pub use identity::{NamePath, StableHash};
pub use literal::{CoercionError, Literal, ValueKind};
pub use threshold::{
    Basis, ThresholdError, ThresholdMethod, ThresholdRule, ThresholdSpec, Violation,
};
pub use tree::{
    BuildNumber, CURRENT_BUILD, GroupClass, Node, NodeBuilder, NodeId, Property, ResultTree,
    TreeBuilder, TreeError, ValueData, ValueRole,
};
pub use verdict::{Outcome, Verdict, VerdictReport};
