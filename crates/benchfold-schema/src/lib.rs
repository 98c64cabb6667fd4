//! Schemas and schema-driven interpretation.
//!
//! A [`Schema`] is loaded once from JSON or XML and then drives
//! interpretation of content documents in either syntax into a
//! [`benchfold_kernel::ResultTree`].

pub mod batch;
pub mod content;
pub mod interpret;
pub mod json;
pub mod role;
pub mod schema;
pub mod source;
pub mod xml;

pub use batch::{
    BatchError, Interpretation, SourceDocument, interpret, interpret_build, interpret_document,
};
pub use content::ContentNode;
pub use interpret::{InterpretError, InterpretOptions, Interpreter};
pub use role::{AttributeRole, Role, ThresholdParameter, ValueSource};
pub use schema::{Schema, SchemaError, SchemaFormat, Scope};
pub use source::{
    ContentProvider, DirectoryProvider, MemoryProvider, ProviderError, SchemaFile, SchemaProvider,
};
