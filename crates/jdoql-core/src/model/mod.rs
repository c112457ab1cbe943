//! Runtime class metadata.
//!
//! Persistable types describe themselves through a static `ClassModel`;
//! queries, the evaluator and the callback registry read inheritance and
//! field shapes from it rather than from the Rust type.
pub mod class;
pub mod field;

// re-exports
pub use class::{ClassModel, Lineage};
pub use field::FieldModel;

#[cfg(test)]
mod tests;
