//! Analysis stages.
//!
//! Derivation, aggregation and selection over a loaded table. Each stage
//! is a function from explicit inputs to explicit outputs.

pub mod aggregator;
pub mod derive;
pub mod selector;

pub use aggregator::*;
pub use derive::*;
pub use selector::*;
