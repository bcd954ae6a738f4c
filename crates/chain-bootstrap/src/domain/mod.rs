//! # Domain Module
//!
//! Declaration model, structured documents, value objects and errors.

pub mod document;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use document::{Document, Scalar, Value};
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
