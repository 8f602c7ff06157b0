//! Domain Layer - Core analysis concepts
//!
//! Dependencies, registry outcomes, vulnerability records and the risk
//! report they reduce into. Nothing in this layer performs I/O.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use services::*;
pub use value_objects::*;
