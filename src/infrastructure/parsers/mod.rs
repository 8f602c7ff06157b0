//! Manifest parsers for different ecosystems

pub mod go;
pub mod java;
pub mod npm;
pub mod php;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod traits;

pub use go::*;
pub use java::*;
pub use npm::NpmParser;
pub use php::*;
pub use python::*;
pub use ruby::*;
pub use rust::*;
pub use traits::*;
