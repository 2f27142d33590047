//! Compile a declarative node schema (bases, leaves, discriminated unions)
//! into TypeScript declarations with navigation and dispatch helpers.
//!
//! ```text
//! serde_json::Value --load_spec--> Schema --Ir::build--> Ir --Codegen--> String
//! ```
pub mod codegen;
pub mod error;
pub mod ir;
pub mod path_de;
pub mod resolve;
pub mod schema;

pub use codegen::{generate, Codegen};
pub use error::{ErrorKind, GenerationError, ResolveError, SchemaError};
pub use ir::Ir;
pub use schema::{load_spec, Schema};
