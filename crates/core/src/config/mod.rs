//! Configuration loading and schema definitions
//!
//! Engine configuration shared by the library crates and the CLI.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
