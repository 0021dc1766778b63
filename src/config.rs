//! Settings for the engine, the library scanner and startup behavior.
//!
//! Values come from struct defaults, an optional TOML file and `ENCORE__*`
//! environment variables, in increasing order of precedence.

mod load;
mod schema;

pub use schema::*;
