//! Configuration for the rsqa harness
//!
//! Values resolve with precedence CLI > config file > environment > defaults.
//! Every resolved value remembers where it came from, see [`ConfigSource`].

mod config;

pub use config::*;
