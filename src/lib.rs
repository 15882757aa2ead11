//! micro's extensible command line: global flags, built-in and plugin
//! commands, a startup hook chain, and delegation of unknown commands to
//! programs on `PATH`.

pub mod cli;
pub mod command;
pub mod error;
pub mod internal;
pub mod utils;

pub use error::{MicroError, Result};
