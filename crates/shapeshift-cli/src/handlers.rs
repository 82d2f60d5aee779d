//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

pub mod completions;
pub mod convert;
pub mod describe;
pub mod utils;

pub use completions::handle_completions;
pub use convert::handle_convert;
pub use describe::handle_describe;
