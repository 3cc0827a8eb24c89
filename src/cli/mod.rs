//! Command-line interface for the overlay

pub mod commands;

pub use commands::*;
