//! # Formats Module
//!
//! Serialization formats for data that leaves the process.
//! Store and file I/O live elsewhere; these are pure byte transformations.

mod persistence;

pub use persistence::*;
