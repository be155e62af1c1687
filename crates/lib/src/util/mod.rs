//! Shared utilities.
//!
//! Output tree hashing and small filesystem helpers.

pub mod fs;
pub mod hash;
