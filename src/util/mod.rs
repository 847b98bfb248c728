//! Utility types and functions

pub mod check;
pub mod config;
pub mod logger;
pub mod span;
