//! WCPS command line library.
//!
//! Loads a coverage catalog from YAML and runs the compiler or the WCS
//! response assembly against it.

pub mod catalog;
pub mod commands;
pub mod config;
