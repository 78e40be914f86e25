// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! precache command line.
//!
//! Parses the artifact toggles, loads configuration and runs the fetch
//! against a [`precache_cache::DiskCache`]. The binary in `main.rs` only adds
//! process setup and exit codes on top of this library.

/// CLI argument parsing, error rendering and exit codes.
pub mod cli;
/// Command implementations.
pub mod commands;
/// Configuration file and environment overrides.
pub mod config;
/// Tracing setup.
pub mod tracing;
