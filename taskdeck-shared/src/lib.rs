//! # Taskdeck Shared Library
//!
//! This crate contains the wire-level data types shared by every component
//! that speaks the Taskdeck REST API: the client library, test harnesses,
//! and any future tooling.
//!
//! ## Module Organization
//!
//! - `models`: API records and the request payloads derived from them

pub mod models;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
