//! Wholesale Core - Shared types library.
//!
//! This crate provides the types shared by the wholesale registration
//! components:
//! - `proxy` - App proxy service that runs the registration workflow
//! - `cli` - Command-line tools for migrations, sessions and one-off registrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure merge rules - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Remote ids, emails, the registrant submission and merge rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
