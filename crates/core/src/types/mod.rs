//! Core types for the wholesale registration proxy.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the proxy and the CLI.

pub mod email;
pub mod id;
pub mod merge;
pub mod registrant;

pub use email::normalize_email;
pub use id::*;
pub use merge::{merge_phone, union_tags};
pub use registrant::{CompanyAddress, Registrant};
