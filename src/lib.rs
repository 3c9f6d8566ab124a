//! tagscope: tag-management property inspector
//!
//! Read-only analysis over a tag-management service: which data elements a
//! rule uses, which rules use a data element, and the order a property's
//! rules fire in.

pub mod analysis;
pub mod api;
pub mod cli;
pub mod core;
pub mod entities;
