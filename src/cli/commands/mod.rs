//! CLI command implementations

pub mod company;
pub mod completions;
pub mod config;
pub mod data_element;
pub mod exec_order;
pub mod library;
pub mod rule;
pub mod scan;
