//! Quoting engine for custom keyways, disc springs and T-slot nuts.

pub mod catalog;
pub mod config;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod store;
pub mod utils;

/// Sentinel for an optional treatment that was not selected.
pub const NONE_OPTION: &str = "none";

/// Whether an optional field carries a real choice.
pub fn is_selected(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case(NONE_OPTION)
}
