//! Output formatting helpers.

pub mod tables;

pub use tables::{format_call, print_separator, truncate_string};
