//! Output formatting
//!
//! `text` prints the console report, `json` writes the machine-readable one.

pub mod json;
pub mod text;
