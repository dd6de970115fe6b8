//! Filter rules and the rule file loader.
//!
//! A rule describes one configured check: which messages to look for
//! (sender and subject patterns within a lookback window) and whether
//! finding them, or not finding them, is a problem.

mod model;
mod source;

pub use model::Rule;
pub use source::{load_rules, parse_rules};
