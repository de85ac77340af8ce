//! Debounced free-text entity search.

mod controller;

pub use controller::{SearchController, SearchSnapshot, SearchStatus};
