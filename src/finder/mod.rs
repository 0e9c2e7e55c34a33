mod fuzzy;

pub use fuzzy::fuzzy_match;
