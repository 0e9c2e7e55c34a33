//! Host settings: defaults, then `~/.config/plume/config.json`, then
//! `PLUME_*` environment overrides.

mod settings;

pub use settings::{ConfigError, Settings};
