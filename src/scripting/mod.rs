//! Rhai runtime the native API is exposed to.
//!
//! Classes appear as static modules (`Program::get_time()`,
//! `File::load(path, "r")`), objects they create carry their methods
//! (`file.read_line()`), and `import "name"` resolves through the loader.

mod bind;
mod convert;
mod engine;
mod error;
mod resolver;

pub use engine::ScriptEngine;
