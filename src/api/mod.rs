//! The native surface scripts call into.
//!
//! Each script-visible class is a static table of `(signature, handler)`
//! pairs. A handler receives the host and the call's [`CallSlots`], checks
//! its arguments, and either leaves a result in slot 0 or returns an
//! [`ApiError`] that aborts the calling script.

mod check;
mod error;
mod foreign;
mod registry;
mod slots;
mod value;

mod file;
mod font;
mod program;
mod renderer;

pub use error::{ApiError, ApiResult};
pub use foreign::ForeignHandle;
pub use registry::{ApiClass, Dispatcher, ForeignMethodFn, Signature, SignatureKind};
pub use slots::CallSlots;
pub use value::Value;

#[cfg(test)]
pub use foreign::{Resource, finalize_resource};
#[cfg(test)]
pub use value::SlotType;

/// Module name the native classes are registered under
pub const MODULE: &str = "api";

pub static CLASSES: [ApiClass; 4] = [program::CLASS, renderer::CLASS, font::CLASS, file::CLASS];

/// Dispatcher over the built-in classes
pub fn dispatcher() -> Dispatcher {
    Dispatcher::new(MODULE, &CLASSES)
}
