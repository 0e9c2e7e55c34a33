//! Lifecycle of natively backed script objects.
//!
//! A foreign object is created by its class's `allocate` hook and handed to
//! the script as a [`ForeignHandle`]. The native resource inside sits in a
//! [`Resource`], which is the only way handlers can reach it: once released
//! (explicit close or finalize) every access fails with an error instead of
//! touching freed state.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::error::{ApiError, ApiResult};
use super::slots::CallSlots;
use crate::host::HostContext;

/// Release hook run when the last script reference to an object goes away.
/// Must not fail: there is nobody to report to.
pub type FinalizeFn = fn(&mut dyn Any);

/// Builds the native state for a new object from the constructor's slots
pub type AllocateFn = fn(&mut HostContext, &mut CallSlots) -> ApiResult<Box<dyn Any>>;

#[derive(Clone, Copy)]
pub struct ForeignClassMethods {
    /// Constructor signature, e.g. `load(_,_)`
    pub constructor: &'static str,
    pub allocate: AllocateFn,
    pub finalize: FinalizeFn,
}

impl ForeignClassMethods {
    /// Run the allocator and wrap its result. If allocation fails no handle
    /// exists, so the script never sees a half-built object.
    pub fn construct(
        &self,
        class: &'static str,
        host: &mut HostContext,
        slots: &mut CallSlots,
    ) -> ApiResult<ForeignHandle> {
        let data = (self.allocate)(host, slots)?;
        log::trace!("allocated foreign {class}");
        Ok(ForeignHandle::from_boxed(class, data, self.finalize))
    }
}

impl fmt::Debug for ForeignClassMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignClassMethods")
            .field("constructor", &self.constructor)
            .finish_non_exhaustive()
    }
}

struct ForeignObject {
    class: &'static str,
    data: RefCell<Box<dyn Any>>,
    finalize: FinalizeFn,
}

impl Drop for ForeignObject {
    fn drop(&mut self) {
        log::trace!("finalizing foreign {}", self.class);
        (self.finalize)(&mut **self.data.get_mut());
    }
}

/// Script-visible reference to a foreign object. Cloning shares the object.
#[derive(Clone)]
pub struct ForeignHandle(Rc<ForeignObject>);

impl ForeignHandle {
    pub fn new<T: Any>(class: &'static str, data: T, finalize: FinalizeFn) -> Self {
        Self::from_boxed(class, Box::new(data), finalize)
    }

    pub fn from_boxed(class: &'static str, data: Box<dyn Any>, finalize: FinalizeFn) -> Self {
        Self(Rc::new(ForeignObject {
            class,
            data: RefCell::new(data),
            finalize,
        }))
    }

    pub fn class(&self) -> &'static str {
        self.0.class
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the resource of a `class` object, failing if it was released.
    pub fn with_open<T: Any, R>(
        &self,
        class: &'static str,
        action: &'static str,
        f: impl FnOnce(&mut T) -> ApiResult<R>,
    ) -> ApiResult<R> {
        self.with_resource(class, |res: &mut Resource<T>| f(res.get(class, action)?))
    }

    /// Borrow the resource wrapper itself, open or not
    pub fn with_resource<T: Any, R>(
        &self,
        class: &'static str,
        f: impl FnOnce(&mut Resource<T>) -> ApiResult<R>,
    ) -> ApiResult<R> {
        let wrong_class = || ApiError::WrongClass {
            expected: class,
            got: self.0.class,
        };
        if self.0.class != class {
            return Err(wrong_class());
        }
        let mut data = self
            .0
            .data
            .try_borrow_mut()
            .map_err(|_| ApiError::Busy(self.0.class))?;
        let resource = (**data)
            .downcast_mut::<Resource<T>>()
            .ok_or_else(wrong_class)?;
        f(resource)
    }
}

impl fmt::Debug for ForeignHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignHandle({})", self.0.class)
    }
}

/// Owned, nullable native resource with a single is-open guard
#[derive(Debug)]
pub struct Resource<T> {
    inner: Option<T>,
}

impl<T> Resource<T> {
    pub fn open(value: T) -> Self {
        Self { inner: Some(value) }
    }

    pub fn get(&mut self, class: &'static str, action: &'static str) -> ApiResult<&mut T> {
        self.inner
            .as_mut()
            .ok_or(ApiError::Closed { action, class })
    }

    /// Release the resource, handing it back for any final work.
    /// A second close is an error, never a double release.
    pub fn close(&mut self, class: &'static str) -> ApiResult<T> {
        self.inner.take().ok_or(ApiError::AlreadyClosed(class))
    }

    /// Release if still open. Returns whether anything was released.
    pub fn finalize(&mut self) -> bool {
        self.inner.take().is_some()
    }
}

/// Generic finalizer for classes whose data is a `Resource<T>`
pub fn finalize_resource<T: 'static>(data: &mut dyn Any) {
    if let Some(resource) = data.downcast_mut::<Resource<T>>() {
        resource.finalize();
    }
}
