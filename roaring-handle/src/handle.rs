use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::trace;

use crate::engine::Engine;
use crate::error::{Error, Result};

/// Exclusive ownership of one engine bitmap handle.
///
/// `release` frees the handle the first time it is called and is a no-op
/// afterwards; `Drop` goes through the same path, so the engine sees exactly
/// one free no matter how the owner goes away.
pub(crate) struct Handle<E: Engine> {
    raw: Option<NonNull<E::Raw>>,
    _engine: PhantomData<E>,
}

impl<E: Engine> Handle<E> {
    /// Take ownership of a handle returned by the engine.
    ///
    /// A null pointer means the engine could not allocate `what`.
    pub(crate) fn from_raw(raw: *mut E::Raw, what: &'static str) -> Result<Self> {
        let raw = NonNull::new(raw).ok_or(Error::Allocation(what))?;
        Ok(Self {
            raw: Some(raw),
            _engine: PhantomData,
        })
    }

    pub(crate) fn as_ptr(&self) -> *const E::Raw {
        self.raw.map_or(std::ptr::null(), |raw| raw.as_ptr().cast_const())
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut E::Raw {
        self.raw.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        self.raw.is_none()
    }

    /// Free the engine handle. Returns `true` if this call did the release.
    pub(crate) fn release(&mut self) -> bool {
        let Some(raw) = self.raw.take() else {
            return false;
        };
        trace!(bits = E::BITS, "releasing bitmap handle");
        unsafe { E::free(raw.as_ptr()) };
        true
    }
}

impl<E: Engine> Drop for Handle<E> {
    fn drop(&mut self) {
        self.release();
    }
}

// The handle is exclusively owned; the engine has no thread affinity.
unsafe impl<E: Engine> Send for Handle<E> {}
// Shared access only reaches read-only engine calls.
unsafe impl<E: Engine> Sync for Handle<E> {}
