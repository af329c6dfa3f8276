use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::trace;

use crate::engine::Engine;
use crate::error::{Error, Result};

/// A single-pass, forward-only cursor over a bitmap's values.
///
/// Values come out in ascending order. The cursor borrows its source, so the
/// bitmap cannot be mutated or freed while the cursor is alive. It cannot be
/// rewound: [`reset`](Cursor::reset) always fails.
///
/// Besides the [`Iterator`] interface, the cursor exposes an explicit
/// [`move_next`](Cursor::move_next)/[`current`](Cursor::current) protocol in
/// which the first `move_next` reports whether the bitmap has any value.
pub struct Cursor<'a, E: Engine> {
    raw: Option<NonNull<E::RawCursor>>,
    started: bool,
    exhausted: bool,
    _source: PhantomData<&'a E::Raw>,
}

impl<'a, E: Engine> Cursor<'a, E> {
    /// # Safety
    ///
    /// `source` must stay alive and unmodified for `'a`.
    pub(crate) unsafe fn new(source: *const E::Raw) -> Result<Self> {
        let raw = NonNull::new(unsafe { E::cursor_create(source) })
            .ok_or(Error::Allocation("cursor"))?;
        Ok(Self {
            raw: Some(raw),
            started: false,
            exhausted: false,
            _source: PhantomData,
        })
    }

    fn live(&self) -> Result<NonNull<E::RawCursor>> {
        self.raw.ok_or(Error::Disposed { resource: "cursor" })
    }

    /// Advance to the next value, returning whether there is one.
    ///
    /// The first call positions the cursor on the smallest value.
    pub fn move_next(&mut self) -> Result<bool> {
        let raw = self.live()?;
        if self.exhausted {
            return Ok(false);
        }

        let has_value = if self.started {
            unsafe { E::cursor_advance(raw.as_ptr()) }
        } else {
            self.started = true;
            unsafe { E::cursor_has_value(raw.as_ptr()) }
        };

        self.exhausted = !has_value;
        Ok(has_value)
    }

    /// The value under the cursor.
    ///
    /// `None` before the first [`move_next`](Cursor::move_next) and after the
    /// last value.
    pub fn current(&self) -> Result<Option<E::Value>> {
        let raw = self.live()?;
        if !self.started || self.exhausted {
            return Ok(None);
        }
        Ok(Some(unsafe { E::cursor_value(raw.as_ptr()) }))
    }

    /// Cursors are forward-only.
    pub fn reset(&mut self) -> Result<()> {
        Err(Error::Unsupported("resetting a forward-only cursor"))
    }

    pub fn is_released(&self) -> bool {
        self.raw.is_none()
    }

    /// Free the engine cursor. Idempotent.
    pub fn release(&mut self) {
        if let Some(raw) = self.raw.take() {
            trace!(bits = E::BITS, "releasing cursor");
            unsafe { E::cursor_free(raw.as_ptr()) };
        }
    }
}

impl<E: Engine> Iterator for Cursor<'_, E> {
    type Item = E::Value;

    fn next(&mut self) -> Option<E::Value> {
        match self.move_next() {
            Ok(true) => self.current().ok().flatten(),
            _ => None,
        }
    }
}

impl<E: Engine> FusedIterator for Cursor<'_, E> {}

impl<E: Engine> Drop for Cursor<'_, E> {
    fn drop(&mut self) {
        self.release();
    }
}
