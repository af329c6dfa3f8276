use tracing::trace;

use crate::bitmap::Bitmap;
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Batched point insertion into one bitmap.
///
/// The engine context remembers the container touched by the previous
/// insertion, so runs of nearby values skip the container lookup. The context
/// borrows its bitmap mutably: nothing else can touch the bitmap until the
/// context is dropped.
pub struct BulkContext<'a, E: Engine> {
    bitmap: &'a mut Bitmap<E>,
    // Boxed so the engine sees a stable address.
    context: Option<Box<E::RawBulk>>,
}

impl<'a, E: Engine> BulkContext<'a, E> {
    pub(crate) fn new(bitmap: &'a mut Bitmap<E>) -> Self {
        Self {
            bitmap,
            context: Some(Box::new(E::bulk_context())),
        }
    }

    pub fn add(&mut self, value: E::Value) -> Result<()> {
        let context = self
            .context
            .as_deref_mut()
            .ok_or(Error::Disposed {
                resource: "bulk insertion context",
            })?;
        unsafe { E::add_bulk(self.bitmap.raw_mut(), context, value) };
        Ok(())
    }

    /// Add every value yielded by `values`.
    pub fn extend(&mut self, values: impl IntoIterator<Item = E::Value>) -> Result<()> {
        for value in values {
            self.add(value)?;
        }
        Ok(())
    }

    pub fn is_released(&self) -> bool {
        self.context.is_none()
    }

    /// Drop the engine context. Idempotent; the bitmap is unaffected.
    pub fn release(&mut self) {
        if self.context.take().is_some() {
            trace!(bits = E::BITS, "bulk insertion context released");
        }
    }
}

impl<E: Engine> Drop for BulkContext<'_, E> {
    fn drop(&mut self) {
        self.release();
    }
}
