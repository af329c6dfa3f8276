use std::fmt;

use tracing::{debug, trace, warn};

use crate::bitmap::Bitmap;
use crate::buffer::Lease;
use crate::config::BitmapOptions;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::read::{BitmapRead, Sealed};
use crate::serialize::Format;

/// A read-only bitmap attached in place over a [`MemoryBuffer`]'s bytes.
///
/// Created by [`MemoryBuffer::to_frozen`]. The view holds one reference on
/// the buffer's bytes and never frees them itself: releasing the view frees
/// its engine handle and gives the reference back, exactly once, whether
/// through [`release`](FrozenView::release) or `Drop`.
///
/// [`MemoryBuffer`]: crate::MemoryBuffer
/// [`MemoryBuffer::to_frozen`]: crate::MemoryBuffer::to_frozen
pub struct FrozenView<E: Engine> {
    handle: Handle<E>,
    lease: Lease,
    format: Format,
}

impl<E: Engine> Sealed for FrozenView<E> {}

impl<E: Engine> BitmapRead<E> for FrozenView<E> {
    fn raw(&self) -> *const E::Raw {
        self.handle.as_ptr()
    }
}

impl<E: Engine> FrozenView<E> {
    pub(crate) fn attach(
        raw: *mut E::Raw,
        lease: Lease,
        format: Format,
        options: &BitmapOptions,
    ) -> Result<Self> {
        let handle = Handle::from_raw(raw, "frozen view")
            .map_err(|_| Error::decode(format, "bytes are not a valid bitmap in this layout"))?;

        let view = Self {
            handle,
            lease,
            format,
        };

        if options.validate_on_decode {
            if let Err(reason) = view.validate() {
                warn!(%format, %reason, "attached bitmap failed validation");
                return Err(Error::decode(format, reason));
            }
        }

        debug!(%format, bits = E::BITS, len = view.len(), "frozen view attached");
        Ok(view)
    }

    /// Layout the view was attached with.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Deep copy into an owned bitmap that no longer depends on the buffer.
    pub fn to_bitmap(&self) -> Result<Bitmap<E>> {
        Bitmap::from_raw(unsafe { E::copy(self.raw()) })
    }

    /// Free the view and give its buffer reference back.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        // The engine handle may point into the buffer: free it first.
        self.handle.release();
        if self.lease.release() {
            trace!("frozen view released");
        }
    }
}

impl<E: Engine> Drop for FrozenView<E> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl<E: Engine> fmt::Debug for FrozenView<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrozenView")
            .field("bits", &E::BITS)
            .field("format", &self.format)
            .field("len", &self.len())
            .finish()
    }
}
