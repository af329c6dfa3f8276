//! Fixed-size byte regions that frozen views attach to.
//!
//! A [`MemoryBuffer`] and every [`FrozenView`] built over it each hold one
//! [`Lease`] on a shared [`Region`]. The region counts live leases; the bytes
//! are dropped when the last lease is released, whichever handle that is.
//! After that every access through any handle fails with
//! [`Error::Disposed`].

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytemuck::{Pod, Zeroable};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::BitmapOptions;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::frozen::FrozenView;
use crate::read::BitmapRead;
use crate::serialize::{self, Format};

/// Alignment of every buffer's first byte. Covers the 32-byte requirement of
/// 32-bit frozen views and the 64-byte requirement of 64-bit ones.
pub const FROZEN_ALIGNMENT: usize = 64;

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
struct Block([u8; FROZEN_ALIGNMENT]);

/// Heap bytes whose start is aligned to [`FROZEN_ALIGNMENT`].
///
/// The backing allocation never moves, so pointers handed to the engine stay
/// valid for as long as the value is alive.
pub(crate) struct AlignedBytes {
    blocks: Box<[Block]>,
    len: usize,
}

impl AlignedBytes {
    pub(crate) fn zeroed(len: usize) -> Self {
        let blocks = vec![Block::zeroed(); len.div_ceil(FROZEN_ALIGNMENT)].into_boxed_slice();
        Self { blocks, len }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..self.len]
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..self.len]
    }
}

/// Reference-counted storage shared by a buffer and its views.
pub(crate) struct Region {
    refs: AtomicUsize,
    len: usize,
    storage: Mutex<Option<AlignedBytes>>,
}

impl Region {
    fn new(len: usize) -> Self {
        Self {
            refs: AtomicUsize::new(1),
            len,
            storage: Mutex::new(Some(AlignedBytes::zeroed(len))),
        }
    }

    /// Register one more lease. Fails once the count has reached zero, since
    /// the bytes are gone by then.
    fn acquire(&self) -> Result<()> {
        let mut current = self.refs.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return Err(Error::Disposed {
                    resource: "memory buffer",
                });
            }
            match self.refs.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Drop one lease, freeing the bytes when it was the last.
    fn release(&self) {
        let previous = self.refs.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "memory buffer reference count underflow");

        if previous == 1 {
            let freed = self.storage.lock().take();
            if freed.is_some() {
                debug!(len = self.len, "memory buffer bytes released");
            }
        }
    }

    fn live_references(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }
}

/// One counted reference to a [`Region`].
///
/// `release` decrements the region's count the first time it is called;
/// later calls, including the one made by `Drop`, do nothing.
pub(crate) struct Lease {
    region: Arc<Region>,
    released: AtomicBool,
}

impl Lease {
    fn first(region: Arc<Region>) -> Self {
        Self {
            region,
            released: AtomicBool::new(false),
        }
    }

    fn share(&self) -> Result<Self> {
        self.region.acquire()?;
        Ok(Self::first(Arc::clone(&self.region)))
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub(crate) fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.region.release();
        true
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if self.release() {
            trace!("memory buffer lease released on drop");
        }
    }
}

/// A fixed-size, aligned byte region that frozen bitmaps can attach to.
///
/// The buffer's own handle counts as one reference and each attached
/// [`FrozenView`] as another. Releasing the buffer only gives up its own
/// reference: the bytes stay readable until the last view is released too.
///
/// ```no_run
/// use roaring_handle::{Bitmap32, BitmapRead, Format, MemoryBuffer};
/// # fn main() -> roaring_handle::Result<()> {
/// let bitmap = Bitmap32::from_values(&[1, 2, 3])?;
/// let mut buffer = MemoryBuffer::from_bitmap(&bitmap, Format::Frozen)?;
/// let view = buffer.to_frozen::<roaring_handle::Roaring32>(Format::Frozen)?;
///
/// buffer.release();
/// assert!(view.contains(2));
/// view.release();
/// assert!(buffer.to_vec().is_err());
/// # Ok(())
/// # }
/// ```
pub struct MemoryBuffer {
    lease: Lease,
}

impl MemoryBuffer {
    /// Allocate `size` zeroed bytes.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::range("memory buffer size must be non-zero"));
        }
        Ok(Self {
            lease: Lease::first(Arc::new(Region::new(size))),
        })
    }

    /// Allocate a buffer holding a copy of `bytes`.
    pub fn copy_from_slice(bytes: &[u8]) -> Result<Self> {
        let mut buffer = Self::new(bytes.len())?;
        buffer.write(0, bytes)?;
        Ok(buffer)
    }

    /// Allocate a buffer sized exactly for `bitmap` in `format` and
    /// serialize it there.
    pub fn from_bitmap<E: Engine>(bitmap: &impl BitmapRead<E>, format: Format) -> Result<Self> {
        let size = bitmap.serialized_size(format)?;
        let buffer = Self::new(size)?;
        {
            let mut storage = buffer.lease.region.storage.lock();
            let bytes = storage.as_mut().ok_or(Error::Disposed {
                resource: "memory buffer",
            })?;
            unsafe { serialize::serialize_into::<E>(bitmap.raw(), format, bytes.as_mut_slice())? };
        }
        Ok(buffer)
    }

    /// Size in bytes, fixed at allocation.
    pub fn len(&self) -> usize {
        self.lease.region.len
    }

    /// Always `false`: zero-sized buffers are rejected by [`new`](Self::new).
    /// Present to pair with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live references: this handle (until released) plus every
    /// attached view.
    pub fn live_references(&self) -> usize {
        self.lease.region.live_references()
    }

    /// Whether the bytes have been physically freed.
    pub fn is_released(&self) -> bool {
        self.lease.region.storage.lock().is_none()
    }

    /// Copy `data` into the buffer at `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let range = self.bounds(offset, data.len())?;
        let mut storage = self.lease.region.storage.lock();
        let bytes = storage.as_mut().ok_or(Error::Disposed {
            resource: "memory buffer",
        })?;

        let views = self.attached_views();
        if views > 0 {
            return Err(Error::BufferInUse { views });
        }

        bytes.as_mut_slice()[range].copy_from_slice(data);
        Ok(())
    }

    /// Copy `data` into the buffer at `offset`, yielding to the runtime
    /// before the copy.
    ///
    /// Cancellation is checked before the copy starts; a cancelled request
    /// leaves the buffer untouched.
    pub async fn write_async(
        &mut self,
        offset: usize,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.bounds(offset, data.len())?;

        tokio::task::yield_now().await;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.write(offset, data)
    }

    /// Run `f` over the buffer's bytes.
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let storage = self.lease.region.storage.lock();
        let bytes = storage.as_ref().ok_or(Error::Disposed {
            resource: "memory buffer",
        })?;
        Ok(f(bytes.as_slice()))
    }

    /// Run `f` over `range` of the buffer's bytes.
    pub fn read_range<R>(&self, range: Range<usize>, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        if range.start > range.end {
            return Err(Error::range(format!(
                "read range start {} is past its end {}",
                range.start, range.end
            )));
        }
        let range = self.bounds(range.start, range.end - range.start)?;
        self.read(|bytes| f(&bytes[range]))
    }

    /// Copy the buffer's bytes out.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.read(<[u8]>::to_vec)
    }

    /// Attach a read-only bitmap over the current bytes.
    ///
    /// `format` must be [`Format::Frozen`] or [`Format::Portable`]. A frozen
    /// buffer must hold exactly one serialized bitmap, as produced by
    /// [`MemoryBuffer::from_bitmap`]. The view keeps the bytes alive until it
    /// is released.
    pub fn to_frozen<E: Engine>(&self, format: Format) -> Result<FrozenView<E>> {
        self.to_frozen_with(format, &BitmapOptions::default())
    }

    /// Like [`to_frozen`](Self::to_frozen), with explicit options.
    pub fn to_frozen_with<E: Engine>(
        &self,
        format: Format,
        options: &BitmapOptions,
    ) -> Result<FrozenView<E>> {
        if format == Format::Normal {
            return Err(Error::range(
                "only the frozen and portable layouts can be attached",
            ));
        }
        serialize::ensure_supported::<E>(format)?;

        // Held across attachment so writes cannot interleave.
        let storage = self.lease.region.storage.lock();
        let bytes = storage.as_ref().ok_or(Error::Disposed {
            resource: "memory buffer",
        })?;

        let lease = self.lease.share()?;
        let slice = bytes.as_slice();
        let raw = unsafe { E::attach(format, slice.as_ptr(), slice.len()) };
        drop(storage);

        // On failure the new lease is dropped here, undoing the increment.
        FrozenView::attach(raw, lease, format, options)
    }

    /// Give up this handle's reference. Idempotent.
    ///
    /// The bytes are freed now if no view is attached, otherwise when the
    /// last view is released.
    pub fn release(&mut self) {
        if self.lease.release() {
            trace!(refs = self.live_references(), "memory buffer handle released");
        }
    }

    fn attached_views(&self) -> usize {
        let own = usize::from(!self.lease.is_released());
        self.live_references().saturating_sub(own)
    }

    fn bounds(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len() => Ok(offset..end),
            _ => Err(Error::range(format!(
                "range {offset}+{len} exceeds buffer size {}",
                self.len()
            ))),
        }
    }
}

impl std::fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBuffer")
            .field("len", &self.len())
            .field("live_references", &self.live_references())
            .field("released", &self.lease.is_released())
            .finish()
    }
}
