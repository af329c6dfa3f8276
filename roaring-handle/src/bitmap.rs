use std::fmt;

use tracing::warn;

use crate::bulk::BulkContext;
use crate::config::BitmapOptions;
use crate::engine::{Engine, LazyEngine};
use crate::error::{Error, Result, check_interval, window};
use crate::handle::Handle;
use crate::lazy::DirtyBitmap;
use crate::read::{BitmapRead, Sealed};
use crate::serialize::{Format, ensure_supported};

/// A mutable compressed bitmap that exclusively owns its engine handle.
///
/// The handle is freed exactly once: by [`release`](Bitmap::release), or by
/// `Drop` when the bitmap goes out of scope without being released.
/// Read-only operations live on [`BitmapRead`].
///
/// ```no_run
/// use roaring_handle::{Bitmap32, BitmapRead};
/// # fn main() -> roaring_handle::Result<()> {
/// let mut bitmap = Bitmap32::new()?;
/// bitmap.add_range(0, 4)?;
/// assert_eq!(bitmap.to_vec()?, vec![0, 1, 2, 3, 4]);
/// assert!(bitmap.contains_range(0, 4)?);
/// assert!(!bitmap.contains_range(5, 5)?);
/// bitmap.release();
/// # Ok(())
/// # }
/// ```
pub struct Bitmap<E: Engine> {
    handle: Handle<E>,
}

impl<E: Engine> Sealed for Bitmap<E> {}

impl<E: Engine> BitmapRead<E> for Bitmap<E> {
    fn raw(&self) -> *const E::Raw {
        self.handle.as_ptr()
    }
}

impl<E: Engine> Bitmap<E> {
    pub(crate) fn from_raw(raw: *mut E::Raw) -> Result<Self> {
        Ok(Self {
            handle: Handle::from_raw(raw, "bitmap")?,
        })
    }

    pub(crate) fn raw_mut(&mut self) -> *mut E::Raw {
        self.handle.as_mut_ptr()
    }

    /// Create an empty bitmap.
    pub fn new() -> Result<Self> {
        Self::with_capacity(0)
    }

    /// Create an empty bitmap with room for `capacity` containers.
    pub fn with_capacity(capacity: u32) -> Result<Self> {
        Self::from_raw(E::create(capacity))
    }

    pub fn with_options(options: &BitmapOptions) -> Result<Self> {
        Self::with_capacity(options.capacity)
    }

    /// Create a bitmap holding `values`, in any order.
    pub fn from_values(values: &[E::Value]) -> Result<Self> {
        let mut bitmap = Self::new()?;
        bitmap.add_many(values);
        Ok(bitmap)
    }

    /// Create a bitmap holding `values[offset..offset + count]`.
    pub fn from_values_window(values: &[E::Value], offset: usize, count: usize) -> Result<Self> {
        let values = window(values, offset, count)?;
        Self::from_values(values)
    }

    /// Create a bitmap holding `start, start + step, ...` below `end`.
    ///
    /// `start == end` yields an empty bitmap.
    pub fn from_range(start: E::Value, end: E::Value, step: E::Value) -> Result<Self> {
        if start > end {
            return Err(Error::range(format!("range start {start} is past its end {end}")));
        }
        if step == E::Value::default() {
            return Err(Error::range("range step must be non-zero"));
        }
        if start == end {
            return Self::new();
        }
        Self::from_raw(E::from_range(start, end, step))
    }

    /// Deep copy into a new, independently owned bitmap.
    pub fn try_clone(&self) -> Result<Self> {
        Self::from_raw(unsafe { E::copy(self.raw()) })
    }

    /// Parse a `Normal` or `Portable` encoding into a new bitmap.
    ///
    /// The frozen layout is never parsed; attach it through a
    /// [`MemoryBuffer`](crate::MemoryBuffer) instead.
    pub fn deserialize(format: Format, bytes: &[u8]) -> Result<Self> {
        Self::deserialize_with(format, bytes, &BitmapOptions::default())
    }

    pub fn deserialize_with(format: Format, bytes: &[u8], options: &BitmapOptions) -> Result<Self> {
        if format == Format::Frozen {
            return Err(Error::range(
                "the frozen layout is attached through a memory buffer, not deserialized",
            ));
        }
        ensure_supported::<E>(format)?;

        let raw = unsafe { E::deserialize(format, bytes) };
        let bitmap =
            Self::from_raw(raw).map_err(|_| Error::decode(format, "engine rejected the input"))?;

        if options.validate_on_decode {
            if let Err(reason) = bitmap.validate() {
                warn!(%format, %reason, "deserialized bitmap failed validation");
                return Err(Error::decode(format, reason));
            }
        }
        Ok(bitmap)
    }

    pub fn add(&mut self, value: E::Value) {
        unsafe { E::add(self.raw_mut(), value) }
    }

    /// Add `value`, returning whether it was absent.
    pub fn add_checked(&mut self, value: E::Value) -> bool {
        unsafe { E::add_checked(self.raw_mut(), value) }
    }

    pub fn remove(&mut self, value: E::Value) {
        unsafe { E::remove(self.raw_mut(), value) }
    }

    /// Remove `value`, returning whether it was present.
    pub fn remove_checked(&mut self, value: E::Value) -> bool {
        unsafe { E::remove_checked(self.raw_mut(), value) }
    }

    pub fn add_many(&mut self, values: &[E::Value]) {
        if values.is_empty() {
            return;
        }
        unsafe { E::add_many(self.raw_mut(), values) }
    }

    /// Add `values[offset..offset + count]`.
    pub fn add_many_window(&mut self, values: &[E::Value], offset: usize, count: usize) -> Result<()> {
        let values = window(values, offset, count)?;
        self.add_many(values);
        Ok(())
    }

    pub fn remove_many(&mut self, values: &[E::Value]) {
        if values.is_empty() {
            return;
        }
        unsafe { E::remove_many(self.raw_mut(), values) }
    }

    /// Remove `values[offset..offset + count]`.
    pub fn remove_many_window(
        &mut self,
        values: &[E::Value],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let values = window(values, offset, count)?;
        self.remove_many(values);
        Ok(())
    }

    /// Add every value of the closed interval `[min, max]`.
    pub fn add_range(&mut self, min: E::Value, max: E::Value) -> Result<()> {
        check_interval(min, max)?;
        unsafe { E::add_range_closed(self.raw_mut(), min, max) };
        Ok(())
    }

    /// Remove every value of the closed interval `[min, max]`.
    pub fn remove_range(&mut self, min: E::Value, max: E::Value) -> Result<()> {
        check_interval(min, max)?;
        unsafe { E::remove_range_closed(self.raw_mut(), min, max) };
        Ok(())
    }

    /// Complement within the closed interval `[min, max]`, in place.
    pub fn flip_inplace(&mut self, min: E::Value, max: E::Value) -> Result<()> {
        check_interval(min, max)?;
        unsafe { E::flip_closed_inplace(self.raw_mut(), min, max) };
        Ok(())
    }

    pub fn and_inplace(&mut self, other: &impl BitmapRead<E>) {
        unsafe { E::and_inplace(self.raw_mut(), other.raw()) }
    }

    pub fn or_inplace(&mut self, other: &impl BitmapRead<E>) {
        unsafe { E::or_inplace(self.raw_mut(), other.raw()) }
    }

    pub fn xor_inplace(&mut self, other: &impl BitmapRead<E>) {
        unsafe { E::xor_inplace(self.raw_mut(), other.raw()) }
    }

    pub fn andnot_inplace(&mut self, other: &impl BitmapRead<E>) {
        unsafe { E::andnot_inplace(self.raw_mut(), other.raw()) }
    }

    /// Re-encode containers as runs where that is smaller.
    ///
    /// Returns whether any container changed representation.
    pub fn run_optimize(&mut self) -> bool {
        unsafe { E::run_optimize(self.raw_mut()) }
    }

    /// Convert run containers back to array or bitset containers.
    ///
    /// Returns whether any container changed representation.
    pub fn remove_run_compression(&mut self) -> Result<bool> {
        unsafe { E::remove_run_compression(self.raw_mut()) }
            .ok_or(Error::Unsupported("removing run compression from 64-bit bitmaps"))
    }

    /// Release over-allocated memory, returning the number of bytes saved.
    pub fn shrink_to_fit(&mut self) -> usize {
        unsafe { E::shrink_to_fit(self.raw_mut()) }
    }

    /// A bulk insertion context bound to this bitmap.
    pub fn bulk(&mut self) -> BulkContext<'_, E> {
        BulkContext::new(self)
    }

    /// Free the engine handle now.
    ///
    /// Dropping the bitmap has the same effect; calling this makes the
    /// release point explicit.
    pub fn release(mut self) {
        self.handle.release();
    }
}

impl<E: LazyEngine> Bitmap<E> {
    /// Union without renormalization. The result must be repaired.
    pub fn lazy_or(&self, other: &impl BitmapRead<E>) -> Result<DirtyBitmap<E>> {
        self.lazy_or_with(other, &BitmapOptions::default())
    }

    pub fn lazy_or_with(
        &self,
        other: &impl BitmapRead<E>,
        options: &BitmapOptions,
    ) -> Result<DirtyBitmap<E>> {
        let raw = unsafe { E::lazy_or(self.raw(), other.raw(), options.lazy_bitset_conversion) };
        DirtyBitmap::from_raw(raw, options)
    }

    /// Symmetric difference without renormalization. The result must be
    /// repaired.
    pub fn lazy_xor(&self, other: &impl BitmapRead<E>) -> Result<DirtyBitmap<E>> {
        let raw = unsafe { E::lazy_xor(self.raw(), other.raw()) };
        DirtyBitmap::from_raw(raw, &BitmapOptions::default())
    }

    /// Enter the dirty state to run a chain of in-place lazy merges.
    pub fn into_dirty(self) -> DirtyBitmap<E> {
        self.into_dirty_with(&BitmapOptions::default())
    }

    pub fn into_dirty_with(self, options: &BitmapOptions) -> DirtyBitmap<E> {
        DirtyBitmap::from_bitmap(self, options)
    }

    pub(crate) fn into_handle(self) -> Handle<E> {
        self.handle
    }

    pub(crate) fn from_handle(handle: Handle<E>) -> Self {
        Self { handle }
    }
}

impl<E: Engine> Clone for Bitmap<E> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(bitmap) => bitmap,
            Err(_) => std::alloc::handle_alloc_error(std::alloc::Layout::new::<E::Raw>()),
        }
    }
}

impl<E: Engine> PartialEq for Bitmap<E> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.and_len(other) == self.len()
    }
}

impl<E: Engine> Eq for Bitmap<E> {}

impl<E: Engine> fmt::Debug for Bitmap<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("bits", &E::BITS)
            .field("len", &self.len())
            .field("min", &self.min())
            .field("max", &self.max())
            .finish()
    }
}
