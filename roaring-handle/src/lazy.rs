use crate::bitmap::Bitmap;
use crate::config::BitmapOptions;
use crate::engine::LazyEngine;
use crate::error::Result;
use crate::handle::Handle;
use crate::read::BitmapRead;

/// A bitmap produced by lazy merges, awaiting repair.
///
/// Lazy unions and symmetric differences skip cardinality bookkeeping, so
/// the engine representation is not trustworthy until
/// [`repair`](DirtyBitmap::repair) renormalizes it. This type exposes
/// nothing but further lazy merges and `repair`; reading a dirty bitmap is
/// not expressible.
///
/// ```no_run
/// use roaring_handle::{Bitmap32, BitmapRead};
/// # fn main() -> roaring_handle::Result<()> {
/// let parts = [Bitmap32::from_values(&[1, 2])?, Bitmap32::from_values(&[2, 3])?];
/// let mut dirty = Bitmap32::new()?.into_dirty();
/// for part in &parts {
///     dirty.or_inplace(part);
/// }
/// let merged = dirty.repair();
/// assert_eq!(merged.to_vec()?, vec![1, 2, 3]);
/// # Ok(())
/// # }
/// ```
pub struct DirtyBitmap<E: LazyEngine> {
    handle: Handle<E>,
    bitset_conversion: bool,
}

impl<E: LazyEngine> DirtyBitmap<E> {
    pub(crate) fn from_raw(raw: *mut E::Raw, options: &BitmapOptions) -> Result<Self> {
        Ok(Self {
            handle: Handle::from_raw(raw, "dirty bitmap")?,
            bitset_conversion: options.lazy_bitset_conversion,
        })
    }

    pub(crate) fn from_bitmap(bitmap: Bitmap<E>, options: &BitmapOptions) -> Self {
        Self {
            handle: bitmap.into_handle(),
            bitset_conversion: options.lazy_bitset_conversion,
        }
    }

    /// Lazily merge `other` into this bitmap.
    pub fn or_inplace(&mut self, other: &impl BitmapRead<E>) {
        unsafe {
            E::lazy_or_inplace(self.handle.as_mut_ptr(), other.raw(), self.bitset_conversion)
        }
    }

    /// Lazily toggle the values of `other` in this bitmap.
    pub fn xor_inplace(&mut self, other: &impl BitmapRead<E>) {
        unsafe { E::lazy_xor_inplace(self.handle.as_mut_ptr(), other.raw()) }
    }

    /// Renormalize and return to a regular bitmap.
    pub fn repair(mut self) -> Bitmap<E> {
        unsafe { E::repair_after_lazy(self.handle.as_mut_ptr()) };
        Bitmap::from_handle(self.handle)
    }

    /// Free the engine handle without repairing.
    pub fn release(mut self) {
        self.handle.release();
    }
}

impl<E: LazyEngine> std::fmt::Debug for DirtyBitmap<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirtyBitmap")
            .field("bitset_conversion", &self.bitset_conversion)
            .finish_non_exhaustive()
    }
}
