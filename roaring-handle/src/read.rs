//! The read-only bitmap surface shared by owned bitmaps and frozen views.

use crate::bitmap::Bitmap;
use crate::cursor::Cursor;
use crate::engine::Engine;
use crate::error::{Result, check_interval};
use crate::serialize::{self, Format};

mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;

/// Queries, set algebra and serialization over any live engine bitmap.
///
/// Implemented by [`Bitmap`] and [`FrozenView`](crate::FrozenView). Every
/// operation leaves `self` untouched; set-algebra results are new, owned
/// [`Bitmap`]s.
pub trait BitmapRead<E: Engine>: Sealed {
    /// The live engine handle. Valid for as long as `self` is borrowed.
    #[doc(hidden)]
    fn raw(&self) -> *const E::Raw;

    fn contains(&self, value: E::Value) -> bool {
        unsafe { E::contains(self.raw(), value) }
    }

    /// Whether every value of the closed interval `[min, max]` is present.
    fn contains_range(&self, min: E::Value, max: E::Value) -> Result<bool> {
        check_interval(min, max)?;
        Ok(unsafe { E::contains_range_closed(self.raw(), min, max) })
    }

    /// Cardinality.
    fn len(&self) -> u64 {
        unsafe { E::cardinality(self.raw()) }
    }

    fn is_empty(&self) -> bool {
        unsafe { E::is_empty(self.raw()) }
    }

    fn min(&self) -> Option<E::Value> {
        if self.is_empty() {
            return None;
        }
        Some(unsafe { E::minimum(self.raw()) })
    }

    fn max(&self) -> Option<E::Value> {
        if self.is_empty() {
            return None;
        }
        Some(unsafe { E::maximum(self.raw()) })
    }

    /// Number of values less than or equal to `value`.
    fn rank(&self, value: E::Value) -> u64 {
        unsafe { E::rank(self.raw(), value) }
    }

    /// The value at sorted position `index`, or `None` past the end.
    fn select(&self, index: u64) -> Option<E::Value> {
        unsafe { E::select(self.raw(), index) }
    }

    /// Structural check of the engine representation.
    ///
    /// The error carries the engine's diagnostic.
    fn validate(&self) -> std::result::Result<(), String> {
        unsafe { E::validate(self.raw()) }
    }

    /// A forward cursor over the values in ascending order.
    fn cursor(&self) -> Result<Cursor<'_, E>> {
        unsafe { Cursor::new(self.raw()) }
    }

    /// Collect all values in ascending order.
    fn to_vec(&self) -> Result<Vec<E::Value>> {
        let mut values = Vec::with_capacity(usize::try_from(self.len()).unwrap_or(0));
        values.extend(self.cursor()?);
        Ok(values)
    }

    /// Complement within the closed interval `[min, max]`.
    fn flip(&self, min: E::Value, max: E::Value) -> Result<Bitmap<E>> {
        check_interval(min, max)?;
        Bitmap::from_raw(unsafe { E::flip_closed(self.raw(), min, max) })
    }

    fn and(&self, other: &impl BitmapRead<E>) -> Result<Bitmap<E>> {
        Bitmap::from_raw(unsafe { E::and(self.raw(), other.raw()) })
    }

    fn or(&self, other: &impl BitmapRead<E>) -> Result<Bitmap<E>> {
        Bitmap::from_raw(unsafe { E::or(self.raw(), other.raw()) })
    }

    fn xor(&self, other: &impl BitmapRead<E>) -> Result<Bitmap<E>> {
        Bitmap::from_raw(unsafe { E::xor(self.raw(), other.raw()) })
    }

    fn andnot(&self, other: &impl BitmapRead<E>) -> Result<Bitmap<E>> {
        Bitmap::from_raw(unsafe { E::andnot(self.raw(), other.raw()) })
    }

    /// Cardinality of `self & other`, without materializing it.
    fn and_len(&self, other: &impl BitmapRead<E>) -> u64 {
        unsafe { E::and_cardinality(self.raw(), other.raw()) }
    }

    fn or_len(&self, other: &impl BitmapRead<E>) -> u64 {
        unsafe { E::or_cardinality(self.raw(), other.raw()) }
    }

    fn xor_len(&self, other: &impl BitmapRead<E>) -> u64 {
        unsafe { E::xor_cardinality(self.raw(), other.raw()) }
    }

    fn andnot_len(&self, other: &impl BitmapRead<E>) -> u64 {
        unsafe { E::andnot_cardinality(self.raw(), other.raw()) }
    }

    /// Union of `self` and every bitmap in `others`.
    fn or_many<B: BitmapRead<E>>(&self, others: &[&B]) -> Result<Bitmap<E>> {
        let operands = operands(self, others);
        Bitmap::from_raw(unsafe { E::or_many(&operands) })
    }

    /// Symmetric difference of `self` and every bitmap in `others`.
    fn xor_many<B: BitmapRead<E>>(&self, others: &[&B]) -> Result<Bitmap<E>> {
        let operands = operands(self, others);
        Bitmap::from_raw(unsafe { E::xor_many(&operands) })
    }

    /// Exact length of the `format` encoding.
    fn serialized_size(&self, format: Format) -> Result<usize> {
        unsafe { serialize::serialized_size::<E>(self.raw(), format) }
    }

    /// Encode into `out`, returning the number of bytes written.
    ///
    /// `out` must hold at least [`serialized_size`](Self::serialized_size)
    /// bytes.
    fn serialize_into(&self, format: Format, out: &mut [u8]) -> Result<usize> {
        unsafe { serialize::serialize_into::<E>(self.raw(), format, out) }
    }

    fn serialize(&self, format: Format) -> Result<Vec<u8>> {
        unsafe { serialize::serialize::<E>(self.raw(), format) }
    }
}

fn operands<E, A, B>(first: &A, rest: &[&B]) -> Vec<*const E::Raw>
where
    E: Engine,
    A: BitmapRead<E> + ?Sized,
    B: BitmapRead<E>,
{
    std::iter::once(first.raw())
        .chain(rest.iter().map(|bitmap| bitmap.raw()))
        .collect()
}
