//! Bindings to the compression engine.
//!
//! The engine owns the container formats and every set-algebra algorithm;
//! this crate only drives it through raw handles. [`Engine`] is the seam:
//! each implementation maps the operations below onto one family of CRoaring
//! entry points (`roaring_bitmap_*` for 32-bit values, `roaring64_bitmap_*`
//! for 64-bit values).
//!
//! Every function taking a raw pointer is `unsafe`: callers guarantee the
//! pointer refers to a live handle of the matching kind, and that `*mut`
//! pointers are not aliased for the duration of the call. Functions returning
//! a handle return null on allocation or decoding failure.

mod roaring32;
mod roaring64;

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::serialize::Format;

pub use roaring32::Roaring32;
pub use roaring64::Roaring64;

/// An element type stored by an engine.
pub trait Value: Copy + Ord + Hash + Debug + Display + Default + Send + Sync + 'static {}

impl Value for u32 {}
impl Value for u64 {}

/// Operations consumed from the compression engine.
///
/// # Safety
///
/// Implementations must return handles that the other functions of the same
/// implementation accept, and honour the null-on-failure convention. Safe
/// wrappers in this crate rely on both.
pub unsafe trait Engine: Sized + Send + Sync + 'static {
    /// Stored element type.
    type Value: Value;
    /// Opaque bitmap handle.
    type Raw;
    /// Opaque forward iterator handle.
    type RawCursor;
    /// Bulk insertion context, owned by the caller.
    type RawBulk;

    /// Width of stored values in bits.
    const BITS: u32;

    /// Whether the engine has an encoder for `format`.
    fn supports(format: Format) -> bool;

    // ---- lifecycle ----

    fn create(capacity: u32) -> *mut Self::Raw;

    /// Build `[start, end)` stepping by `step`. Callers ensure
    /// `start < end` and `step > 0`.
    fn from_range(start: Self::Value, end: Self::Value, step: Self::Value) -> *mut Self::Raw;

    unsafe fn copy(raw: *const Self::Raw) -> *mut Self::Raw;
    unsafe fn free(raw: *mut Self::Raw);

    // ---- point and bulk mutation ----

    unsafe fn add(raw: *mut Self::Raw, value: Self::Value);
    unsafe fn add_checked(raw: *mut Self::Raw, value: Self::Value) -> bool;
    unsafe fn remove(raw: *mut Self::Raw, value: Self::Value);
    unsafe fn remove_checked(raw: *mut Self::Raw, value: Self::Value) -> bool;
    unsafe fn add_many(raw: *mut Self::Raw, values: &[Self::Value]);
    unsafe fn remove_many(raw: *mut Self::Raw, values: &[Self::Value]);
    unsafe fn add_range_closed(raw: *mut Self::Raw, min: Self::Value, max: Self::Value);
    unsafe fn remove_range_closed(raw: *mut Self::Raw, min: Self::Value, max: Self::Value);

    // ---- queries ----

    unsafe fn contains(raw: *const Self::Raw, value: Self::Value) -> bool;
    unsafe fn contains_range_closed(raw: *const Self::Raw, min: Self::Value, max: Self::Value) -> bool;
    unsafe fn cardinality(raw: *const Self::Raw) -> u64;
    unsafe fn is_empty(raw: *const Self::Raw) -> bool;
    unsafe fn minimum(raw: *const Self::Raw) -> Self::Value;
    unsafe fn maximum(raw: *const Self::Raw) -> Self::Value;
    unsafe fn rank(raw: *const Self::Raw, value: Self::Value) -> u64;
    unsafe fn select(raw: *const Self::Raw, index: u64) -> Option<Self::Value>;

    // ---- set algebra ----

    unsafe fn flip_closed(raw: *const Self::Raw, min: Self::Value, max: Self::Value) -> *mut Self::Raw;
    unsafe fn flip_closed_inplace(raw: *mut Self::Raw, min: Self::Value, max: Self::Value);

    unsafe fn and(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw;
    unsafe fn or(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw;
    unsafe fn xor(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw;
    unsafe fn andnot(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw;

    unsafe fn and_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw);
    unsafe fn or_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw);
    unsafe fn xor_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw);
    unsafe fn andnot_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw);

    unsafe fn and_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64;
    unsafe fn or_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64;
    unsafe fn xor_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64;
    unsafe fn andnot_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64;

    /// Union of all operands. `operands` is never empty.
    unsafe fn or_many(operands: &[*const Self::Raw]) -> *mut Self::Raw;
    /// Symmetric difference of all operands. `operands` is never empty.
    unsafe fn xor_many(operands: &[*const Self::Raw]) -> *mut Self::Raw;

    // ---- maintenance ----

    unsafe fn run_optimize(raw: *mut Self::Raw) -> bool;
    /// `None` when the engine cannot undo run compression.
    unsafe fn remove_run_compression(raw: *mut Self::Raw) -> Option<bool>;
    unsafe fn shrink_to_fit(raw: *mut Self::Raw) -> usize;
    /// Structural check; the error carries the engine's diagnostic.
    unsafe fn validate(raw: *const Self::Raw) -> Result<(), String>;

    // ---- serialization ----

    /// Only called for supported formats.
    unsafe fn serialized_size(raw: *const Self::Raw, format: Format) -> usize;
    /// `out` holds at least `serialized_size` bytes; frozen output is aligned.
    unsafe fn serialize(raw: *const Self::Raw, format: Format, out: *mut u8);
    /// Parse `Normal` or `Portable` bytes into an owned handle.
    unsafe fn deserialize(format: Format, bytes: &[u8]) -> *mut Self::Raw;
    /// Interpret `len` bytes at `data` in the `Frozen` or `Portable` layout.
    ///
    /// The returned handle may reference `data` directly, so the bytes must
    /// outlive it and must not change while it is alive. `data` is aligned
    /// to [`FROZEN_ALIGNMENT`](crate::buffer::FROZEN_ALIGNMENT).
    unsafe fn attach(format: Format, data: *const u8, len: usize) -> *mut Self::Raw;

    // ---- cursors ----

    /// The new cursor is positioned on the first value, if any.
    unsafe fn cursor_create(raw: *const Self::Raw) -> *mut Self::RawCursor;
    unsafe fn cursor_has_value(cursor: *const Self::RawCursor) -> bool;
    unsafe fn cursor_value(cursor: *const Self::RawCursor) -> Self::Value;
    unsafe fn cursor_advance(cursor: *mut Self::RawCursor) -> bool;
    unsafe fn cursor_free(cursor: *mut Self::RawCursor);

    // ---- bulk insertion ----

    fn bulk_context() -> Self::RawBulk;
    unsafe fn add_bulk(raw: *mut Self::Raw, context: *mut Self::RawBulk, value: Self::Value);
}

/// Engines offering merges that skip renormalization.
///
/// After any lazy merge the target holds containers whose cardinality is not
/// maintained; [`repair_after_lazy`](LazyEngine::repair_after_lazy) must run
/// before the handle is used for anything else.
pub unsafe trait LazyEngine: Engine {
    unsafe fn lazy_or(
        lhs: *const Self::Raw,
        rhs: *const Self::Raw,
        bitset_conversion: bool,
    ) -> *mut Self::Raw;
    unsafe fn lazy_or_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw, bitset_conversion: bool);
    unsafe fn lazy_xor(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw;
    unsafe fn lazy_xor_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw);
    unsafe fn repair_after_lazy(raw: *mut Self::Raw);
}
