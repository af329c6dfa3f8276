use std::ffi::c_char;
use std::ptr;

use croaring_sys as ffi;

use super::Engine;
use super::roaring32::describe;
use crate::serialize::Format;

/// The 64-bit CRoaring engine (`roaring64_bitmap_t`).
///
/// Has no native layout, no lazy merges and no way to undo run compression.
#[derive(Debug, Clone, Copy)]
pub enum Roaring64 {}

unsafe impl Engine for Roaring64 {
    type Value = u64;
    type Raw = ffi::roaring64_bitmap_t;
    type RawCursor = ffi::roaring64_iterator_t;
    type RawBulk = ffi::roaring64_bulk_context_t;

    const BITS: u32 = 64;

    fn supports(format: Format) -> bool {
        matches!(format, Format::Portable | Format::Frozen)
    }

    fn create(_capacity: u32) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_create() }
    }

    fn from_range(start: u64, end: u64, step: u64) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_from_range(start, end, step) }
    }

    unsafe fn copy(raw: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_copy(raw) }
    }

    unsafe fn free(raw: *mut Self::Raw) {
        unsafe { ffi::roaring64_bitmap_free(raw) }
    }

    unsafe fn add(raw: *mut Self::Raw, value: u64) {
        unsafe { ffi::roaring64_bitmap_add(raw, value) }
    }

    unsafe fn add_checked(raw: *mut Self::Raw, value: u64) -> bool {
        unsafe { ffi::roaring64_bitmap_add_checked(raw, value) }
    }

    unsafe fn remove(raw: *mut Self::Raw, value: u64) {
        unsafe { ffi::roaring64_bitmap_remove(raw, value) }
    }

    unsafe fn remove_checked(raw: *mut Self::Raw, value: u64) -> bool {
        unsafe { ffi::roaring64_bitmap_remove_checked(raw, value) }
    }

    unsafe fn add_many(raw: *mut Self::Raw, values: &[u64]) {
        unsafe { ffi::roaring64_bitmap_add_many(raw, values.len(), values.as_ptr()) }
    }

    unsafe fn remove_many(raw: *mut Self::Raw, values: &[u64]) {
        unsafe { ffi::roaring64_bitmap_remove_many(raw, values.len(), values.as_ptr()) }
    }

    unsafe fn add_range_closed(raw: *mut Self::Raw, min: u64, max: u64) {
        unsafe { ffi::roaring64_bitmap_add_range_closed(raw, min, max) }
    }

    unsafe fn remove_range_closed(raw: *mut Self::Raw, min: u64, max: u64) {
        unsafe { ffi::roaring64_bitmap_remove_range_closed(raw, min, max) }
    }

    unsafe fn contains(raw: *const Self::Raw, value: u64) -> bool {
        unsafe { ffi::roaring64_bitmap_contains(raw, value) }
    }

    unsafe fn contains_range_closed(raw: *const Self::Raw, min: u64, max: u64) -> bool {
        // The engine takes a half-open range; u64::MAX has no exclusive bound.
        match max.checked_add(1) {
            Some(end) => unsafe { ffi::roaring64_bitmap_contains_range(raw, min, end) },
            None => unsafe {
                ffi::roaring64_bitmap_contains_range(raw, min, max)
                    && ffi::roaring64_bitmap_contains(raw, max)
            },
        }
    }

    unsafe fn cardinality(raw: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring64_bitmap_get_cardinality(raw) }
    }

    unsafe fn is_empty(raw: *const Self::Raw) -> bool {
        unsafe { ffi::roaring64_bitmap_is_empty(raw) }
    }

    unsafe fn minimum(raw: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring64_bitmap_minimum(raw) }
    }

    unsafe fn maximum(raw: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring64_bitmap_maximum(raw) }
    }

    unsafe fn rank(raw: *const Self::Raw, value: u64) -> u64 {
        unsafe { ffi::roaring64_bitmap_rank(raw, value) }
    }

    unsafe fn select(raw: *const Self::Raw, index: u64) -> Option<u64> {
        let mut element = 0u64;
        unsafe { ffi::roaring64_bitmap_select(raw, index, &mut element) }.then_some(element)
    }

    unsafe fn flip_closed(raw: *const Self::Raw, min: u64, max: u64) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_flip_closed(raw, min, max) }
    }

    unsafe fn flip_closed_inplace(raw: *mut Self::Raw, min: u64, max: u64) {
        unsafe { ffi::roaring64_bitmap_flip_closed_inplace(raw, min, max) }
    }

    unsafe fn and(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_and(lhs, rhs) }
    }

    unsafe fn or(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_or(lhs, rhs) }
    }

    unsafe fn xor(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_xor(lhs, rhs) }
    }

    unsafe fn andnot(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring64_bitmap_andnot(lhs, rhs) }
    }

    unsafe fn and_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring64_bitmap_and_inplace(lhs, rhs) }
    }

    unsafe fn or_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring64_bitmap_or_inplace(lhs, rhs) }
    }

    unsafe fn xor_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring64_bitmap_xor_inplace(lhs, rhs) }
    }

    unsafe fn andnot_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring64_bitmap_andnot_inplace(lhs, rhs) }
    }

    unsafe fn and_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring64_bitmap_and_cardinality(lhs, rhs) }
    }

    unsafe fn or_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring64_bitmap_or_cardinality(lhs, rhs) }
    }

    unsafe fn xor_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring64_bitmap_xor_cardinality(lhs, rhs) }
    }

    unsafe fn andnot_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring64_bitmap_andnot_cardinality(lhs, rhs) }
    }

    unsafe fn or_many(operands: &[*const Self::Raw]) -> *mut Self::Raw {
        // No n-way union for 64-bit bitmaps: fold into a copy of the first.
        unsafe { fold(operands, |acc, rhs| ffi::roaring64_bitmap_or_inplace(acc, rhs)) }
    }

    unsafe fn xor_many(operands: &[*const Self::Raw]) -> *mut Self::Raw {
        unsafe { fold(operands, |acc, rhs| ffi::roaring64_bitmap_xor_inplace(acc, rhs)) }
    }

    unsafe fn run_optimize(raw: *mut Self::Raw) -> bool {
        unsafe { ffi::roaring64_bitmap_run_optimize(raw) }
    }

    unsafe fn remove_run_compression(_raw: *mut Self::Raw) -> Option<bool> {
        None
    }

    unsafe fn shrink_to_fit(raw: *mut Self::Raw) -> usize {
        unsafe { ffi::roaring64_bitmap_shrink_to_fit(raw) }
    }

    unsafe fn validate(raw: *const Self::Raw) -> Result<(), String> {
        let mut reason: *const c_char = ptr::null();
        if unsafe { ffi::roaring64_bitmap_internal_validate(raw, &mut reason) } {
            return Ok(());
        }
        Err(unsafe { describe(reason) })
    }

    unsafe fn serialized_size(raw: *const Self::Raw, format: Format) -> usize {
        match format {
            Format::Portable => unsafe { ffi::roaring64_bitmap_portable_size_in_bytes(raw) },
            Format::Frozen => unsafe {
                with_shrunk_copy(raw, |copy| ffi::roaring64_bitmap_frozen_size_in_bytes(copy))
                    .unwrap_or(0)
            },
            Format::Normal => 0,
        }
    }

    unsafe fn serialize(raw: *const Self::Raw, format: Format, out: *mut u8) {
        match format {
            Format::Portable => {
                unsafe { ffi::roaring64_bitmap_portable_serialize(raw, out.cast()) };
            }
            Format::Frozen => {
                unsafe {
                    with_shrunk_copy(raw, |copy| {
                        ffi::roaring64_bitmap_frozen_serialize(copy, out.cast())
                    })
                };
            }
            Format::Normal => {}
        }
    }

    unsafe fn deserialize(format: Format, bytes: &[u8]) -> *mut Self::Raw {
        match format {
            Format::Portable if !bytes.is_empty() => unsafe {
                ffi::roaring64_bitmap_portable_deserialize_safe(bytes.as_ptr().cast(), bytes.len())
            },
            _ => ptr::null_mut(),
        }
    }

    unsafe fn attach(format: Format, data: *const u8, len: usize) -> *mut Self::Raw {
        match format {
            Format::Frozen => unsafe { ffi::roaring64_bitmap_frozen_view(data.cast(), len) },
            // No in-place portable reader exists for 64-bit bitmaps; the
            // view owns a parsed copy but still follows the buffer's lease.
            Format::Portable => unsafe {
                ffi::roaring64_bitmap_portable_deserialize_safe(data.cast(), len)
            },
            Format::Normal => ptr::null_mut(),
        }
    }

    unsafe fn cursor_create(raw: *const Self::Raw) -> *mut Self::RawCursor {
        unsafe { ffi::roaring64_iterator_create(raw) }
    }

    unsafe fn cursor_has_value(cursor: *const Self::RawCursor) -> bool {
        unsafe { ffi::roaring64_iterator_has_value(cursor) }
    }

    unsafe fn cursor_value(cursor: *const Self::RawCursor) -> u64 {
        unsafe { ffi::roaring64_iterator_value(cursor) }
    }

    unsafe fn cursor_advance(cursor: *mut Self::RawCursor) -> bool {
        unsafe { ffi::roaring64_iterator_advance(cursor) }
    }

    unsafe fn cursor_free(cursor: *mut Self::RawCursor) {
        unsafe { ffi::roaring64_iterator_free(cursor) }
    }

    fn bulk_context() -> Self::RawBulk {
        unsafe { std::mem::zeroed() }
    }

    unsafe fn add_bulk(raw: *mut Self::Raw, context: *mut Self::RawBulk, value: u64) {
        unsafe { ffi::roaring64_bitmap_add_bulk(raw, context, value) }
    }
}

unsafe fn fold(
    operands: &[*const ffi::roaring64_bitmap_t],
    step: impl Fn(*mut ffi::roaring64_bitmap_t, *const ffi::roaring64_bitmap_t),
) -> *mut ffi::roaring64_bitmap_t {
    let Some((first, rest)) = operands.split_first() else {
        return unsafe { ffi::roaring64_bitmap_create() };
    };
    let acc = unsafe { ffi::roaring64_bitmap_copy(*first) };
    if acc.is_null() {
        return acc;
    }
    for &rhs in rest {
        step(acc, rhs);
    }
    acc
}

/// Run `f` on a shrunk copy of `raw`; `None` if the copy cannot be made.
///
/// The frozen encoder only handles shrunk bitmaps and reports a size of zero
/// otherwise. `raw` may be a frozen view, so it is never shrunk in place.
unsafe fn with_shrunk_copy<T>(
    raw: *const ffi::roaring64_bitmap_t,
    f: impl FnOnce(*const ffi::roaring64_bitmap_t) -> T,
) -> Option<T> {
    let copy = unsafe { ffi::roaring64_bitmap_copy(raw) };
    if copy.is_null() {
        return None;
    }
    unsafe { ffi::roaring64_bitmap_shrink_to_fit(copy) };
    let result = f(copy);
    unsafe { ffi::roaring64_bitmap_free(copy) };
    Some(result)
}
