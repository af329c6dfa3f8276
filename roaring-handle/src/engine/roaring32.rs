use std::ffi::{CStr, c_char};
use std::ptr;

use croaring_sys as ffi;

use super::{Engine, LazyEngine};
use crate::serialize::Format;

/// The 32-bit CRoaring engine (`roaring_bitmap_t`).
#[derive(Debug, Clone, Copy)]
pub enum Roaring32 {}

unsafe impl Engine for Roaring32 {
    type Value = u32;
    type Raw = ffi::roaring_bitmap_t;
    type RawCursor = ffi::roaring_uint32_iterator_t;
    type RawBulk = ffi::roaring_bulk_context_t;

    const BITS: u32 = 32;

    fn supports(_format: Format) -> bool {
        true
    }

    fn create(capacity: u32) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_create_with_capacity(capacity) }
    }

    fn from_range(start: u32, end: u32, step: u32) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_from_range(start as u64, end as u64, step) }
    }

    unsafe fn copy(raw: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_copy(raw) }
    }

    unsafe fn free(raw: *mut Self::Raw) {
        unsafe { ffi::roaring_bitmap_free(raw) }
    }

    unsafe fn add(raw: *mut Self::Raw, value: u32) {
        unsafe { ffi::roaring_bitmap_add(raw, value) }
    }

    unsafe fn add_checked(raw: *mut Self::Raw, value: u32) -> bool {
        unsafe { ffi::roaring_bitmap_add_checked(raw, value) }
    }

    unsafe fn remove(raw: *mut Self::Raw, value: u32) {
        unsafe { ffi::roaring_bitmap_remove(raw, value) }
    }

    unsafe fn remove_checked(raw: *mut Self::Raw, value: u32) -> bool {
        unsafe { ffi::roaring_bitmap_remove_checked(raw, value) }
    }

    unsafe fn add_many(raw: *mut Self::Raw, values: &[u32]) {
        unsafe { ffi::roaring_bitmap_add_many(raw, values.len(), values.as_ptr()) }
    }

    unsafe fn remove_many(raw: *mut Self::Raw, values: &[u32]) {
        unsafe { ffi::roaring_bitmap_remove_many(raw, values.len(), values.as_ptr()) }
    }

    unsafe fn add_range_closed(raw: *mut Self::Raw, min: u32, max: u32) {
        unsafe { ffi::roaring_bitmap_add_range_closed(raw, min, max) }
    }

    unsafe fn remove_range_closed(raw: *mut Self::Raw, min: u32, max: u32) {
        unsafe { ffi::roaring_bitmap_remove_range_closed(raw, min, max) }
    }

    unsafe fn contains(raw: *const Self::Raw, value: u32) -> bool {
        unsafe { ffi::roaring_bitmap_contains(raw, value) }
    }

    unsafe fn contains_range_closed(raw: *const Self::Raw, min: u32, max: u32) -> bool {
        unsafe { ffi::roaring_bitmap_contains_range(raw, min as u64, max as u64 + 1) }
    }

    unsafe fn cardinality(raw: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring_bitmap_get_cardinality(raw) }
    }

    unsafe fn is_empty(raw: *const Self::Raw) -> bool {
        unsafe { ffi::roaring_bitmap_is_empty(raw) }
    }

    unsafe fn minimum(raw: *const Self::Raw) -> u32 {
        unsafe { ffi::roaring_bitmap_minimum(raw) }
    }

    unsafe fn maximum(raw: *const Self::Raw) -> u32 {
        unsafe { ffi::roaring_bitmap_maximum(raw) }
    }

    unsafe fn rank(raw: *const Self::Raw, value: u32) -> u64 {
        unsafe { ffi::roaring_bitmap_rank(raw, value) }
    }

    unsafe fn select(raw: *const Self::Raw, index: u64) -> Option<u32> {
        let index = u32::try_from(index).ok()?;
        let mut element = 0u32;
        unsafe { ffi::roaring_bitmap_select(raw, index, &mut element) }.then_some(element)
    }

    unsafe fn flip_closed(raw: *const Self::Raw, min: u32, max: u32) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_flip(raw, min as u64, max as u64 + 1) }
    }

    unsafe fn flip_closed_inplace(raw: *mut Self::Raw, min: u32, max: u32) {
        unsafe { ffi::roaring_bitmap_flip_inplace(raw, min as u64, max as u64 + 1) }
    }

    unsafe fn and(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_and(lhs, rhs) }
    }

    unsafe fn or(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_or(lhs, rhs) }
    }

    unsafe fn xor(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_xor(lhs, rhs) }
    }

    unsafe fn andnot(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_andnot(lhs, rhs) }
    }

    unsafe fn and_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring_bitmap_and_inplace(lhs, rhs) }
    }

    unsafe fn or_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring_bitmap_or_inplace(lhs, rhs) }
    }

    unsafe fn xor_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring_bitmap_xor_inplace(lhs, rhs) }
    }

    unsafe fn andnot_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring_bitmap_andnot_inplace(lhs, rhs) }
    }

    unsafe fn and_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring_bitmap_and_cardinality(lhs, rhs) }
    }

    unsafe fn or_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring_bitmap_or_cardinality(lhs, rhs) }
    }

    unsafe fn xor_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring_bitmap_xor_cardinality(lhs, rhs) }
    }

    unsafe fn andnot_cardinality(lhs: *const Self::Raw, rhs: *const Self::Raw) -> u64 {
        unsafe { ffi::roaring_bitmap_andnot_cardinality(lhs, rhs) }
    }

    unsafe fn or_many(operands: &[*const Self::Raw]) -> *mut Self::Raw {
        let mut operands = operands.to_vec();
        unsafe { ffi::roaring_bitmap_or_many(operands.len(), operands.as_mut_ptr()) }
    }

    unsafe fn xor_many(operands: &[*const Self::Raw]) -> *mut Self::Raw {
        let mut operands = operands.to_vec();
        unsafe { ffi::roaring_bitmap_xor_many(operands.len(), operands.as_mut_ptr()) }
    }

    unsafe fn run_optimize(raw: *mut Self::Raw) -> bool {
        unsafe { ffi::roaring_bitmap_run_optimize(raw) }
    }

    unsafe fn remove_run_compression(raw: *mut Self::Raw) -> Option<bool> {
        Some(unsafe { ffi::roaring_bitmap_remove_run_compression(raw) })
    }

    unsafe fn shrink_to_fit(raw: *mut Self::Raw) -> usize {
        unsafe { ffi::roaring_bitmap_shrink_to_fit(raw) }
    }

    unsafe fn validate(raw: *const Self::Raw) -> Result<(), String> {
        let mut reason: *const c_char = ptr::null();
        if unsafe { ffi::roaring_bitmap_internal_validate(raw, &mut reason) } {
            return Ok(());
        }
        Err(unsafe { describe(reason) })
    }

    unsafe fn serialized_size(raw: *const Self::Raw, format: Format) -> usize {
        match format {
            Format::Normal => unsafe { ffi::roaring_bitmap_size_in_bytes(raw) },
            Format::Portable => unsafe { ffi::roaring_bitmap_portable_size_in_bytes(raw) },
            Format::Frozen => unsafe { ffi::roaring_bitmap_frozen_size_in_bytes(raw) },
        }
    }

    unsafe fn serialize(raw: *const Self::Raw, format: Format, out: *mut u8) {
        match format {
            Format::Normal => {
                unsafe { ffi::roaring_bitmap_serialize(raw, out.cast()) };
            }
            Format::Portable => {
                unsafe { ffi::roaring_bitmap_portable_serialize(raw, out.cast()) };
            }
            Format::Frozen => {
                unsafe { ffi::roaring_bitmap_frozen_serialize(raw, out.cast()) };
            }
        }
    }

    unsafe fn deserialize(format: Format, bytes: &[u8]) -> *mut Self::Raw {
        if bytes.is_empty() {
            return ptr::null_mut();
        }
        match format {
            Format::Normal => unsafe {
                ffi::roaring_bitmap_deserialize_safe(bytes.as_ptr().cast(), bytes.len())
            },
            Format::Portable => unsafe {
                ffi::roaring_bitmap_portable_deserialize_safe(bytes.as_ptr().cast(), bytes.len())
            },
            Format::Frozen => ptr::null_mut(),
        }
    }

    unsafe fn attach(format: Format, data: *const u8, len: usize) -> *mut Self::Raw {
        match format {
            Format::Frozen => unsafe {
                ffi::roaring_bitmap_frozen_view(data.cast(), len).cast_mut()
            },
            Format::Portable => {
                // The in-place parser trusts its input; bound it first.
                let size = unsafe { ffi::roaring_bitmap_portable_deserialize_size(data.cast(), len) };
                if size == 0 {
                    return ptr::null_mut();
                }
                unsafe { ffi::roaring_bitmap_portable_deserialize_frozen(data.cast()) }
            }
            Format::Normal => ptr::null_mut(),
        }
    }

    unsafe fn cursor_create(raw: *const Self::Raw) -> *mut Self::RawCursor {
        unsafe { ffi::roaring_iterator_create(raw) }
    }

    unsafe fn cursor_has_value(cursor: *const Self::RawCursor) -> bool {
        unsafe { (*cursor).has_value }
    }

    unsafe fn cursor_value(cursor: *const Self::RawCursor) -> u32 {
        unsafe { (*cursor).current_value }
    }

    unsafe fn cursor_advance(cursor: *mut Self::RawCursor) -> bool {
        unsafe { ffi::roaring_uint32_iterator_advance(cursor) }
    }

    unsafe fn cursor_free(cursor: *mut Self::RawCursor) {
        unsafe { ffi::roaring_uint32_iterator_free(cursor) }
    }

    fn bulk_context() -> Self::RawBulk {
        // The engine documents a zeroed context as the initial state.
        unsafe { std::mem::zeroed() }
    }

    unsafe fn add_bulk(raw: *mut Self::Raw, context: *mut Self::RawBulk, value: u32) {
        unsafe { ffi::roaring_bitmap_add_bulk(raw, context, value) }
    }
}

unsafe impl LazyEngine for Roaring32 {
    unsafe fn lazy_or(
        lhs: *const Self::Raw,
        rhs: *const Self::Raw,
        bitset_conversion: bool,
    ) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_lazy_or(lhs, rhs, bitset_conversion) }
    }

    unsafe fn lazy_or_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw, bitset_conversion: bool) {
        unsafe { ffi::roaring_bitmap_lazy_or_inplace(lhs, rhs, bitset_conversion) }
    }

    unsafe fn lazy_xor(lhs: *const Self::Raw, rhs: *const Self::Raw) -> *mut Self::Raw {
        unsafe { ffi::roaring_bitmap_lazy_xor(lhs, rhs) }
    }

    unsafe fn lazy_xor_inplace(lhs: *mut Self::Raw, rhs: *const Self::Raw) {
        unsafe { ffi::roaring_bitmap_lazy_xor_inplace(lhs, rhs) }
    }

    unsafe fn repair_after_lazy(raw: *mut Self::Raw) {
        unsafe { ffi::roaring_bitmap_repair_after_lazy(raw) }
    }
}

/// Copy an engine diagnostic out of its static C string.
pub(super) unsafe fn describe(reason: *const c_char) -> String {
    if reason.is_null() {
        return String::from("engine reported an invalid bitmap");
    }
    unsafe { CStr::from_ptr(reason) }.to_string_lossy().into_owned()
}
