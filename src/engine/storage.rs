//! Untyped component column storage.
//!
//! A [`Column`] owns the contiguous byte buffer holding one component's
//! values for one archetype, one element per row. Columns know their
//! element size and alignment, grow by doubling, and delete rows by
//! swap-remove only.
//!
//! ## Safety model
//!
//! * The buffer is allocated with an explicit [`Layout`] aligned for the
//!   element type, so typed views are always correctly aligned.
//! * Typed reinterpretation is gated on a `TypeId` equality check at the
//!   boundary; the unchecked variants document the caller's obligations.
//! * Elements are plain-old-data ([`Component`]), so byte copies fully
//!   transfer values and no drop glue runs on removal.
//!
//! ## Unsafe code
//!
//! This module contains `unsafe` for raw allocation, row byte copies, and
//! slice reinterpretation. Row arithmetic is bounds-checked with debug
//! assertions on every internal entry point.

use std::{
    alloc::{alloc, dealloc, handle_alloc_error, Layout},
    any::TypeId,
    mem::size_of,
    ptr::{self, NonNull},
    slice,
};

use crate::engine::component::{Component, TypeMeta};
use crate::engine::types::Mask;

/// Typed byte store for one component within one archetype.
///
/// ## Invariants
/// - `len * elem_size` bytes of the buffer are initialized.
/// - `cap >= len`; the buffer holds `cap * elem_size` bytes when
///   `cap > 0`, and is dangling otherwise.
/// - `bit` and `type_id` are immutable after construction.
pub struct Column {
    data: NonNull<u8>,
    cap: usize,
    len: usize,
    elem_size: usize,
    align: usize,
    bit: Mask,
    type_id: TypeId,
}

impl Column {
    /// Creates an empty column for the described component type.
    pub fn new(meta: &TypeMeta) -> Self {
        Self {
            data: NonNull::dangling(),
            cap: 0,
            len: 0,
            elem_size: meta.size,
            align: meta.align.max(1),
            bit: meta.bit,
            type_id: meta.type_id,
        }
    }

    /// Component bit this column stores.
    #[inline]
    pub fn bit(&self) -> Mask {
        self.bit
    }

    /// Runtime type of the stored elements.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Element size in bytes.
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Number of rows currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the column holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn layout_for(&self, cap: usize) -> Layout {
        Layout::from_size_align(cap * self.elem_size, self.align)
            .expect("column layout overflow")
    }

    /// Grows the buffer so it can hold at least `rows` rows.
    ///
    /// Growth doubles the capacity with a floor of 64 rows; existing rows
    /// are byte-copied into the new allocation.
    fn ensure(&mut self, rows: usize) {
        if self.elem_size == 0 || rows <= self.cap {
            return;
        }
        let new_cap = (self.cap * 2).max(rows).max(64);
        let new_layout = self.layout_for(new_cap);

        // SAFETY: the layout is non-zero (elem_size > 0, new_cap >= 64);
        // the old buffer, when present, was allocated with layout_for(cap).
        unsafe {
            let new_ptr = alloc(new_layout);
            if new_ptr.is_null() {
                handle_alloc_error(new_layout);
            }
            if self.cap > 0 {
                ptr::copy_nonoverlapping(
                    self.data.as_ptr(),
                    new_ptr,
                    self.len * self.elem_size,
                );
                dealloc(self.data.as_ptr(), self.layout_for(self.cap));
            }
            self.data = NonNull::new_unchecked(new_ptr);
        }
        self.cap = new_cap;
    }

    /// Reserves room for at least `additional` further rows.
    pub fn reserve(&mut self, additional: usize) {
        self.ensure(self.len + additional);
    }

    /// Appends one zero-initialized row.
    pub fn push_zeroed(&mut self) {
        self.ensure(self.len + 1);
        if self.elem_size > 0 {
            // SAFETY: ensure() guarantees capacity for row `len`; zeroed
            // bytes are a valid value for any Component (Zeroable).
            unsafe {
                ptr::write_bytes(
                    self.data.as_ptr().add(self.len * self.elem_size),
                    0,
                    self.elem_size,
                );
            }
        }
        self.len += 1;
    }

    /// Appends one row copied from `source[source_row]`.
    ///
    /// Both columns must store the same component type.
    pub fn push_from(&mut self, source: &Column, source_row: usize) {
        debug_assert_eq!(self.type_id, source.type_id);
        debug_assert_eq!(self.elem_size, source.elem_size);
        debug_assert!(source_row < source.len);
        self.ensure(self.len + 1);
        if self.elem_size > 0 {
            // SAFETY: source_row is in bounds of the initialized region;
            // the destination slot was just reserved. The columns are
            // distinct objects, so the regions cannot overlap.
            unsafe {
                ptr::copy_nonoverlapping(
                    source.data.as_ptr().add(source_row * self.elem_size),
                    self.data.as_ptr().add(self.len * self.elem_size),
                    self.elem_size,
                );
            }
        }
        self.len += 1;
    }

    /// Overwrites a row with raw component bytes.
    pub fn write_row(&mut self, row: usize, bytes: &[u8]) {
        debug_assert!(row < self.len);
        debug_assert_eq!(bytes.len(), self.elem_size);
        if self.elem_size > 0 {
            // SAFETY: row is within the initialized region and `bytes`
            // has exactly elem_size bytes.
            unsafe {
                ptr::copy_nonoverlapping(
                    bytes.as_ptr(),
                    self.data.as_ptr().add(row * self.elem_size),
                    self.elem_size,
                );
            }
        }
    }

    /// Deletes a row by overwriting it with the last row and shrinking.
    ///
    /// The only supported deletion policy; row order is not preserved.
    pub fn swap_remove(&mut self, row: usize) {
        debug_assert!(row < self.len);
        let last = self.len - 1;
        if self.elem_size > 0 && row != last {
            // SAFETY: both rows are within the initialized region and
            // distinct, so the ranges do not overlap.
            unsafe {
                ptr::copy_nonoverlapping(
                    self.data.as_ptr().add(last * self.elem_size),
                    self.data.as_ptr().add(row * self.elem_size),
                    self.elem_size,
                );
            }
        }
        self.len = last;
    }

    #[inline]
    fn typed_ptr<T>(&self) -> *const T {
        if size_of::<T>() == 0 || self.cap == 0 {
            NonNull::<T>::dangling().as_ptr()
        } else {
            self.data.as_ptr() as *const T
        }
    }

    /// Returns a typed view of the column, or `None` on a type mismatch.
    ///
    /// The view is empty when the column holds no rows.
    #[inline]
    pub fn as_slice<T: Component>(&self) -> Option<&[T]> {
        if TypeId::of::<T>() != self.type_id {
            return None;
        }
        debug_assert_eq!(size_of::<T>(), self.elem_size);
        // SAFETY: the type check above guarantees the buffer was written
        // as T values; the allocation is aligned for T and `len` elements
        // are initialized. ZST and empty columns use a dangling,
        // well-aligned pointer.
        Some(unsafe { slice::from_raw_parts(self.typed_ptr::<T>(), self.len) })
    }

    /// Returns a mutable typed view of the column, or `None` on a type
    /// mismatch.
    #[inline]
    pub fn as_slice_mut<T: Component>(&mut self) -> Option<&mut [T]> {
        if TypeId::of::<T>() != self.type_id {
            return None;
        }
        debug_assert_eq!(size_of::<T>(), self.elem_size);
        // SAFETY: as for as_slice, plus exclusive access through &mut self.
        Some(unsafe {
            slice::from_raw_parts_mut(self.typed_ptr::<T>() as *mut T, self.len)
        })
    }

    /// Returns a typed view without checking the element type.
    ///
    /// ## Safety
    /// `T` must be the exact type this column was created for. No check
    /// is performed in release builds; a mismatch reinterprets component
    /// bytes as the wrong type.
    #[inline]
    pub unsafe fn as_slice_unchecked<T: Component>(&self) -> &[T] {
        debug_assert_eq!(TypeId::of::<T>(), self.type_id);
        // SAFETY: caller guarantees the type; layout and initialization
        // invariants are the column's own.
        unsafe { slice::from_raw_parts(self.typed_ptr::<T>(), self.len) }
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if self.elem_size > 0 && self.cap > 0 {
            // SAFETY: the buffer was allocated with this exact layout.
            // Elements are Pod, so no per-element drop is needed.
            unsafe {
                dealloc(self.data.as_ptr(), self.layout_for(self.cap));
            }
        }
    }
}

// SAFETY: Column exclusively owns its allocation and hands out references
// only under Rust's usual borrow rules.
unsafe impl Send for Column {}
// SAFETY: shared access is read-only byte access.
unsafe impl Sync for Column {}
