/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::ptr;
use std::slice;

use super::{AllocationError, Page};

/// An off-heap page: a raw allocation together with its byte count.
///
/// Bit-packed adjacency data is stored off heap; the adjacency list owning
/// the pages releases them deterministically at teardown by dropping them.
/// A null pointer is the sentinel for a freed page: reading a freed page and
/// freeing a page twice are both fatal errors.
pub struct Address {
    ptr: *mut u8,
    bytes: usize,
}

// SAFETY: the allocation is plain memory; all concurrent access goes through
// the disjoint-range write discipline of [`Page`].
unsafe impl Send for Address {}
unsafe impl Sync for Address {}

impl Address {
    /// Allocates `bytes` zero-filled bytes of native memory.
    pub fn new(bytes: usize) -> Result<Self, AllocationError> {
        // SAFETY: a plain allocation; failure is handled below.
        let ptr = unsafe { libc::calloc(bytes.max(1), 1) } as *mut u8;
        if ptr.is_null() {
            return Err(AllocationError::NativeAllocation(bytes));
        }
        Ok(Self { ptr, bytes })
    }

    /// Returns the number of bytes of this page.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the page contents.
    ///
    /// # Panics
    ///
    /// If the page has been freed.
    pub fn as_slice(&self) -> &[u8] {
        assert!(!self.ptr.is_null(), "read of a freed off-heap page");
        // SAFETY: the pointer is live and covers `bytes` bytes.
        unsafe { slice::from_raw_parts(self.ptr, self.bytes) }
    }

    /// Releases the native memory of this page.
    ///
    /// # Panics
    ///
    /// If the page has already been freed.
    pub fn free(&mut self) {
        assert!(!self.ptr.is_null(), "double free of an off-heap page");
        // SAFETY: the pointer was returned by calloc and not yet freed.
        unsafe { libc::free(self.ptr as *mut libc::c_void) };
        self.ptr = ptr::null_mut();
    }
}

impl Drop for Address {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            self.free();
        }
    }
}

impl Page for Address {
    type Elem = u8;
    type Sealed = Address;

    fn allocate(len: usize) -> Result<Self, AllocationError> {
        Address::new(len)
    }

    fn len(&self) -> usize {
        self.bytes
    }

    fn write(&self, index: usize, data: &[u8]) {
        assert!(!self.ptr.is_null(), "write to a freed off-heap page");
        assert!(index + data.len() <= self.bytes);
        // SAFETY: the range is in bounds and written by a single thread.
        unsafe { ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(index), data.len()) };
    }

    fn seal(self) -> Address {
        self
    }
}
