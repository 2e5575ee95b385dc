/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use sync_cell_slice::SyncCell;

use super::AllocationError;

/// Number of bits of an offset addressing an element inside a page.
pub const PAGE_SHIFT: u32 = 18;
/// Number of elements in a page (256 Ki).
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;
/// Mask extracting the in-page part of an offset.
pub const PAGE_MASK: usize = PAGE_SIZE - 1;

/// Extracts the page index from a logical offset.
#[inline(always)]
pub fn page_index(offset: u64) -> usize {
    (offset >> PAGE_SHIFT) as usize
}

/// Extracts the index inside the page from a logical offset.
#[inline(always)]
pub fn index_in_page(offset: u64) -> usize {
    offset as usize & PAGE_MASK
}

/// Combines a page index and an in-page index into a logical offset.
#[inline(always)]
pub fn offset_in_pages(page: usize, index: usize) -> u64 {
    debug_assert!(index < PAGE_SIZE);
    ((page as u64) << PAGE_SHIFT) | index as u64
}

/// A fixed-size buffer owned by a [`BumpAllocator`].
///
/// During compression a page is written concurrently with other pages being
/// appended to the shared page array, so writes happen through a shared
/// reference; every implementation guarantees soundness under the discipline
/// that each element is written by exactly one thread and read only after
/// all writers are done (the same write-once-then-read discipline documented
/// by [`SyncCell`]).
///
/// Sealing turns a page into its read-only form, which the final adjacency
/// list owns.
pub trait Page: Sized + Send + Sync + 'static {
    /// The element type addressed by offsets into this page.
    type Elem: Copy + Default + Send + Sync;
    /// The read-only form of this page.
    type Sealed: Send + Sync;

    /// Allocates a zero-filled page of `len` elements.
    fn allocate(len: usize) -> Result<Self, AllocationError>;

    /// Returns the number of elements in this page.
    fn len(&self) -> usize;

    /// Returns true if this page has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies `data` into this page starting at `index`.
    ///
    /// # Panics
    ///
    /// If the copy would run past the end of the page.
    fn write(&self, index: usize, data: &[Self::Elem]);

    /// Consumes this page and returns its read-only form.
    fn seal(self) -> Self::Sealed;
}

/// An on-heap page of `T` elements.
///
/// Elements are held in [`SyncCell`]s while the page is writable, so that
/// concurrent workers can fill disjoint ranges of the same page array;
/// sealing unwraps the cells into a plain boxed slice.
pub struct HeapPage<T: Copy + Default + Send + Sync + 'static>(Box<[SyncCell<T>]>);

/// Pages backing variable-length byte encodings.
pub type BytePage = HeapPage<u8>;
/// Pages backing uncompressed 64-bit values.
pub type WordPage = HeapPage<u64>;

impl<T: Copy + Default + Send + Sync + 'static> Page for HeapPage<T> {
    type Elem = T;
    type Sealed = Box<[T]>;

    fn allocate(len: usize) -> Result<Self, AllocationError> {
        let boxed = vec![T::default(); len].into_boxed_slice();
        // SAFETY: SyncCell<T> is a transparent wrapper around Cell<T>, which
        // is a transparent wrapper around T, so the slice layouts coincide.
        let cells = unsafe { Box::from_raw(Box::into_raw(boxed) as *mut [SyncCell<T>]) };
        Ok(Self(cells))
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn write(&self, index: usize, data: &[T]) {
        let cells = &self.0[index..index + data.len()];
        for (cell, &value) in cells.iter().zip(data) {
            // SAFETY: each in-page range is written by a single thread and
            // read only after the build completes.
            unsafe { cell.set(value) };
        }
    }

    fn seal(self) -> Box<[T]> {
        // SAFETY: as in allocate, the layouts coincide.
        unsafe { Box::from_raw(Box::into_raw(self.0) as *mut [T]) }
    }
}

/// A bump allocator over a growable, ordered sequence of [pages](Page).
///
/// The allocator owns the page array; growth is guarded by a mutex, while
/// page indices are claimed with an atomic counter, so the normal allocation
/// path contends on the lock only when the array must actually grow.
///
/// Threads do not allocate directly through this type: they obtain a
/// [`LocalAllocator`] (or a [`PositionalAllocator`] for aligned replay) and
/// go through that.
pub struct BumpAllocator<P: Page> {
    pages: Mutex<Vec<Option<Arc<P>>>>,
    allocated_pages: AtomicUsize,
}

impl<P: Page> Default for BumpAllocator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Page> BumpAllocator<P> {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(Vec::new()),
            allocated_pages: AtomicUsize::new(0),
        }
    }

    /// Returns a new thread-local allocator. Not thread-safe: one per worker.
    pub fn local_allocator(&self) -> LocalAllocator<'_, P> {
        LocalAllocator {
            allocator: self,
            page: None,
            page_index: 0,
            offset: PAGE_SIZE,
            top: 0,
        }
    }

    /// Returns a new positional allocator replaying offsets produced by
    /// another allocator.
    pub fn positional_allocator(&self) -> PositionalAllocator<'_, P> {
        PositionalAllocator {
            allocator: self,
            page: None,
        }
    }

    /// Returns the number of pages claimed so far.
    pub fn allocated_pages(&self) -> usize {
        self.allocated_pages.load(Ordering::Acquire)
    }

    /// Seals all pages and returns them in index order.
    ///
    /// Must be called exactly once, after all workers have dropped their
    /// local allocators.
    ///
    /// # Panics
    ///
    /// If a local allocator still holds a page of this allocator.
    pub fn into_pages(self) -> Vec<P::Sealed> {
        let pages = self.pages.into_inner().unwrap();
        pages
            .into_iter()
            .map(|page| {
                let page = page.expect("page slot claimed but never filled");
                Arc::try_unwrap(page)
                    .unwrap_or_else(|_| panic!("a local allocator is still alive"))
                    .seal()
            })
            .collect()
    }

    /// Claims the next page index and stores `page` there.
    fn insert_page(&self, page: P) -> (usize, Arc<P>) {
        let page = Arc::new(page);
        let index = self.allocated_pages.fetch_add(1, Ordering::AcqRel);
        let mut pages = self.pages.lock().unwrap();
        if pages.len() <= index {
            pages.resize_with(index + 1, || None);
        }
        debug_assert!(pages[index].is_none());
        pages[index] = Some(page.clone());
        (index, page)
    }

    /// Allocates a default-sized page and returns its index and a handle.
    fn insert_default_page(&self) -> Result<(usize, Arc<P>), AllocationError> {
        Ok(self.insert_page(P::allocate(PAGE_SIZE)?))
    }

    /// Copies `data` into a dedicated page of exactly `data.len()` elements
    /// and returns the starting offset of that page.
    fn insert_oversized_page(&self, data: &[P::Elem]) -> Result<u64, AllocationError> {
        let page = P::allocate(data.len())?;
        page.write(0, data);
        let (index, _) = self.insert_page(page);
        Ok(offset_in_pages(index, 0))
    }

    /// Returns the page at `index`, allocating a default-sized one if the
    /// slot is empty. Used by positional replay.
    fn page_at(&self, index: usize) -> Result<Arc<P>, AllocationError> {
        self.allocated_pages.fetch_max(index + 1, Ordering::AcqRel);
        let mut pages = self.pages.lock().unwrap();
        if pages.len() <= index {
            pages.resize_with(index + 1, || None);
        }
        if pages[index].is_none() {
            pages[index] = Some(Arc::new(P::allocate(PAGE_SIZE)?));
        }
        Ok(pages[index].as_ref().unwrap().clone())
    }

    /// Copies `data` into a dedicated page of exactly `data.len()` elements
    /// placed at the given page index. Used by positional replay of
    /// oversized allocations.
    fn place_oversized_at(&self, index: usize, data: &[P::Elem]) -> Result<(), AllocationError> {
        let page = P::allocate(data.len())?;
        page.write(0, data);
        self.allocated_pages.fetch_max(index + 1, Ordering::AcqRel);
        let mut pages = self.pages.lock().unwrap();
        if pages.len() <= index {
            pages.resize_with(index + 1, || None);
        }
        debug_assert!(pages[index].is_none());
        pages[index] = Some(Arc::new(page));
        Ok(())
    }
}

/// A thread-local bump allocator.
///
/// The bump offset is monotonically non-decreasing and allocations never
/// overlap, including across oversized pages. After an oversized allocation
/// the next normal allocation starts a fresh page.
pub struct LocalAllocator<'a, P: Page> {
    allocator: &'a BumpAllocator<P>,
    page: Option<Arc<P>>,
    page_index: usize,
    offset: usize,
    top: u64,
}

impl<P: Page> LocalAllocator<'_, P> {
    /// Copies `data` into page storage and returns the logical offset of the
    /// first element.
    pub fn insert(&mut self, data: &[P::Elem]) -> Result<u64, AllocationError> {
        let len = data.len();
        if len > PAGE_SIZE {
            let offset = self.allocator.insert_oversized_page(data)?;
            // The oversized page is full by construction: force a fresh page
            // on the next insertion.
            self.page = None;
            self.offset = PAGE_SIZE;
            self.top = offset + len as u64;
            return Ok(offset);
        }
        if self.page.is_none() || self.offset + len > PAGE_SIZE {
            let (index, page) = self.allocator.insert_default_page()?;
            self.page = Some(page);
            self.page_index = index;
            self.offset = 0;
        }
        let offset = offset_in_pages(self.page_index, self.offset);
        self.page.as_ref().unwrap().write(self.offset, data);
        self.offset += len;
        self.top = offset + len as u64;
        Ok(offset)
    }

    /// Returns the logical offset one past the last allocation.
    pub fn top(&self) -> u64 {
        self.top
    }
}

/// An allocator that writes at offsets previously returned by another
/// allocator over a different page array.
///
/// Used to keep parallel property streams aligned: the first stream
/// allocates through a [`LocalAllocator`], and every other stream replays
/// the returned offsets through its own `PositionalAllocator`, guaranteeing
/// that all streams of a given source share the same offset.
pub struct PositionalAllocator<'a, P: Page> {
    allocator: &'a BumpAllocator<P>,
    page: Option<(usize, Arc<P>)>,
}

impl<P: Page> PositionalAllocator<'_, P> {
    /// Copies `data` to the page and in-page position implied by `offset`.
    ///
    /// # Panics
    ///
    /// If the write would straddle a page boundary; positional writes must
    /// match a prior allocation, which never straddles.
    pub fn insert_at(&mut self, offset: u64, data: &[P::Elem]) -> Result<(), AllocationError> {
        let index = page_index(offset);
        let in_page = index_in_page(offset);
        if data.len() > PAGE_SIZE {
            assert_eq!(
                in_page, 0,
                "an oversized positional write must start a page"
            );
            self.allocator.place_oversized_at(index, data)?;
            self.page = None;
            return Ok(());
        }
        assert!(
            in_page + data.len() <= PAGE_SIZE,
            "a positional write must not straddle a page boundary"
        );
        let page = match &self.page {
            Some((cached_index, page)) if *cached_index == index => page.clone(),
            _ => {
                let page = self.allocator.page_at(index)?;
                self.page = Some((index, page.clone()));
                page
            }
        };
        page.write(in_page, data);
        Ok(())
    }
}
