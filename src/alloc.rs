//! Module for fallible allocation of raw regions

use std::alloc::{alloc, dealloc, Layout};
use std::error::Error;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use tracing::trace;

use crate::memory_counter;

/// Error type for fallible allocation
/// This error is returned when an allocation fails.
/// It does not contain any additional information.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct AllocError;

impl Error for AllocError {}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

/// An owned region of `len` initialized values obtained directly from the
/// allocator.
///
/// The region is registered with the memory counter when it is created and
/// unregistered exactly once when the buffer is dropped.
pub(crate) struct RawBuffer<T> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
    _marker: PhantomData<T>,
}

// Safety: the buffer exclusively owns its region, like a `Box<[T]>`.
unsafe impl<T: Send> Send for RawBuffer<T> {}
unsafe impl<T: Sync> Sync for RawBuffer<T> {}

impl<T: Copy> RawBuffer<T> {
    fn layout(len: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(len).map_err(|_| AllocError)
    }

    /// Reserves space for `len` values without initializing it.
    fn allocate(len: usize) -> Result<Self, AllocError> {
        let layout = Self::layout(len)?;
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // Safety: the layout has a non-zero size
            NonNull::new(unsafe { alloc(layout) }.cast::<T>()).ok_or(AllocError)?
        };
        let total = memory_counter::increase(layout.size() as u64);
        trace!(bytes = layout.size(), total, "allocated raw region");
        Ok(Self {
            ptr,
            len,
            layout,
            _marker: PhantomData,
        })
    }

    /// Allocates a region holding `len` copies of `value`.
    pub(crate) fn filled(len: usize, value: T) -> Result<Self, AllocError> {
        let res = Self::allocate(len)?;
        unsafe {
            // Safety: we reserved space for exactly `len` values
            for i in 0..len {
                res.ptr.as_ptr().add(i).write(value);
            }
        }
        Ok(res)
    }

    /// Allocates a region holding a copy of `items`.
    pub(crate) fn from_slice(items: &[T]) -> Result<Self, AllocError> {
        let res = Self::allocate(items.len())?;
        unsafe {
            // Safety: the regions cannot overlap since one was just allocated
            ptr::copy_nonoverlapping(items.as_ptr(), res.ptr.as_ptr(), items.len());
        }
        Ok(res)
    }

    /// Allocates an independent copy of this region.
    pub(crate) fn try_clone(&self) -> Result<Self, AllocError> {
        Self::from_slice(self.as_slice())
    }
}

impl<T> RawBuffer<T> {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Size of the region in bytes
    pub(crate) fn byte_size(&self) -> usize {
        self.layout.size()
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        // Safety: every value in the region was initialized on allocation
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: as above, and `&mut self` guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            unsafe {
                // Safety: the region was allocated with this exact layout
                dealloc(self.ptr.as_ptr().cast(), self.layout);
            }
        }
        let total = memory_counter::decrease(self.layout.size() as u64);
        trace!(bytes = self.layout.size(), total, "released raw region");
    }
}

impl<T: Debug> Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("len", &self.len)
            .field("bytes", &self.layout.size())
            .finish()
    }
}
