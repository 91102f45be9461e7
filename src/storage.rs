//! Backing store shared by the fixed-width array kinds

use tracing::debug;

use crate::alloc::{AllocError, RawBuffer};
use crate::config;

/// How an array currently holds its elements
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StorageMode {
    /// An owned `Vec`
    Heap,
    /// A region obtained directly from the allocator
    Raw,
    /// A single value standing in for every index
    Constant,
}

/// Returns true when arrays of `len` elements must live in raw storage.
pub(crate) fn needs_raw(len: usize) -> bool {
    len as u64 > config::large_array_threshold() as u64
}

/// Allocates a `Vec` of `len` copies of `value`, reporting failure instead
/// of aborting.
pub(crate) fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>, AllocError> {
    let mut items = Vec::new();
    items.try_reserve_exact(len).map_err(|_| AllocError)?;
    items.resize(len, value);
    Ok(items)
}

pub(crate) enum Storage<T> {
    Heap(Vec<T>),
    Raw(RawBuffer<T>),
    Constant(T),
}

impl<T: Copy> Storage<T> {
    /// Chooses heap or raw storage for `len` copies of `value`.
    pub(crate) fn filled(len: usize, value: T) -> Result<Self, AllocError> {
        if needs_raw(len) {
            Ok(Self::Raw(RawBuffer::filled(len, value)?))
        } else {
            Ok(Self::Heap(try_vec(len, value)?))
        }
    }

    /// Takes ownership of `items`, moving them to raw storage when the
    /// length calls for it.
    pub(crate) fn from_vec(items: Vec<T>) -> Result<Self, AllocError> {
        if needs_raw(items.len()) {
            Ok(Self::Raw(RawBuffer::from_slice(&items)?))
        } else {
            Ok(Self::Heap(items))
        }
    }

    pub(crate) fn mode(&self) -> StorageMode {
        match self {
            Self::Heap(_) => StorageMode::Heap,
            Self::Raw(_) => StorageMode::Raw,
            Self::Constant(_) => StorageMode::Constant,
        }
    }

    /// Reads index `i`, which the caller has already bounds checked.
    pub(crate) fn get(&self, i: usize) -> T {
        match self {
            Self::Heap(items) => items[i],
            Self::Raw(buf) => buf.as_slice()[i],
            Self::Constant(value) => *value,
        }
    }

    /// The stored elements, unless the storage is constant.
    pub(crate) fn as_slice(&self) -> Option<&[T]> {
        match self {
            Self::Heap(items) => Some(items),
            Self::Raw(buf) => Some(buf.as_slice()),
            Self::Constant(_) => None,
        }
    }

    /// Replaces constant storage with `len` real copies of the constant.
    /// Does nothing for any other storage.
    pub(crate) fn materialize(&mut self, len: usize) -> Result<(), AllocError> {
        if let Self::Constant(value) = *self {
            *self = Self::filled(len, value)?;
            debug!(len, mode = ?self.mode(), "materialized constant array");
        }
        Ok(())
    }

    /// Mutable view of the elements, materializing constant storage first.
    pub(crate) fn as_mut_slice(&mut self, len: usize) -> Result<&mut [T], AllocError> {
        self.materialize(len)?;
        Ok(match self {
            Self::Heap(items) => items.as_mut_slice(),
            Self::Raw(buf) => buf.as_mut_slice(),
            Self::Constant(_) => &mut [],
        })
    }

    pub(crate) fn try_clone(&self) -> Result<Self, AllocError> {
        Ok(match self {
            Self::Heap(items) => {
                let mut copy = Vec::new();
                copy.try_reserve_exact(items.len()).map_err(|_| AllocError)?;
                copy.extend_from_slice(items);
                Self::Heap(copy)
            }
            Self::Raw(buf) => Self::Raw(buf.try_clone()?),
            Self::Constant(value) => Self::Constant(*value),
        })
    }
}
