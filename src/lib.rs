//! Arrays addressable by 64-bit indices.
//!
//! A [`LargeArray`] holds elements of one [`LargeArrayType`]: booleans,
//! signed and unsigned integers, real and complex floating point numbers,
//! strings or JSON objects. Arrays whose length is above
//! [`config::large_array_threshold`] are backed by raw memory outside the
//! regular heap, and an array created as a constant stores a single value
//! until it is first written.
//!
//! Elementwise arithmetic lives in [`arithmetic`] and is driven by the
//! operator engine in [`operator`], which spreads long evaluations over a
//! worker pool. [`utils`] provides creation, conversion, copying and
//! selection helpers. Arrays can be written to and read from byte streams
//! ([`LargeArray::write_to`]) and serialized with serde.
#![warn(missing_docs)]
#![deny(missing_debug_implementations)]

mod alloc;
pub mod arithmetic;
mod array;
pub mod complex;
pub mod config;
mod element;
mod error;
pub mod memory_counter;
mod numeric;
mod object;
pub mod operator;
mod ser;
mod storage;
mod stream;
mod string;
mod types;
pub mod utils;
mod varlen;

pub use alloc::AllocError;
pub use array::{ArrayId, LargeArray};
pub use element::{Element, RealElement};
pub use error::{LargeArrayError, Result};
pub use numeric::NumericLargeArray;
pub use object::ObjectLargeArray;
pub use operator::{evaluate, result_type, LargeArrayOperator};
pub use storage::StorageMode;
pub use string::StringLargeArray;
pub use types::LargeArrayType;
pub use varlen::{VarElement, VarLengthLargeArray};

#[cfg(test)]
#[global_allocator]
static ALLOCATOR: mockalloc::Mockalloc<std::alloc::System> =
    mockalloc::Mockalloc(std::alloc::System);
