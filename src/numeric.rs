//! Arrays of fixed-width elements

use std::fmt::{self, Debug, Formatter};

use num_complex::Complex;

use crate::array::{base_fingerprint, check_range, sample_step, ArrayId};
use crate::config::LARGEST_SUBARRAY;
use crate::element::{Element, RealElement};
use crate::error::{LargeArrayError, Result};
use crate::storage::{try_vec, Storage, StorageMode};
use crate::types::LargeArrayType;

/// A large array of fixed-width elements of representation `T`.
///
/// Short arrays keep their elements in a `Vec`, arrays longer than the
/// [large array threshold](crate::config::large_array_threshold) in a raw
/// region. Constant arrays hold a single value until they are first written.
pub struct NumericLargeArray<T: Element> {
    length: i64,
    storage: Storage<T>,
    id: ArrayId,
    parent: Option<ArrayId>,
}

pub(crate) fn check_length(length: i64) -> Result<usize> {
    if length < 0 {
        return Err(LargeArrayError::invalid(format!(
            "{} is not a nonnegative length",
            length
        )));
    }
    Ok(length as usize)
}

macro_rules! accessor_impl {
    ($(($get:ident, $set:ident, $get_data:ident, $get_data_range:ident, $ty:ty, $to:ident, $from:ident)),*) => {
        $(
            #[doc = concat!("Reads index `i` converted to `", stringify!($ty), "`.")]
            pub fn $get(&self, i: i64) -> Result<$ty> {
                Ok(self.get(i)?.$to())
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` converted to the stored representation.")]
            pub fn $set(&mut self, i: i64, value: $ty) -> Result<()> {
                let value = T::$from(value)?;
                self.set(i, value)
            }

            #[doc = concat!("Copies every element converted to `", stringify!($ty), "`, or `None` if the array is too long to fit one buffer.")]
            #[must_use]
            pub fn $get_data(&self) -> Option<Vec<$ty>> {
                self.extract_all(T::$to)
            }

            #[doc = concat!("Copies every `step`-th element of `start..end` converted to `", stringify!($ty), "`.")]
            pub fn $get_data_range(
                &self,
                buf: Option<Vec<$ty>>,
                start: i64,
                end: i64,
                step: i64,
            ) -> Result<Option<Vec<$ty>>> {
                self.extract(buf, start, end, step, T::$to)
            }
        )*
    };
}

impl<T: Element> NumericLargeArray<T> {
    pub(crate) fn with_storage(length: i64, storage: Storage<T>) -> Self {
        Self {
            length,
            storage,
            id: ArrayId::next(),
            parent: None,
        }
    }

    /// Creates a zero-filled array.
    pub fn new(length: i64) -> Result<Self> {
        Self::new_filled(length, T::default())
    }

    /// Creates an array, optionally skipping the zero fill. Raw regions are
    /// always initialized, so both forms read back as zero.
    pub fn new_with_zero_fill(length: i64, _zero_fill: bool) -> Result<Self> {
        Self::new(length)
    }

    /// Creates an array with every element set to `value`.
    pub fn new_filled(length: i64, value: T) -> Result<Self> {
        let len = check_length(length)?;
        Ok(Self::with_storage(length, Storage::filled(len, value)?))
    }

    /// Creates an array with every element set to `value`. With `constant`
    /// the array holds a single slot until it is first written.
    pub fn new_with_value(length: i64, value: T, constant: bool) -> Result<Self> {
        if constant {
            check_length(length)?;
            Ok(Self::with_storage(length, Storage::Constant(value)))
        } else {
            Self::new_filled(length, value)
        }
    }

    /// Creates a constant array of `length` copies of `value`.
    pub fn new_constant(length: i64, value: T) -> Result<Self> {
        Self::new_with_value(length, value, true)
    }

    /// Takes ownership of `items` without copying them.
    #[must_use]
    pub fn wrap(items: Vec<T>) -> Self {
        let length = items.len() as i64;
        Self::with_storage(length, Storage::Heap(items))
    }

    /// Takes ownership of `items`, moving them into raw storage if the
    /// length is above the large array threshold.
    pub fn from_vec(items: Vec<T>) -> Result<Self> {
        let length = items.len() as i64;
        Ok(Self::with_storage(length, Storage::from_vec(items)?))
    }

    /// Number of elements
    #[must_use]
    pub fn length(&self) -> i64 {
        self.length
    }

    /// Element kind of this array
    #[must_use]
    pub fn get_type(&self) -> LargeArrayType {
        T::TYPE
    }

    /// Current storage mode
    #[must_use]
    pub fn mode(&self) -> StorageMode {
        self.storage.mode()
    }

    /// True while the array is a constant that has never been written.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.mode() == StorageMode::Constant
    }

    /// True if the elements live in raw storage.
    #[must_use]
    pub fn is_large(&self) -> bool {
        self.mode() == StorageMode::Raw
    }

    /// Identifier that views use to refer to this array
    #[must_use]
    pub fn id(&self) -> ArrayId {
        self.id
    }

    /// The array this one is a view of, if any
    #[must_use]
    pub fn parent(&self) -> Option<ArrayId> {
        self.parent
    }

    /// Marks this array as a view of the array identified by `parent`.
    pub fn set_parent(&mut self, parent: Option<ArrayId>) {
        self.parent = parent;
    }

    pub(crate) fn check_index(&self, i: i64) -> Result<usize> {
        if i < 0 || i >= self.length {
            return Err(LargeArrayError::IndexOutOfRange {
                index: i,
                length: self.length,
            });
        }
        Ok(i as usize)
    }

    /// Reads the element at index `i`.
    pub fn get(&self, i: i64) -> Result<T> {
        let i = self.check_index(i)?;
        Ok(self.storage.get(i))
    }

    /// Writes the element at index `i`, materializing a constant array first.
    pub fn set(&mut self, i: i64, value: T) -> Result<()> {
        let i = self.check_index(i)?;
        let len = self.length as usize;
        self.storage.as_mut_slice(len)?[i] = value;
        Ok(())
    }

    /// Unchecked read for callers that iterate `0..length`.
    pub(crate) fn value(&self, i: usize) -> T {
        self.storage.get(i)
    }

    /// Mutable view of every element, materializing a constant array first.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        let len = self.length as usize;
        Ok(self.storage.as_mut_slice(len)?)
    }

    /// The stored elements, or `None` for a constant array.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[T]> {
        self.storage.as_slice()
    }

    /// Writes `value` after checking it lies in `0..=255`.
    pub fn set_unsigned_byte(&mut self, i: i64, value: i16) -> Result<()> {
        if !(0..=255).contains(&value) {
            return Err(LargeArrayError::invalid(format!(
                "{} is not in the range [0, 255]",
                value
            )));
        }
        let value = T::from_unsigned_byte(value as u8)?;
        self.set(i, value)
    }

    /// Reads index `i` as an unsigned byte.
    pub fn get_unsigned_byte(&self, i: i64) -> Result<u8> {
        Ok(self.get(i)?.to_unsigned_byte())
    }

    /// Copies every element, or `None` if the array is too long.
    #[must_use]
    pub fn get_data(&self) -> Option<Vec<T>> {
        self.extract_all(|v| v)
    }

    /// Copies every element as unsigned bytes, or `None` if the array is too
    /// long.
    #[must_use]
    pub fn get_unsigned_byte_data(&self) -> Option<Vec<u8>> {
        self.extract_all(T::to_unsigned_byte)
    }

    accessor_impl!(
        (get_boolean, set_boolean, get_boolean_data, get_boolean_data_range, bool, to_boolean, from_boolean),
        (get_byte, set_byte, get_byte_data, get_byte_data_range, i8, to_byte, from_byte),
        (get_short, set_short, get_short_data, get_short_data_range, i16, to_short, from_short),
        (get_int, set_int, get_int_data, get_int_data_range, i32, to_int, from_int),
        (get_long, set_long, get_long_data, get_long_data_range, i64, to_long, from_long),
        (get_float, set_float, get_float_data, get_float_data_range, f32, to_float, from_float),
        (get_double, set_double, get_double_data, get_double_data_range, f64, to_double, from_double)
    );

    pub(crate) fn extract_all<U>(&self, f: impl Fn(T) -> U) -> Option<Vec<U>> {
        if self.length > LARGEST_SUBARRAY {
            return None;
        }
        Some(match self.storage.as_slice() {
            Some(items) => items.iter().map(|&v| f(v)).collect(),
            None => (0..self.length as usize).map(|i| f(self.value(i))).collect(),
        })
    }

    pub(crate) fn extract<U>(
        &self,
        buf: Option<Vec<U>>,
        start: i64,
        end: i64,
        step: i64,
        f: impl Fn(T) -> U,
    ) -> Result<Option<Vec<U>>> {
        let count = match check_range(self.length, start, end, step)? {
            Some(count) => count,
            None => return Ok(None),
        };
        let indices = (start as usize..end as usize).step_by(step as usize);
        Ok(Some(match buf {
            Some(mut buf) if buf.len() >= count => {
                for (slot, i) in buf.iter_mut().zip(indices) {
                    *slot = f(self.value(i));
                }
                buf
            }
            _ => indices.map(|i| f(self.value(i))).collect(),
        }))
    }

    /// Allocates an independent copy. Constant arrays stay constant.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            length: self.length,
            storage: self.storage.try_clone()?,
            id: ArrayId::next(),
            parent: self.parent,
        })
    }

    /// Sampled fingerprint of the array; see [`LargeArray::hash_code`].
    ///
    /// [`LargeArray::hash_code`]: crate::LargeArray::hash_code
    pub fn hash_code(&self, quality: f32) -> Result<i32> {
        let mut fprint = base_fingerprint(T::TYPE, self.length, self.is_constant(), self.parent, quality)?
            .wrapping_mul(29);
        if let Some(step) = sample_step(self.length, quality) {
            for i in (0..self.length as usize).step_by(step) {
                fprint = fprint.wrapping_mul(31).wrapping_add(self.value(i).fingerprint());
            }
        }
        Ok(fprint)
    }
}

impl<T: Element> PartialEq for NumericLargeArray<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length || self.parent != other.parent {
            return false;
        }
        match (&self.storage, &other.storage) {
            (Storage::Constant(a), Storage::Constant(b)) => a.same(*b),
            _ => (0..self.length as usize).all(|i| self.value(i).same(other.value(i))),
        }
    }
}

impl<T: Element> Debug for NumericLargeArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 16;
        let shown = (self.length as usize).min(PREVIEW);
        let mut list = f.debug_list();
        for i in 0..shown {
            list.entry(&self.value(i));
        }
        if shown < self.length as usize {
            list.entry(&format_args!("... {} more", self.length as usize - shown));
        }
        list.finish()
    }
}

impl NumericLargeArray<bool> {
    fn combine(&self, other: &Self, op: impl Fn(bool, bool) -> bool) -> Result<Self> {
        if self.length != other.length {
            return Err(LargeArrayError::DimensionMismatch {
                expected: self.length,
                found: other.length,
            });
        }
        if let (Storage::Constant(a), Storage::Constant(b)) = (&self.storage, &other.storage) {
            return Self::new_constant(self.length, op(*a, *b));
        }
        let mut items = try_vec(self.length as usize, false)?;
        for (i, slot) in items.iter_mut().enumerate() {
            *slot = op(self.value(i), other.value(i));
        }
        Ok(Self::from_vec(items)?)
    }

    /// Elementwise conjunction
    pub fn and(&self, other: &Self) -> Result<Self> {
        self.combine(other, |a, b| a && b)
    }

    /// Elementwise disjunction
    pub fn or(&self, other: &Self) -> Result<Self> {
        self.combine(other, |a, b| a || b)
    }

    /// Elementwise exclusive or
    pub fn xor(&self, other: &Self) -> Result<Self> {
        self.combine(other, |a, b| a ^ b)
    }

    /// Elementwise negation
    pub fn not(&self) -> Result<Self> {
        self.combine(self, |a, _| !a)
    }
}

impl<T: RealElement> NumericLargeArray<Complex<T>>
where
    Complex<T>: Element,
{
    /// Builds an array from interleaved `[re, im, re, im, ...]` data.
    pub fn from_interleaved(data: Vec<T>) -> Result<Self> {
        if data.len() % 2 != 0 {
            return Err(LargeArrayError::invalid(
                "interleaved complex data must have an even length",
            ));
        }
        let items = data.chunks_exact(2).map(|c| Complex::new(c[0], c[1])).collect();
        Self::from_vec(items)
    }

    /// Builds an array from separate real and imaginary parts.
    pub fn from_parts(re: Vec<T>, im: Vec<T>) -> Result<Self> {
        if re.len() != im.len() {
            return Err(LargeArrayError::invalid(format!(
                "real part has {} elements but imaginary part has {}",
                re.len(),
                im.len()
            )));
        }
        let items = re.into_iter().zip(im).map(|(re, im)| Complex::new(re, im)).collect();
        Self::from_vec(items)
    }

    /// Reads the `(re, im)` pair at index `i`.
    pub fn get_complex(&self, i: i64) -> Result<Complex<T>> {
        self.get(i)
    }

    /// Writes the `(re, im)` pair at index `i`.
    pub fn set_complex(&mut self, i: i64, value: Complex<T>) -> Result<()> {
        self.set(i, value)
    }

    /// Copies every element as interleaved `[re, im, ...]` data, or `None`
    /// if twice the length does not fit one buffer.
    #[must_use]
    pub fn get_complex_data(&self) -> Option<Vec<T>> {
        let parts = match self.length.checked_mul(2) {
            Some(parts) if parts <= LARGEST_SUBARRAY => parts,
            _ => return None,
        };
        let mut out = Vec::with_capacity(parts as usize);
        for i in 0..self.length as usize {
            let c = self.value(i);
            out.push(c.re);
            out.push(c.im);
        }
        Some(out)
    }

    fn part_array(&self, f: impl Fn(Complex<T>) -> T) -> Result<NumericLargeArray<T>> {
        let mut res = match &self.storage {
            Storage::Constant(c) => return NumericLargeArray::new_constant(self.length, f(*c)),
            _ => NumericLargeArray::new(self.length)?,
        };
        for (i, slot) in res.as_mut_slice()?.iter_mut().enumerate() {
            *slot = f(self.value(i));
        }
        Ok(res)
    }

    /// Real parts as a real array of matching precision
    pub fn get_real_array(&self) -> Result<NumericLargeArray<T>> {
        self.part_array(|c| c.re)
    }

    /// Imaginary parts as a real array of matching precision
    pub fn get_imaginary_array(&self) -> Result<NumericLargeArray<T>> {
        self.part_array(|c| c.im)
    }

    /// Moduli as a real array of matching precision
    pub fn get_abs_array(&self) -> Result<NumericLargeArray<T>> {
        self.part_array(|c| {
            T::from_f64_lossy(crate::complex::abs(Complex::new(c.re.as_f64(), c.im.as_f64())))
        })
    }

    /// Arguments as a real array of matching precision
    pub fn get_arg_array(&self) -> Result<NumericLargeArray<T>> {
        self.part_array(|c| T::from_f64_lossy(c.im.as_f64().atan2(c.re.as_f64())))
    }
}
