//! Functionality relating to the dynamically typed large array

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use num_complex::Complex;
use serde_json::Value;

use crate::config::LARGEST_SUBARRAY;
use crate::element::Element;
use crate::error::{LargeArrayError, Result};
use crate::numeric::NumericLargeArray;
use crate::object::ObjectLargeArray;
use crate::storage::StorageMode;
use crate::string::StringLargeArray;
use crate::types::LargeArrayType;

/// Process-unique identity of an array, used as the parent handle of views.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayId(u64);

impl ArrayId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ArrayId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    fn fingerprint(self) -> i32 {
        (self.0 ^ (self.0 >> 32)) as i32
    }
}

/// Validates a bulk extraction range and returns the number of elements it
/// selects, or `None` if they would not fit one buffer.
pub(crate) fn check_range(length: i64, start: i64, end: i64, step: i64) -> Result<Option<usize>> {
    if start < 0 || start >= length {
        return Err(LargeArrayError::IndexOutOfRange {
            index: start,
            length,
        });
    }
    if end < 0 || end > length || end < start {
        return Err(LargeArrayError::IndexOutOfRange { index: end, length });
    }
    if step < 1 {
        return Err(LargeArrayError::invalid(format!("step {} is not positive", step)));
    }
    let span = end - start;
    let count = span / step + i64::from(span % step != 0);
    if count > LARGEST_SUBARRAY {
        return Ok(None);
    }
    Ok(Some(count as usize))
}

/// Fingerprint of the attributes every array kind shares.
pub(crate) fn base_fingerprint(
    element_type: LargeArrayType,
    length: i64,
    constant: bool,
    parent: Option<ArrayId>,
    quality: f32,
) -> Result<i32> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(LargeArrayError::invalid(
            "the quality argument should be between 0 and 1",
        ));
    }
    let mut fprint: i32 = 7;
    fprint = fprint.wrapping_mul(29).wrapping_add(i32::from(element_type.ordinal()));
    fprint = fprint
        .wrapping_mul(29)
        .wrapping_add((length ^ ((length as u64) >> 32) as i64) as i32);
    fprint = fprint.wrapping_mul(29).wrapping_add(i32::from(constant));
    fprint = fprint
        .wrapping_mul(29)
        .wrapping_add(parent.map_or(0, ArrayId::fingerprint));
    Ok(fprint)
}

/// Distance between sampled elements for a hash of the given quality, or
/// `None` if no element is sampled.
pub(crate) fn sample_step(length: i64, quality: f32) -> Option<usize> {
    if quality <= 0.0 {
        return None;
    }
    let step = ((1 - length) as f32 * quality + length as f32).ceil() as i64;
    Some(step.max(1) as usize)
}

/// A large array of any element kind.
///
/// Every kind answers the full set of typed accessors. Fixed-width kinds
/// convert between representations; string arrays report string lengths
/// and store decimal text; object arrays reject numeric access with
/// [`UnsupportedOperation`](LargeArrayError::UnsupportedOperation).
#[derive(Debug, PartialEq)]
pub enum LargeArray {
    /// Boolean elements
    Logic(NumericLargeArray<bool>),
    /// `i8` elements
    Byte(NumericLargeArray<i8>),
    /// `u8` elements
    UnsignedByte(NumericLargeArray<u8>),
    /// `i16` elements
    Short(NumericLargeArray<i16>),
    /// `i32` elements
    Int(NumericLargeArray<i32>),
    /// `i64` elements
    Long(NumericLargeArray<i64>),
    /// `f32` elements
    Float(NumericLargeArray<f32>),
    /// `f64` elements
    Double(NumericLargeArray<f64>),
    /// `Complex<f32>` elements
    ComplexFloat(NumericLargeArray<Complex<f32>>),
    /// `Complex<f64>` elements
    ComplexDouble(NumericLargeArray<Complex<f64>>),
    /// Optional string elements
    String(StringLargeArray),
    /// JSON value elements
    Object(ObjectLargeArray),
}

impl Eq for LargeArray {}

macro_rules! dispatch {
    ($self:expr, $a:ident => $body:expr) => {
        match $self {
            LargeArray::Logic($a) => $body,
            LargeArray::Byte($a) => $body,
            LargeArray::UnsignedByte($a) => $body,
            LargeArray::Short($a) => $body,
            LargeArray::Int($a) => $body,
            LargeArray::Long($a) => $body,
            LargeArray::Float($a) => $body,
            LargeArray::Double($a) => $body,
            LargeArray::ComplexFloat($a) => $body,
            LargeArray::ComplexDouble($a) => $body,
            LargeArray::String($a) => $body,
            LargeArray::Object($a) => $body,
        }
    };
}

/// Like `dispatch!`, but object arrays fail with `UnsupportedOperation`.
macro_rules! dispatch_views {
    ($self:expr, $op:expr, $a:ident => $body:expr) => {
        match $self {
            LargeArray::Logic($a) => $body,
            LargeArray::Byte($a) => $body,
            LargeArray::UnsignedByte($a) => $body,
            LargeArray::Short($a) => $body,
            LargeArray::Int($a) => $body,
            LargeArray::Long($a) => $body,
            LargeArray::Float($a) => $body,
            LargeArray::Double($a) => $body,
            LargeArray::ComplexFloat($a) => $body,
            LargeArray::ComplexDouble($a) => $body,
            LargeArray::String($a) => $body,
            LargeArray::Object(_) => Err(LargeArrayError::unsupported($op, LargeArrayType::Object)),
        }
    };
}

/// Dispatch over the fixed-width kinds only.
macro_rules! dispatch_numeric {
    ($self:expr, $op:expr, $a:ident => $body:expr) => {
        match $self {
            LargeArray::Logic($a) => $body,
            LargeArray::Byte($a) => $body,
            LargeArray::UnsignedByte($a) => $body,
            LargeArray::Short($a) => $body,
            LargeArray::Int($a) => $body,
            LargeArray::Long($a) => $body,
            LargeArray::Float($a) => $body,
            LargeArray::Double($a) => $body,
            LargeArray::ComplexFloat($a) => $body,
            LargeArray::ComplexDouble($a) => $body,
            other => Err(LargeArrayError::unsupported($op, other.get_type())),
        }
    };
}

macro_rules! from_impl {
    ($(($ty:ty, $variant:ident)),*) => {
        $(impl From<NumericLargeArray<$ty>> for LargeArray {
            fn from(array: NumericLargeArray<$ty>) -> Self {
                LargeArray::$variant(array)
            }
        })*
    };
}

from_impl!(
    (bool, Logic),
    (i8, Byte),
    (u8, UnsignedByte),
    (i16, Short),
    (i32, Int),
    (i64, Long),
    (f32, Float),
    (f64, Double),
    (Complex<f32>, ComplexFloat),
    (Complex<f64>, ComplexDouble)
);

impl From<StringLargeArray> for LargeArray {
    fn from(array: StringLargeArray) -> Self {
        LargeArray::String(array)
    }
}

impl From<ObjectLargeArray> for LargeArray {
    fn from(array: ObjectLargeArray) -> Self {
        LargeArray::Object(array)
    }
}

macro_rules! view_impl {
    ($(($get:ident, $set:ident, $get_data:ident, $get_data_range:ident, $ty:ty)),*) => {
        $(
            #[doc = concat!("Reads index `i` as `", stringify!($ty), "`.")]
            pub fn $get(&self, i: i64) -> Result<$ty> {
                dispatch_views!(self, stringify!($get), a => a.$get(i))
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` at index `i`.")]
            pub fn $set(&mut self, i: i64, value: $ty) -> Result<()> {
                dispatch_views!(self, stringify!($set), a => a.$set(i, value))
            }

            #[doc = concat!("Copies every element as `", stringify!($ty), "`. The inner `None` means the array is too long for one buffer.")]
            pub fn $get_data(&self) -> Result<Option<Vec<$ty>>> {
                dispatch_views!(self, stringify!($get_data), a => Ok(a.$get_data()))
            }

            #[doc = concat!("Copies every `step`-th element of `start..end` as `", stringify!($ty), "`, reusing `buf` when it is large enough.")]
            pub fn $get_data_range(
                &self,
                buf: Option<Vec<$ty>>,
                start: i64,
                end: i64,
                step: i64,
            ) -> Result<Option<Vec<$ty>>> {
                dispatch_views!(self, stringify!($get_data_range), a => a.$get_data_range(buf, start, end, step))
            }
        )*
    };
}

macro_rules! new_impl {
    ($ty:expr, $numeric:ident => $make:expr, $string:expr, $object:expr) => {
        match $ty {
            LargeArrayType::Logic => { type $numeric = bool; $make.map(LargeArray::from) }
            LargeArrayType::Byte => { type $numeric = i8; $make.map(LargeArray::from) }
            LargeArrayType::UnsignedByte => { type $numeric = u8; $make.map(LargeArray::from) }
            LargeArrayType::Short => { type $numeric = i16; $make.map(LargeArray::from) }
            LargeArrayType::Int => { type $numeric = i32; $make.map(LargeArray::from) }
            LargeArrayType::Long => { type $numeric = i64; $make.map(LargeArray::from) }
            LargeArrayType::Float => { type $numeric = f32; $make.map(LargeArray::from) }
            LargeArrayType::Double => { type $numeric = f64; $make.map(LargeArray::from) }
            LargeArrayType::ComplexFloat => { type $numeric = Complex<f32>; $make.map(LargeArray::from) }
            LargeArrayType::ComplexDouble => { type $numeric = Complex<f64>; $make.map(LargeArray::from) }
            LargeArrayType::String => $string.map(LargeArray::from),
            LargeArrayType::Object => $object.map(LargeArray::from),
        }
    };
}

impl LargeArray {
    /// Creates an array of `length` zero (or unset) elements.
    pub fn new(element_type: LargeArrayType, length: i64) -> Result<Self> {
        new_impl!(
            element_type,
            E => NumericLargeArray::<E>::new(length),
            StringLargeArray::with_length(length),
            ObjectLargeArray::with_length(length)
        )
    }

    /// Creates a constant array of `length` copies of `value` converted to
    /// the element kind. String arrays store the decimal text of `value`.
    pub fn new_constant(element_type: LargeArrayType, length: i64, value: f64) -> Result<Self> {
        if element_type == LargeArrayType::Object {
            return Err(LargeArrayError::unsupported("new_constant", element_type));
        }
        new_impl!(
            element_type,
            E => E::from_double(value).and_then(|v| NumericLargeArray::<E>::new_constant(length, v)),
            StringLargeArray::new_with_value(
                length,
                crate::config::DEFAULT_MAX_STRING_LENGTH,
                Some(value.to_string()),
                true
            ),
            ObjectLargeArray::with_length(length)
        )
    }

    /// Element kind of this array
    #[must_use]
    pub fn get_type(&self) -> LargeArrayType {
        dispatch!(self, a => a.get_type())
    }

    /// Number of elements
    #[must_use]
    pub fn length(&self) -> i64 {
        dispatch!(self, a => a.length())
    }

    /// Current storage mode
    #[must_use]
    pub fn mode(&self) -> StorageMode {
        dispatch!(self, a => a.mode())
    }

    /// True while the array is a constant that has never been written.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        dispatch!(self, a => a.is_constant())
    }

    /// True if the elements live in raw storage.
    #[must_use]
    pub fn is_large(&self) -> bool {
        dispatch!(self, a => a.is_large())
    }

    /// True for the kinds the arithmetic engine accepts
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.get_type().is_numeric_type()
    }

    /// Identity of this array
    #[must_use]
    pub fn id(&self) -> ArrayId {
        dispatch!(self, a => a.id())
    }

    /// Identity of the array this one is a view of
    #[must_use]
    pub fn parent(&self) -> Option<ArrayId> {
        dispatch!(self, a => a.parent())
    }

    /// Records `parent` as the array this one is a view of. Arrays with
    /// different parents never compare equal.
    pub fn set_parent(&mut self, parent: Option<&LargeArray>) {
        let parent = parent.map(LargeArray::id);
        dispatch!(self, a => a.set_parent(parent))
    }

    /// Allocates an independent copy. Constant arrays stay constant.
    pub fn try_clone(&self) -> Result<Self> {
        dispatch!(self, a => a.try_clone().map(LargeArray::from))
    }

    /// Approximate hash sampling a `quality` fraction of the elements, with
    /// `quality` between 0 and 1. A quality of 1 visits every element and 0
    /// only the shared attributes.
    pub fn hash_code(&self, quality: f32) -> Result<i32> {
        dispatch!(self, a => a.hash_code(quality))
    }

    /// Writes an unsigned byte after checking it lies in `0..=255`.
    pub fn set_unsigned_byte(&mut self, i: i64, value: i16) -> Result<()> {
        dispatch_views!(self, "set_unsigned_byte", a => a.set_unsigned_byte(i, value))
    }

    /// Reads index `i` as an unsigned byte.
    pub fn get_unsigned_byte(&self, i: i64) -> Result<u8> {
        dispatch_views!(self, "get_unsigned_byte", a => a.get_unsigned_byte(i))
    }

    /// Copies every element as unsigned bytes.
    pub fn get_unsigned_byte_data(&self) -> Result<Option<Vec<u8>>> {
        dispatch_views!(self, "get_unsigned_byte_data", a => Ok(a.get_unsigned_byte_data()))
    }

    view_impl!(
        (get_boolean, set_boolean, get_boolean_data, get_boolean_data_range, bool),
        (get_byte, set_byte, get_byte_data, get_byte_data_range, i8),
        (get_short, set_short, get_short_data, get_short_data_range, i16),
        (get_int, set_int, get_int_data, get_int_data_range, i32),
        (get_long, set_long, get_long_data, get_long_data_range, i64),
        (get_float, set_float, get_float_data, get_float_data_range, f32),
        (get_double, set_double, get_double_data, get_double_data_range, f64)
    );

    /// Reads index `i` as a double precision complex number. Real kinds have
    /// a zero imaginary part.
    pub fn get_complex_double(&self, i: i64) -> Result<Complex<f64>> {
        dispatch_numeric!(self, "get_complex_double", a => Ok(a.get(i)?.to_complex()))
    }

    /// Reads index `i` as a single precision complex number.
    pub fn get_complex_float(&self, i: i64) -> Result<Complex<f32>> {
        let c = self.get_complex_double(i)?;
        Ok(Complex::new(c.re as f32, c.im as f32))
    }

    /// Writes a complex number. Real kinds keep only the real part.
    pub fn set_complex_double(&mut self, i: i64, value: Complex<f64>) -> Result<()> {
        dispatch_numeric!(self, "set_complex_double", a => {
            let value = Element::from_complex(value)?;
            a.set(i, value)
        })
    }

    /// Text form of the element at index `i`, or `None` when it is unset.
    pub fn get_text(&self, i: i64) -> Result<Option<String>> {
        match self {
            LargeArray::String(a) => a.get(i),
            LargeArray::Object(a) => Ok(a.get(i)?.map(|v| v.to_string())),
            LargeArray::Logic(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::Byte(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::UnsignedByte(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::Short(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::Int(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::Long(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::Float(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::Double(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::ComplexFloat(a) => Ok(Some(a.get(i)?.to_string())),
            LargeArray::ComplexDouble(a) => Ok(Some(a.get(i)?.to_string())),
        }
    }

    /// JSON form of the element at index `i`, or `None` when it is unset.
    pub fn get_value(&self, i: i64) -> Result<Option<Value>> {
        fn to_value<T: serde::Serialize>(v: T) -> Result<Option<Value>> {
            serde_json::to_value(v)
                .map(Some)
                .map_err(|e| LargeArrayError::invalid(e.to_string()))
        }
        match self {
            LargeArray::String(a) => Ok(a.get(i)?.map(Value::String)),
            LargeArray::Object(a) => a.get(i),
            LargeArray::Logic(a) => to_value(a.get(i)?),
            LargeArray::Byte(a) => to_value(a.get(i)?),
            LargeArray::UnsignedByte(a) => to_value(a.get(i)?),
            LargeArray::Short(a) => to_value(a.get(i)?),
            LargeArray::Int(a) => to_value(a.get(i)?),
            LargeArray::Long(a) => to_value(a.get(i)?),
            LargeArray::Float(a) => to_value(a.get(i)?),
            LargeArray::Double(a) => to_value(a.get(i)?),
            LargeArray::ComplexFloat(a) => to_value(a.get(i)?),
            LargeArray::ComplexDouble(a) => to_value(a.get(i)?),
        }
    }

    /// Returns the inner logic array, if this is one.
    #[must_use]
    pub fn as_logic(&self) -> Option<&NumericLargeArray<bool>> {
        match self {
            LargeArray::Logic(a) => Some(a),
            _ => None,
        }
    }

    /// Elementwise conjunction of two logic arrays
    pub fn and(&self, other: &LargeArray) -> Result<LargeArray> {
        let (a, b) = logic_pair(self, other, "and")?;
        a.and(b).map(LargeArray::from)
    }

    /// Elementwise disjunction of two logic arrays
    pub fn or(&self, other: &LargeArray) -> Result<LargeArray> {
        let (a, b) = logic_pair(self, other, "or")?;
        a.or(b).map(LargeArray::from)
    }

    /// Elementwise exclusive or of two logic arrays
    pub fn xor(&self, other: &LargeArray) -> Result<LargeArray> {
        let (a, b) = logic_pair(self, other, "xor")?;
        a.xor(b).map(LargeArray::from)
    }

    /// Elementwise negation of a logic array
    pub fn not(&self) -> Result<LargeArray> {
        match self {
            LargeArray::Logic(a) => a.not().map(LargeArray::from),
            other => Err(LargeArrayError::unsupported("not", other.get_type())),
        }
    }
}

fn logic_pair<'a>(
    a: &'a LargeArray,
    b: &'a LargeArray,
    op: &'static str,
) -> Result<(&'a NumericLargeArray<bool>, &'a NumericLargeArray<bool>)> {
    match (a, b) {
        (LargeArray::Logic(a), LargeArray::Logic(b)) => Ok((a, b)),
        (LargeArray::Logic(_), other) | (other, _) => {
            Err(LargeArrayError::unsupported(op, other.get_type()))
        }
    }
}

impl Hash for LargeArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Ok(fprint) = self.hash_code(1.0) {
            state.write_i32(fprint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_constant_scenario() {
        let mut a: LargeArray = NumericLargeArray::<i32>::new_with_value(5, 3, true).unwrap().into();
        assert_eq!(a.get_int(4).unwrap(), 3);
        a.set_int(2, 7).unwrap();
        assert_eq!(a.get_int(2).unwrap(), 7);
        assert_eq!(a.get_int(0).unwrap(), 3);
        assert_eq!(a.get_int(4).unwrap(), 3);
        assert!(!a.is_constant());
    }

    #[test]
    fn every_numeric_kind_round_trips() {
        for &t in LargeArrayType::values() {
            let mut a = LargeArray::new(t, 4).unwrap();
            assert_eq!(a.get_type(), t);
            assert_eq!(a.length(), 4);
            if t == LargeArrayType::Object {
                assert!(matches!(
                    a.set_int(1, 1),
                    Err(LargeArrayError::UnsupportedOperation { .. })
                ));
                continue;
            }
            a.set_byte(1, 1).unwrap();
            if t == LargeArrayType::String {
                assert_eq!(a.get_text(1).unwrap().as_deref(), Some("1"));
            } else {
                assert_eq!(a.get_byte(1).unwrap(), 1, "{:?}", t);
                assert_eq!(a.get_double(1).unwrap(), 1.0, "{:?}", t);
                assert!(a.get_boolean(1).unwrap());
                assert!(!a.get_boolean(0).unwrap());
            }
        }
    }

    #[test]
    fn kinds_never_compare_equal() {
        let a: LargeArray = NumericLargeArray::wrap(vec![1i32, 2]).into();
        let b: LargeArray = NumericLargeArray::wrap(vec![1i64, 2]).into();
        assert_ne!(a, b);
        assert_eq!(a, a.try_clone().unwrap());
    }

    #[test]
    fn hash_quality_bounds() {
        let a = LargeArray::new(LargeArrayType::Double, 10).unwrap();
        assert!(a.hash_code(-0.1).is_err());
        assert!(a.hash_code(1.5).is_err());
        assert!(a.hash_code(f32::NAN).is_err());
        assert!(a.hash_code(0.5).is_ok());
    }

    #[test]
    fn hash_samples_elements() {
        let mut a: LargeArray = NumericLargeArray::wrap(vec![0.0f64; 10]).into();
        let before_full = a.hash_code(1.0).unwrap();
        let before_none = a.hash_code(0.0).unwrap();
        a.set_double(3, 1.0).unwrap();
        assert_ne!(a.hash_code(1.0).unwrap(), before_full);
        assert_eq!(a.hash_code(0.0).unwrap(), before_none);
    }

    #[test]
    fn sampled_step_matches_quality() {
        assert_eq!(sample_step(10, 1.0), Some(1));
        assert_eq!(sample_step(10, 0.5), Some(6));
        assert_eq!(sample_step(10, 0.0), None);
        assert_eq!(sample_step(0, 0.5), Some(1));
    }

    #[test]
    fn range_checks() {
        assert_eq!(check_range(10, 0, 10, 3).unwrap(), Some(4));
        assert_eq!(check_range(10, 9, 9, 1).unwrap(), Some(0));
        assert!(check_range(10, -1, 5, 1).is_err());
        assert!(check_range(0, 0, 0, 1).is_err());
    }

    #[test]
    fn complex_access_through_any_kind() {
        let mut a = LargeArray::new(LargeArrayType::ComplexDouble, 2).unwrap();
        a.set_complex_double(0, Complex::new(1.0, -2.0)).unwrap();
        assert_eq!(a.get_complex_float(0).unwrap(), Complex::new(1.0, -2.0));
        assert_eq!(a.get_double(0).unwrap(), 1.0);
        a.set_double(1, 4.0).unwrap();
        assert_eq!(a.get_complex_double(1).unwrap(), Complex::new(4.0, 0.0));

        let s = LargeArray::new(LargeArrayType::String, 1).unwrap();
        assert!(s.get_complex_double(0).is_err());
    }

    #[test]
    fn logic_operators_require_logic_arrays() {
        let a: LargeArray = NumericLargeArray::wrap(vec![true, false]).into();
        let b: LargeArray = NumericLargeArray::wrap(vec![1i8, 0]).into();
        assert!(matches!(
            a.and(&b),
            Err(LargeArrayError::UnsupportedOperation { operation: "and", .. })
        ));
        assert_eq!(a.xor(&a).unwrap().get_boolean_data().unwrap().unwrap(), vec![false, false]);
        assert!(a.not().unwrap().get_boolean(1).unwrap());
    }

    #[test]
    fn parents_are_compared_by_identity() {
        let base = LargeArray::new(LargeArrayType::Short, 3).unwrap();
        let mut a = base.try_clone().unwrap();
        let mut b = base.try_clone().unwrap();
        assert_eq!(a, b);
        a.set_parent(Some(&base));
        assert_ne!(a, b);
        b.set_parent(Some(&base));
        assert_eq!(a, b);
        assert_eq!(a.parent(), Some(base.id()));
    }
}
