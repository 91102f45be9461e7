//! Conversion table between stored element representations and the
//! primitive views every array exposes
#![allow(clippy::float_cmp)]

use std::fmt::Debug;

use num_complex::Complex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LargeArrayError, Result};
use crate::types::LargeArrayType;

/// A fixed-width value that can be stored in a [`NumericLargeArray`].
///
/// Getters never fail: narrowing wraps like an `as` cast, floats go through
/// `i32` before narrowing to 8 or 16 bits, and complex values expose their
/// real part. Setters fail only when the target cannot hold the value at all,
/// which is the case for logic arrays given anything other than 0 or 1.
///
/// [`NumericLargeArray`]: crate::NumericLargeArray
pub trait Element:
    Copy + Default + PartialEq + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Element kind stored by arrays of this representation
    const TYPE: LargeArrayType;
    /// Number of bytes in the stream encoding
    const WIDTH: usize;

    /// True for a nonzero value, judged on the real part of complex kinds
    fn to_boolean(self) -> bool;
    /// Truncating conversion to `i8`
    fn to_byte(self) -> i8;
    /// Truncating conversion to `u8`
    fn to_unsigned_byte(self) -> u8;
    /// Truncating conversion to `i16`
    fn to_short(self) -> i16;
    /// Truncating conversion to `i32`
    fn to_int(self) -> i32;
    /// Truncating conversion to `i64`
    fn to_long(self) -> i64;
    /// Nearest `f32`, or the real part
    fn to_float(self) -> f32;
    /// Nearest `f64`, or the real part
    fn to_double(self) -> f64;
    /// Value as a complex number, with a zero imaginary part for real kinds
    fn to_complex(self) -> Complex<f64>;

    /// Stored form of a boolean
    fn from_boolean(v: bool) -> Result<Self>;
    /// Stored form of a `i8`, `InvalidArgument` if it has none
    fn from_byte(v: i8) -> Result<Self>;
    /// Stored form of a `u8`, `InvalidArgument` if it has none
    fn from_unsigned_byte(v: u8) -> Result<Self>;
    /// Stored form of a `i16`, `InvalidArgument` if it has none
    fn from_short(v: i16) -> Result<Self>;
    /// Stored form of a `i32`, `InvalidArgument` if it has none
    fn from_int(v: i32) -> Result<Self>;
    /// Stored form of a `i64`, `InvalidArgument` if it has none
    fn from_long(v: i64) -> Result<Self>;
    /// Stored form of a `f32`, `InvalidArgument` if it has none
    fn from_float(v: f32) -> Result<Self>;
    /// Stored form of a `f64`, `InvalidArgument` if it has none
    fn from_double(v: f64) -> Result<Self>;
    /// Stored form of a `Complex<f64>`, `InvalidArgument` if it has none
    fn from_complex(v: Complex<f64>) -> Result<Self>;

    /// Element equality where every NaN equals every other NaN and the two
    /// zeros differ.
    fn same(self, other: Self) -> bool;

    /// 32-bit fingerprint folded into [`hash_code`](crate::LargeArray::hash_code)
    fn fingerprint(self) -> i32;

    /// Appends the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes a value from the first [`WIDTH`](Element::WIDTH) bytes of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;
}

/// Real scalar used as the component of a complex element.
pub trait RealElement: Element {
    /// Nearest representable value, wrapping for integer kinds
    fn from_f64_lossy(v: f64) -> Self;
    /// Value widened to `f64`
    fn as_f64(self) -> f64;
}

fn real_to_i8(v: f64) -> i8 {
    (v as i32) as i8
}
fn real_to_u8(v: f64) -> u8 {
    (v as i32) as u8
}
fn real_to_i16(v: f64) -> i16 {
    (v as i32) as i16
}
fn real_to_i32(v: f64) -> i32 {
    v as i32
}
fn real_to_i64(v: f64) -> i64 {
    v as i64
}

fn float_bits(v: f32) -> u32 {
    if v.is_nan() {
        f32::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

fn double_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

fn fold_long(v: u64) -> i32 {
    (v ^ (v >> 32)) as i32
}

fn logic_error() -> LargeArrayError {
    LargeArrayError::invalid("the value has to be 0 or 1")
}

fn check_logic(v: i64) -> Result<bool> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(logic_error()),
    }
}

fn check_logic_real(v: f64) -> Result<bool> {
    if v == 0.0 {
        Ok(false)
    } else if v == 1.0 {
        Ok(true)
    } else {
        Err(logic_error())
    }
}

macro_rules! le_codec_impl {
    ($ty:ty) => {
        fn write_le(self, out: &mut Vec<u8>) {
            out.extend_from_slice(&self.to_le_bytes());
        }

        fn read_le(bytes: &[u8]) -> Self {
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
            <$ty>::from_le_bytes(buf)
        }
    };
}

macro_rules! integer_element_impl {
    ($(($ty:ty, $variant:ident, $from_real:path)),*) => {
        $(impl Element for $ty {
            const TYPE: LargeArrayType = LargeArrayType::$variant;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn to_boolean(self) -> bool { self != 0 }
            fn to_byte(self) -> i8 { self as i8 }
            fn to_unsigned_byte(self) -> u8 { self as u8 }
            fn to_short(self) -> i16 { self as i16 }
            fn to_int(self) -> i32 { self as i32 }
            fn to_long(self) -> i64 { self as i64 }
            fn to_float(self) -> f32 { self as f32 }
            fn to_double(self) -> f64 { self as f64 }
            fn to_complex(self) -> Complex<f64> { Complex::new(self as f64, 0.0) }

            fn from_boolean(v: bool) -> Result<Self> { Ok(v as $ty) }
            fn from_byte(v: i8) -> Result<Self> { Ok(v as $ty) }
            fn from_unsigned_byte(v: u8) -> Result<Self> { Ok(v as $ty) }
            fn from_short(v: i16) -> Result<Self> { Ok(v as $ty) }
            fn from_int(v: i32) -> Result<Self> { Ok(v as $ty) }
            fn from_long(v: i64) -> Result<Self> { Ok(v as $ty) }
            fn from_float(v: f32) -> Result<Self> { Ok($from_real(f64::from(v))) }
            fn from_double(v: f64) -> Result<Self> { Ok($from_real(v)) }
            fn from_complex(v: Complex<f64>) -> Result<Self> { Ok($from_real(v.re)) }

            fn same(self, other: Self) -> bool { self == other }
            fn fingerprint(self) -> i32 { fold_long(self as i64 as u64) }

            le_codec_impl!($ty);
        })*
    };
}

integer_element_impl!(
    (i8, Byte, real_to_i8),
    (u8, UnsignedByte, real_to_u8),
    (i16, Short, real_to_i16),
    (i32, Int, real_to_i32),
    (i64, Long, real_to_i64)
);

impl Element for bool {
    const TYPE: LargeArrayType = LargeArrayType::Logic;
    const WIDTH: usize = 1;

    fn to_boolean(self) -> bool {
        self
    }
    fn to_byte(self) -> i8 {
        self as i8
    }
    fn to_unsigned_byte(self) -> u8 {
        self as u8
    }
    fn to_short(self) -> i16 {
        self as i16
    }
    fn to_int(self) -> i32 {
        self as i32
    }
    fn to_long(self) -> i64 {
        self as i64
    }
    fn to_float(self) -> f32 {
        if self {
            1.0
        } else {
            0.0
        }
    }
    fn to_double(self) -> f64 {
        f64::from(self.to_float())
    }
    fn to_complex(self) -> Complex<f64> {
        Complex::new(self.to_double(), 0.0)
    }

    fn from_boolean(v: bool) -> Result<Self> {
        Ok(v)
    }
    fn from_byte(v: i8) -> Result<Self> {
        check_logic(i64::from(v))
    }
    fn from_unsigned_byte(v: u8) -> Result<Self> {
        check_logic(i64::from(v))
    }
    fn from_short(v: i16) -> Result<Self> {
        check_logic(i64::from(v))
    }
    fn from_int(v: i32) -> Result<Self> {
        check_logic(i64::from(v))
    }
    fn from_long(v: i64) -> Result<Self> {
        check_logic(v)
    }
    fn from_float(v: f32) -> Result<Self> {
        check_logic_real(f64::from(v))
    }
    fn from_double(v: f64) -> Result<Self> {
        check_logic_real(v)
    }
    fn from_complex(v: Complex<f64>) -> Result<Self> {
        check_logic_real(v.re)
    }

    fn same(self, other: Self) -> bool {
        self == other
    }
    fn fingerprint(self) -> i32 {
        self as i32
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

macro_rules! real_element_impl {
    ($(($ty:ty, $variant:ident, $bits:ident)),*) => {
        $(impl Element for $ty {
            const TYPE: LargeArrayType = LargeArrayType::$variant;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn to_boolean(self) -> bool { self != 0.0 }
            fn to_byte(self) -> i8 { real_to_i8(self as f64) }
            fn to_unsigned_byte(self) -> u8 { real_to_u8(self as f64) }
            fn to_short(self) -> i16 { real_to_i16(self as f64) }
            fn to_int(self) -> i32 { real_to_i32(self as f64) }
            fn to_long(self) -> i64 { real_to_i64(self as f64) }
            fn to_float(self) -> f32 { self as f32 }
            fn to_double(self) -> f64 { self as f64 }
            fn to_complex(self) -> Complex<f64> { Complex::new(self as f64, 0.0) }

            fn from_boolean(v: bool) -> Result<Self> { Ok(if v { 1.0 } else { 0.0 }) }
            fn from_byte(v: i8) -> Result<Self> { Ok(v as $ty) }
            fn from_unsigned_byte(v: u8) -> Result<Self> { Ok(v as $ty) }
            fn from_short(v: i16) -> Result<Self> { Ok(v as $ty) }
            fn from_int(v: i32) -> Result<Self> { Ok(v as $ty) }
            fn from_long(v: i64) -> Result<Self> { Ok(v as $ty) }
            fn from_float(v: f32) -> Result<Self> { Ok(v as $ty) }
            fn from_double(v: f64) -> Result<Self> { Ok(v as $ty) }
            fn from_complex(v: Complex<f64>) -> Result<Self> { Ok(v.re as $ty) }

            fn same(self, other: Self) -> bool { $bits(self) == $bits(other) }
            fn fingerprint(self) -> i32 { fold_long($bits(self) as u64) }

            le_codec_impl!($ty);
        }

        impl RealElement for $ty {
            fn from_f64_lossy(v: f64) -> Self { v as $ty }
            fn as_f64(self) -> f64 { self as f64 }
        })*
    };
}

real_element_impl!((f32, Float, float_bits), (f64, Double, double_bits));

macro_rules! complex_element_impl {
    ($(($ty:ty, $variant:ident)),*) => {
        $(impl Element for Complex<$ty> {
            const TYPE: LargeArrayType = LargeArrayType::$variant;
            const WIDTH: usize = 2 * std::mem::size_of::<$ty>();

            fn to_boolean(self) -> bool { self.re.to_boolean() }
            fn to_byte(self) -> i8 { self.re.to_byte() }
            fn to_unsigned_byte(self) -> u8 { self.re.to_unsigned_byte() }
            fn to_short(self) -> i16 { self.re.to_short() }
            fn to_int(self) -> i32 { self.re.to_int() }
            fn to_long(self) -> i64 { self.re.to_long() }
            fn to_float(self) -> f32 { self.re as f32 }
            fn to_double(self) -> f64 { self.re as f64 }
            fn to_complex(self) -> Complex<f64> { Complex::new(self.re as f64, self.im as f64) }

            fn from_boolean(v: bool) -> Result<Self> { Ok(Complex::new(<$ty>::from_boolean(v)?, 0.0)) }
            fn from_byte(v: i8) -> Result<Self> { Ok(Complex::new(v as $ty, 0.0)) }
            fn from_unsigned_byte(v: u8) -> Result<Self> { Ok(Complex::new(v as $ty, 0.0)) }
            fn from_short(v: i16) -> Result<Self> { Ok(Complex::new(v as $ty, 0.0)) }
            fn from_int(v: i32) -> Result<Self> { Ok(Complex::new(v as $ty, 0.0)) }
            fn from_long(v: i64) -> Result<Self> { Ok(Complex::new(v as $ty, 0.0)) }
            fn from_float(v: f32) -> Result<Self> { Ok(Complex::new(v as $ty, 0.0)) }
            fn from_double(v: f64) -> Result<Self> { Ok(Complex::new(v as $ty, 0.0)) }
            fn from_complex(v: Complex<f64>) -> Result<Self> { Ok(Complex::new(v.re as $ty, v.im as $ty)) }

            fn same(self, other: Self) -> bool { self.re.same(other.re) && self.im.same(other.im) }
            fn fingerprint(self) -> i32 {
                self.re.fingerprint().wrapping_mul(31).wrapping_add(self.im.fingerprint())
            }

            fn write_le(self, out: &mut Vec<u8>) {
                self.re.write_le(out);
                self.im.write_le(out);
            }
            fn read_le(bytes: &[u8]) -> Self {
                let half = std::mem::size_of::<$ty>();
                Complex::new(<$ty>::read_le(bytes), <$ty>::read_le(&bytes[half..]))
            }
        })*
    };
}

complex_element_impl!((f32, ComplexFloat), (f64, ComplexDouble));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_byte_widens_by_zero_extension() {
        let v: u8 = 200;
        assert_eq!(v.to_short(), 200);
        assert_eq!(v.to_long(), 200);
        assert_eq!(v.to_byte(), -56);
        assert_eq!(u8::from_int(300).unwrap(), 44);
        assert_eq!(u8::from_byte(-1).unwrap(), 255);
    }

    #[test]
    fn integer_narrowing_wraps() {
        assert_eq!(70000i32.to_short(), 4464);
        assert_eq!((-129i64).to_byte(), 127);
        assert_eq!(i16::from_long(65537).unwrap(), 1);
        assert!(5i32.to_boolean());
        assert!(!0i64.to_boolean());
    }

    #[test]
    fn float_narrowing_goes_through_int() {
        assert_eq!(300.7f64.to_byte(), 44);
        assert_eq!((-2.9f32).to_int(), -2);
        assert_eq!(1e20f64.to_int(), i32::MAX);
        assert_eq!(f64::NAN.to_long(), 0);
        assert_eq!(i8::from_double(-129.5).unwrap(), 127);
        assert_eq!(u8::from_float(511.0).unwrap(), 255);
    }

    #[test]
    fn logic_accepts_only_zero_and_one() {
        assert!(bool::from_int(1).unwrap());
        assert!(!bool::from_double(0.0).unwrap());
        assert!(bool::from_short(2).is_err());
        assert!(bool::from_float(0.5).is_err());
        assert!(bool::from_unsigned_byte(255).is_err());
        assert_eq!(true.to_double(), 1.0);
    }

    #[test]
    fn complex_exposes_real_part() {
        let c = Complex::new(2.5f32, -1.0);
        assert_eq!(c.to_double(), 2.5);
        assert_eq!(c.to_int(), 2);
        assert!(c.to_boolean());
        let z = Complex::<f64>::from_long(7).unwrap();
        assert_eq!(z, Complex::new(7.0, 0.0));
    }

    #[test]
    fn float_identity_semantics() {
        assert!(f64::NAN.same(-f64::NAN));
        assert!(!0.0f32.same(-0.0));
        assert_eq!(f32::NAN.fingerprint(), (0.0f32 / 0.0).fingerprint());
        assert!(Complex::new(f64::NAN, 1.0).same(Complex::new(f64::NAN, 1.0)));
    }

    #[test]
    fn little_endian_codec() {
        let mut out = Vec::new();
        (-2i16).write_le(&mut out);
        Complex::new(1.5f32, -3.0).write_le(&mut out);
        true.write_le(&mut out);
        assert_eq!(out.len(), 2 + 8 + 1);
        assert_eq!(&out[..2], &[0xfe, 0xff]);
        assert_eq!(i16::read_le(&out), -2);
        assert_eq!(Complex::<f32>::read_le(&out[2..]), Complex::new(1.5, -3.0));
        assert!(bool::read_le(&out[10..]));
    }
}
