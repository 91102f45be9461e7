//! Binary stream encoding of arrays
//!
//! All integers are little-endian. A stream starts with a header of the
//! element type ordinal (`u8`), the length (`i64`) and the maximum element
//! size (`i32`, zero for fixed-width kinds). Fixed-width elements follow at
//! their native width, complex values as the real part then the imaginary
//! part. Each variable-length element is an `i16` byte count followed by
//! that many bytes; a count of `-1` marks an unset element and `0` an empty
//! one, and neither is followed by any bytes.
//!
//! The constant flag is not part of the format: a decoded array always has
//! one stored element per index.

use std::convert::TryFrom;
use std::io::{Read, Write};

use num_complex::Complex;

use crate::array::LargeArray;
use crate::element::Element;
use crate::error::{LargeArrayError, Result};
use crate::numeric::{check_length, NumericLargeArray};
use crate::types::LargeArrayType;
use crate::varlen::{VarElement, VarLengthLargeArray};

/// Elements buffered between calls to the writer.
const CHUNK: usize = 4096;

fn write_u8(w: &mut dyn Write, v: u8) -> Result<()> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_i16_le(w: &mut dyn Write, v: i16) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_i64_le(w: &mut dyn Write, v: i64) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_u8(r: &mut dyn Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_i16_le(r: &mut dyn Read) -> Result<i16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

fn read_i32_le(r: &mut dyn Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64_le(r: &mut dyn Read) -> Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn write_numeric<T: Element>(array: &NumericLargeArray<T>, w: &mut dyn Write) -> Result<()> {
    let mut buf = Vec::with_capacity(CHUNK * T::WIDTH);
    for i in 0..array.length() as usize {
        array.value(i).write_le(&mut buf);
        if buf.len() >= CHUNK * T::WIDTH {
            w.write_all(&buf)?;
            buf.clear();
        }
    }
    w.write_all(&buf)?;
    Ok(())
}

fn read_numeric<T: Element>(r: &mut dyn Read, length: i64) -> Result<NumericLargeArray<T>> {
    let len = check_length(length)?;
    // `length` is untrusted input.
    let mut items = Vec::with_capacity(len.min(CHUNK));
    let mut buf = vec![0u8; T::WIDTH];
    for _ in 0..len {
        r.read_exact(&mut buf)?;
        items.push(T::read_le(&buf));
    }
    NumericLargeArray::from_vec(items)
}

fn write_var<V: VarElement>(array: &VarLengthLargeArray<V>, w: &mut dyn Write) -> Result<()> {
    for i in 0..array.length() as usize {
        match array.value(i) {
            None => write_i16_le(w, -1)?,
            Some(value) => {
                let bytes = value.encode()?;
                if bytes.len() > i16::MAX as usize {
                    return Err(LargeArrayError::ElementTooLarge {
                        size: bytes.len(),
                        max: i16::MAX as usize,
                    });
                }
                write_i16_le(w, bytes.len() as i16)?;
                w.write_all(&bytes)?;
            }
        }
    }
    Ok(())
}

fn read_var<V: VarElement>(
    r: &mut dyn Read,
    length: i64,
    max_element_size: i32,
) -> Result<VarLengthLargeArray<V>> {
    let len = check_length(length)?;
    let mut items = Vec::with_capacity(len.min(CHUNK));
    for _ in 0..len {
        let size = read_i16_le(r)?;
        let item = match size {
            s if s < 0 => None,
            0 => V::empty(),
            s => {
                let mut bytes = vec![0u8; s as usize];
                r.read_exact(&mut bytes)?;
                let value = V::decode(&bytes).ok_or_else(|| {
                    LargeArrayError::invalid(format!("malformed {} element in stream", V::TYPE))
                })?;
                Some(value)
            }
        };
        items.push(item);
    }
    VarLengthLargeArray::from_items(items, max_element_size)
}

impl LargeArray {
    /// Encodes the array into `w`.
    pub fn write_to(&self, w: &mut dyn Write) -> Result<()> {
        write_u8(w, self.get_type().ordinal())?;
        write_i64_le(w, self.length())?;
        let max_element_size = match self {
            LargeArray::String(a) => a.max_element_size(),
            LargeArray::Object(a) => a.max_element_size(),
            _ => 0,
        };
        write_i32_le(w, max_element_size)?;
        match self {
            LargeArray::Logic(a) => write_numeric(a, w),
            LargeArray::Byte(a) => write_numeric(a, w),
            LargeArray::UnsignedByte(a) => write_numeric(a, w),
            LargeArray::Short(a) => write_numeric(a, w),
            LargeArray::Int(a) => write_numeric(a, w),
            LargeArray::Long(a) => write_numeric(a, w),
            LargeArray::Float(a) => write_numeric(a, w),
            LargeArray::Double(a) => write_numeric(a, w),
            LargeArray::ComplexFloat(a) => write_numeric(a, w),
            LargeArray::ComplexDouble(a) => write_numeric(a, w),
            LargeArray::String(a) => write_var(a, w),
            LargeArray::Object(a) => write_var(a, w),
        }
    }

    /// Decodes an array of kind `expected` from `r`.
    ///
    /// Fails with `TypeMismatch` if the stream holds another kind. Storage
    /// is chosen by the same policy as for a freshly created array.
    pub fn read_from(r: &mut dyn Read, expected: LargeArrayType) -> Result<Self> {
        use LargeArrayType::*;
        let found = LargeArrayType::try_from(read_u8(r)?)?;
        if found != expected {
            return Err(LargeArrayError::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        let length = read_i64_le(r)?;
        let max_element_size = read_i32_le(r)?;
        Ok(match found {
            Logic => read_numeric::<bool>(r, length)?.into(),
            Byte => read_numeric::<i8>(r, length)?.into(),
            UnsignedByte => read_numeric::<u8>(r, length)?.into(),
            Short => read_numeric::<i16>(r, length)?.into(),
            Int => read_numeric::<i32>(r, length)?.into(),
            Long => read_numeric::<i64>(r, length)?.into(),
            Float => read_numeric::<f32>(r, length)?.into(),
            Double => read_numeric::<f64>(r, length)?.into(),
            ComplexFloat => read_numeric::<Complex<f32>>(r, length)?.into(),
            ComplexDouble => read_numeric::<Complex<f64>>(r, length)?.into(),
            String => read_var::<std::string::String>(r, length, max_element_size)?.into(),
            Object => read_var::<serde_json::Value>(r, length, max_element_size)?.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{objects, strings};
    use serde_json::json;

    fn round_trip(array: &LargeArray) -> LargeArray {
        let mut out = Vec::new();
        array.write_to(&mut out).unwrap();
        LargeArray::read_from(&mut out.as_slice(), array.get_type()).unwrap()
    }

    #[test]
    fn header_layout() {
        let a: LargeArray = NumericLargeArray::wrap(vec![1i16, -2]).into();
        let mut out = Vec::new();
        a.write_to(&mut out).unwrap();
        assert_eq!(
            out,
            vec![3, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0xfe, 0xff]
        );
    }

    #[test]
    fn doubles_keep_special_values() {
        let a: LargeArray = NumericLargeArray::wrap(vec![f64::NAN, -0.0, f64::INFINITY]).into();
        let b = round_trip(&a);
        assert_eq!(a, b);
        assert!(b.get_double(1).unwrap().is_sign_negative());
    }

    #[test]
    fn constants_decode_as_stored_arrays() {
        let a: LargeArray = NumericLargeArray::new_constant(3, Complex::new(1.0f32, -1.0))
            .unwrap()
            .into();
        let b = round_trip(&a);
        assert!(!b.is_constant());
        assert_eq!(b.get_complex_float(2).unwrap(), Complex::new(1.0, -1.0));
    }

    #[test]
    fn strings_keep_unset_and_empty() {
        let a = strings(vec![Some("abc"), None, Some("")]).unwrap();
        let b = round_trip(&a);
        assert_eq!(b.get_text(0).unwrap().as_deref(), Some("abc"));
        assert_eq!(b.get_text(1).unwrap(), None);
        assert_eq!(b.get_text(2).unwrap().as_deref(), Some(""));
        assert_eq!(a, b);
    }

    #[test]
    fn objects_round_trip() {
        let a = objects(vec![json!({"k": [1, 2]}), json!({})]).unwrap();
        let b = round_trip(&a);
        assert_eq!(b.get_value(0).unwrap(), Some(json!({"k": [1, 2]})));
    }

    #[test]
    fn declared_type_must_match() {
        let a: LargeArray = NumericLargeArray::wrap(vec![1i32]).into();
        let mut out = Vec::new();
        a.write_to(&mut out).unwrap();
        assert!(matches!(
            LargeArray::read_from(&mut out.as_slice(), LargeArrayType::Long),
            Err(LargeArrayError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn malformed_streams() {
        let unknown = [42u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            LargeArray::read_from(&mut &unknown[..], LargeArrayType::Int),
            Err(LargeArrayError::InvalidArgument(_))
        ));

        let negative = [4u8, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0];
        assert!(matches!(
            LargeArray::read_from(&mut &negative[..], LargeArrayType::Int),
            Err(LargeArrayError::InvalidArgument(_))
        ));

        let truncated = [4u8, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0];
        assert!(matches!(
            LargeArray::read_from(&mut &truncated[..], LargeArrayType::Int),
            Err(LargeArrayError::Io(_))
        ));
    }
}
