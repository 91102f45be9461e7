//! Helpers that build, copy and convert arrays of any kind

use num_complex::Complex;
use rand::distributions::{Distribution, Standard};
use rand::Rng;

use crate::array::LargeArray;
use crate::element::Element;
use crate::error::{LargeArrayError, Result};
use crate::numeric::NumericLargeArray;
use crate::object::ObjectLargeArray;
use crate::string::StringLargeArray;
use crate::types::LargeArrayType;
use crate::varlen::{VarElement, VarLengthLargeArray};

/// Creates an array of `length` zero (or unset) elements. Memory is always
/// initialized, so `zero_fill` does not change the result.
pub fn create(element_type: LargeArrayType, length: i64, _zero_fill: bool) -> Result<LargeArray> {
    LargeArray::new(element_type, length)
}

/// Creates a constant array holding `value` at every index.
pub fn create_constant(element_type: LargeArrayType, length: i64, value: f64) -> Result<LargeArray> {
    LargeArray::new_constant(element_type, length, value)
}

fn convert_numeric<T: Element>(
    src: &LargeArray,
    read: impl Fn(&LargeArray, i64) -> Result<T>,
) -> Result<NumericLargeArray<T>> {
    let length = src.length();
    if src.is_constant() {
        let value = if length > 0 { read(src, 0)? } else { T::default() };
        return NumericLargeArray::new_constant(length, value);
    }
    let mut out = NumericLargeArray::new(length)?;
    for (i, slot) in out.as_mut_slice()?.iter_mut().enumerate() {
        *slot = read(src, i as i64)?;
    }
    Ok(out)
}

fn convert_var<V: VarElement>(
    src: &LargeArray,
    max_element_size: i32,
    read: impl Fn(&LargeArray, i64) -> Result<Option<V>>,
) -> Result<VarLengthLargeArray<V>> {
    let length = src.length();
    if src.is_constant() {
        let value = if length > 0 { read(src, 0)? } else { None };
        return VarLengthLargeArray::new_with_value(length, max_element_size, value, true);
    }
    let mut out = VarLengthLargeArray::new(length, max_element_size)?;
    for i in 0..length {
        if let Some(value) = read(src, i)? {
            out.set(i, Some(value))?;
        }
    }
    Ok(out)
}

/// Converts `src` to an array of `element_type`.
///
/// Numeric targets read every element through the accessor of the target's
/// own width, so a string source yields string lengths. String targets
/// store the text form of each element and object targets its JSON form.
/// Converting to the same kind returns an independent copy.
pub fn convert(src: &LargeArray, element_type: LargeArrayType) -> Result<LargeArray> {
    use LargeArrayType::*;
    if src.get_type() == element_type {
        return src.try_clone();
    }
    Ok(match element_type {
        Logic => convert_numeric(src, |a, i| a.get_boolean(i))?.into(),
        Byte => convert_numeric(src, |a, i| a.get_byte(i))?.into(),
        UnsignedByte => convert_numeric(src, |a, i| a.get_unsigned_byte(i))?.into(),
        Short => convert_numeric(src, |a, i| a.get_short(i))?.into(),
        Int => convert_numeric(src, |a, i| a.get_int(i))?.into(),
        Long => convert_numeric(src, |a, i| a.get_long(i))?.into(),
        Float => convert_numeric(src, |a, i| a.get_float(i))?.into(),
        Double => convert_numeric(src, |a, i| a.get_double(i))?.into(),
        ComplexFloat => convert_numeric(src, |a, i| a.get_complex_float(i))?.into(),
        ComplexDouble => convert_numeric(src, |a, i| a.get_complex_double(i))?.into(),
        String => {
            let longest = text_capacity(src)?;
            convert_var(src, longest, |a, i| a.get_text(i))?.into()
        }
        Object => convert_var(src, crate::config::DEFAULT_MAX_OBJECT_SIZE, |a, i| {
            a.get_value(i)
        })?
        .into(),
    })
}

/// Capacity that holds the text form of every element of `src`.
fn text_capacity(src: &LargeArray) -> Result<i32> {
    let mut longest = crate::config::DEFAULT_MAX_STRING_LENGTH;
    let count = if src.is_constant() { src.length().min(1) } else { src.length() };
    for i in 0..count {
        if let Some(text) = src.get_text(i)? {
            longest = longest.max(text.chars().count() as i32);
        }
    }
    Ok(longest)
}

fn check_copy_bounds(length: i64, pos: i64, count: i64) -> Result<()> {
    if pos < 0 || pos > length {
        return Err(LargeArrayError::IndexOutOfRange { index: pos, length });
    }
    if count > length - pos {
        return Err(LargeArrayError::IndexOutOfRange {
            index: pos + count,
            length,
        });
    }
    Ok(())
}

fn copy_numeric<T: Element>(
    src: &NumericLargeArray<T>,
    src_pos: i64,
    dest: &mut NumericLargeArray<T>,
    dest_pos: i64,
    count: i64,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let (src_pos, dest_pos, count) = (src_pos as usize, dest_pos as usize, count as usize);
    let out = &mut dest.as_mut_slice()?[dest_pos..dest_pos + count];
    match src.as_slice() {
        Some(items) => out.copy_from_slice(&items[src_pos..src_pos + count]),
        None => {
            for (j, slot) in out.iter_mut().enumerate() {
                *slot = src.value(src_pos + j);
            }
        }
    }
    Ok(())
}

fn copy_var<V: VarElement>(
    src: &VarLengthLargeArray<V>,
    src_pos: i64,
    dest: &mut VarLengthLargeArray<V>,
    dest_pos: i64,
    count: i64,
) -> Result<()> {
    let start = src_pos as usize;
    let values = (start..start + count as usize).map(|i| src.value(i)).collect();
    dest.set_range(dest_pos as usize, values)
}

/// Copies `count` elements of `src` starting at `src_pos` into `dest`
/// starting at `dest_pos`. Both arrays must be of the same kind.
pub fn arraycopy(
    src: &LargeArray,
    src_pos: i64,
    dest: &mut LargeArray,
    dest_pos: i64,
    count: i64,
) -> Result<()> {
    if count < 0 {
        return Err(LargeArrayError::invalid(format!(
            "{} is not a nonnegative element count",
            count
        )));
    }
    check_copy_bounds(src.length(), src_pos, count)?;
    check_copy_bounds(dest.length(), dest_pos, count)?;
    match (src, dest) {
        (LargeArray::Logic(s), LargeArray::Logic(d)) => copy_numeric(s, src_pos, d, dest_pos, count),
        (LargeArray::Byte(s), LargeArray::Byte(d)) => copy_numeric(s, src_pos, d, dest_pos, count),
        (LargeArray::UnsignedByte(s), LargeArray::UnsignedByte(d)) => {
            copy_numeric(s, src_pos, d, dest_pos, count)
        }
        (LargeArray::Short(s), LargeArray::Short(d)) => copy_numeric(s, src_pos, d, dest_pos, count),
        (LargeArray::Int(s), LargeArray::Int(d)) => copy_numeric(s, src_pos, d, dest_pos, count),
        (LargeArray::Long(s), LargeArray::Long(d)) => copy_numeric(s, src_pos, d, dest_pos, count),
        (LargeArray::Float(s), LargeArray::Float(d)) => copy_numeric(s, src_pos, d, dest_pos, count),
        (LargeArray::Double(s), LargeArray::Double(d)) => copy_numeric(s, src_pos, d, dest_pos, count),
        (LargeArray::ComplexFloat(s), LargeArray::ComplexFloat(d)) => {
            copy_numeric(s, src_pos, d, dest_pos, count)
        }
        (LargeArray::ComplexDouble(s), LargeArray::ComplexDouble(d)) => {
            copy_numeric(s, src_pos, d, dest_pos, count)
        }
        (LargeArray::String(s), LargeArray::String(d)) => copy_var(s, src_pos, d, dest_pos, count),
        (LargeArray::Object(s), LargeArray::Object(d)) => copy_var(s, src_pos, d, dest_pos, count),
        (s, d) => Err(LargeArrayError::TypeMismatch {
            expected: d.get_type().to_string(),
            found: s.get_type().to_string(),
        }),
    }
}

fn selected(mask: &NumericLargeArray<bool>) -> Vec<usize> {
    (0..mask.length() as usize).filter(|&i| mask.value(i)).collect()
}

fn gather_numeric<T: Element>(
    src: &NumericLargeArray<T>,
    indices: &[usize],
) -> Result<NumericLargeArray<T>> {
    NumericLargeArray::from_vec(indices.iter().map(|&i| src.value(i)).collect())
}

fn gather_var<V: VarElement>(
    src: &VarLengthLargeArray<V>,
    indices: &[usize],
) -> Result<VarLengthLargeArray<V>> {
    let mut out = VarLengthLargeArray::new(indices.len() as i64, src.max_element_size())?;
    for (j, &i) in indices.iter().enumerate() {
        if let Some(value) = src.value(i) {
            out.set(j as i64, Some(value))?;
        }
    }
    Ok(out)
}

/// Keeps the elements of `src` at which the logic array `mask` is true.
/// Returns `None` if the mask selects nothing.
pub fn select(src: &LargeArray, mask: &LargeArray) -> Result<Option<LargeArray>> {
    let mask = mask.as_logic().ok_or_else(|| {
        LargeArrayError::invalid(format!(
            "the mask has to be a logic array, not {}",
            mask.get_type()
        ))
    })?;
    if mask.length() != src.length() {
        return Err(LargeArrayError::DimensionMismatch {
            expected: src.length(),
            found: mask.length(),
        });
    }
    let indices = selected(mask);
    if indices.is_empty() {
        return Ok(None);
    }
    let res: LargeArray = match src {
        LargeArray::Logic(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::Byte(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::UnsignedByte(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::Short(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::Int(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::Long(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::Float(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::Double(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::ComplexFloat(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::ComplexDouble(a) => gather_numeric(a, &indices)?.into(),
        LargeArray::String(a) => gather_var(a, &indices)?.into(),
        LargeArray::Object(a) => gather_var(a, &indices)?.into(),
    };
    Ok(Some(res))
}

fn random_numeric<T: Element, R: Rng>(
    length: i64,
    rng: &mut R,
    mut next: impl FnMut(&mut R) -> T,
) -> Result<NumericLargeArray<T>> {
    let mut out = NumericLargeArray::new(length)?;
    for slot in out.as_mut_slice()? {
        *slot = next(rng);
    }
    Ok(out)
}

fn random_complex<T, R: Rng>(rng: &mut R) -> Complex<T>
where
    Standard: Distribution<T>,
{
    Complex::new(rng.gen(), rng.gen())
}

/// Fills a new numeric array with random values from the thread-local
/// generator. Integers cover their whole range, floating point parts are
/// uniform in `[0, 1)`.
pub fn generate_random(element_type: LargeArrayType, length: i64) -> Result<LargeArray> {
    generate_random_with(element_type, length, &mut rand::thread_rng())
}

/// Like [`generate_random`], drawing from `rng`.
pub fn generate_random_with<R: Rng>(
    element_type: LargeArrayType,
    length: i64,
    rng: &mut R,
) -> Result<LargeArray> {
    use LargeArrayType::*;
    Ok(match element_type {
        Logic => random_numeric::<bool, _>(length, rng, |r| r.gen())?.into(),
        Byte => random_numeric::<i8, _>(length, rng, |r| r.gen())?.into(),
        UnsignedByte => random_numeric::<u8, _>(length, rng, |r| r.gen())?.into(),
        Short => random_numeric::<i16, _>(length, rng, |r| r.gen())?.into(),
        Int => random_numeric::<i32, _>(length, rng, |r| r.gen())?.into(),
        Long => random_numeric::<i64, _>(length, rng, |r| r.gen())?.into(),
        Float => random_numeric::<f32, _>(length, rng, |r| r.gen())?.into(),
        Double => random_numeric::<f64, _>(length, rng, |r| r.gen())?.into(),
        ComplexFloat => random_numeric::<Complex<f32>, _>(length, rng, random_complex)?.into(),
        ComplexDouble => random_numeric::<Complex<f64>, _>(length, rng, random_complex)?.into(),
        other => {
            return Err(LargeArrayError::invalid(format!(
                "cannot generate random {} data",
                other
            )))
        }
    })
}

/// Convenience constructor for a string array holding `items`.
pub fn strings<I, S>(items: I) -> Result<LargeArray>
where
    I: IntoIterator<Item = Option<S>>,
    S: Into<String>,
{
    let items = items.into_iter().map(|s| s.map(Into::into)).collect();
    Ok(StringLargeArray::wrap_strings(items)?.into())
}

/// Convenience constructor for an object array holding `items`.
pub fn objects(items: Vec<serde_json::Value>) -> Result<LargeArray> {
    Ok(ObjectLargeArray::wrap_values(items)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn convert_between_numeric_kinds() {
        let a: LargeArray = NumericLargeArray::wrap(vec![1.75f64, -2.5, 300.0]).into();
        let ints = convert(&a, LargeArrayType::Int).unwrap();
        assert_eq!(ints.get_int_data().unwrap().unwrap(), vec![1, -2, 300]);
        let bytes = convert(&a, LargeArrayType::UnsignedByte).unwrap();
        assert_eq!(bytes.get_unsigned_byte_data().unwrap().unwrap(), vec![1, 254, 44]);
        let c = convert(&a, LargeArrayType::ComplexFloat).unwrap();
        assert_eq!(c.get_complex_float(1).unwrap(), Complex::new(-2.5, 0.0));
    }

    #[test]
    fn convert_keeps_constants() {
        let a = create_constant(LargeArrayType::Short, 10, 4.0).unwrap();
        let b = convert(&a, LargeArrayType::Double).unwrap();
        assert!(b.is_constant());
        assert_eq!(b.get_double(9).unwrap(), 4.0);
    }

    #[test]
    fn convert_to_text_and_values() {
        let a: LargeArray = NumericLargeArray::wrap(vec![1i32, 22]).into();
        let s = convert(&a, LargeArrayType::String).unwrap();
        assert_eq!(s.get_text(1).unwrap().as_deref(), Some("22"));
        let o = convert(&a, LargeArrayType::Object).unwrap();
        match &o {
            LargeArray::Object(o) => assert_eq!(o.get(0).unwrap(), Some(json!(1))),
            other => panic!("unexpected kind {:?}", other.get_type()),
        }
        let back = convert(&s, LargeArrayType::Int).unwrap();
        assert_eq!(back.get_int_data().unwrap().unwrap(), vec![1, 2]);
    }

    #[test]
    fn logic_conversion_uses_nonzero() {
        let a: LargeArray = NumericLargeArray::wrap(vec![0i64, 5, -1]).into();
        let l = convert(&a, LargeArrayType::Logic).unwrap();
        assert_eq!(l.get_boolean_data().unwrap().unwrap(), vec![false, true, true]);
    }

    #[test]
    fn copy_within_bounds() {
        let src: LargeArray = NumericLargeArray::wrap(vec![1i32, 2, 3, 4]).into();
        let mut dest = create(LargeArrayType::Int, 5, true).unwrap();
        arraycopy(&src, 1, &mut dest, 2, 3).unwrap();
        assert_eq!(dest.get_int_data().unwrap().unwrap(), vec![0, 0, 2, 3, 4]);

        assert!(matches!(
            arraycopy(&src, 2, &mut dest, 0, 3),
            Err(LargeArrayError::IndexOutOfRange { .. })
        ));
        let mut longs = create(LargeArrayType::Long, 4, true).unwrap();
        assert!(matches!(
            arraycopy(&src, 0, &mut longs, 0, 1),
            Err(LargeArrayError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn copy_from_constant_materializes_destination() {
        let src = create_constant(LargeArrayType::Float, 3, 1.5).unwrap();
        let mut dest = create_constant(LargeArrayType::Float, 3, 0.0).unwrap();
        arraycopy(&src, 0, &mut dest, 1, 2).unwrap();
        assert!(!dest.is_constant());
        assert_eq!(dest.get_float_data().unwrap().unwrap(), vec![0.0, 1.5, 1.5]);
    }

    #[test]
    fn copy_strings() {
        let src = strings(vec![Some("a"), None, Some("c")]).unwrap();
        let mut dest = strings(vec![Some("x"), Some("y"), Some("z")]).unwrap();
        arraycopy(&src, 1, &mut dest, 0, 2).unwrap();
        assert_eq!(dest.get_text(0).unwrap(), None);
        assert_eq!(dest.get_text(1).unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn failed_object_copy_leaves_destination_alone() {
        let mut partial = ObjectLargeArray::with_length(3).unwrap();
        partial.set(0, Some(json!(1))).unwrap();
        partial.set(1, Some(json!(2))).unwrap();
        let src: LargeArray = partial.into();
        let mut dest = objects(vec![json!(7), json!(8), json!(9)]).unwrap();
        assert!(matches!(
            arraycopy(&src, 0, &mut dest, 0, 3),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert_eq!(dest.get_value(0).unwrap(), Some(json!(7)));
        assert_eq!(dest.get_value(1).unwrap(), Some(json!(8)));

        arraycopy(&src, 0, &mut dest, 1, 2).unwrap();
        assert_eq!(dest.get_value(2).unwrap(), Some(json!(2)));
    }

    #[test]
    fn select_with_mask() {
        let src: LargeArray = NumericLargeArray::wrap(vec![10i8, 20, 30]).into();
        let mask: LargeArray = NumericLargeArray::wrap(vec![true, false, true]).into();
        let picked = select(&src, &mask).unwrap().unwrap();
        assert_eq!(picked.get_byte_data().unwrap().unwrap(), vec![10, 30]);

        let none: LargeArray = NumericLargeArray::wrap(vec![false; 3]).into();
        assert!(select(&src, &none).unwrap().is_none());

        assert!(matches!(
            select(&src, &src),
            Err(LargeArrayError::InvalidArgument(_))
        ));

        let objs = objects(vec![json!(1), json!(2), json!(3)]).unwrap();
        let picked = select(&objs, &mask).unwrap().unwrap();
        assert_eq!(picked.length(), 2);
        assert_eq!(picked.get_value(1).unwrap(), Some(json!(3)));
    }

    #[test]
    fn random_arrays_are_reproducible() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = generate_random_with(LargeArrayType::Double, 100, &mut rng).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let b = generate_random_with(LargeArrayType::Double, 100, &mut rng).unwrap();
        assert_eq!(a, b);
        for v in a.get_double_data().unwrap().unwrap() {
            assert!((0.0..1.0).contains(&v));
        }
        let c = generate_random(LargeArrayType::ComplexFloat, 10).unwrap();
        assert_eq!(c.length(), 10);
        assert!(generate_random(LargeArrayType::String, 10).is_err());
    }
}
