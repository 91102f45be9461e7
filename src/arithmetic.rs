//! Named entry points for the elementwise operators
//!
//! Every function comes in two forms: one that picks the output kind with
//! [`result_type`](crate::operator::result_type), and an `_as` form that
//! takes it explicitly.

use crate::array::LargeArray;
use crate::error::Result;
use crate::numeric::NumericLargeArray;
use crate::operator::{evaluate, LargeArrayOperator};
use crate::types::LargeArrayType;

macro_rules! unary_impl {
    ($(($name:ident, $name_as:ident, $op:ident)),*) => {
        $(
            #[doc = concat!("Elementwise `", stringify!($op), "` of `a`.")]
            pub fn $name(a: &LargeArray) -> Result<LargeArray> {
                evaluate(LargeArrayOperator::$op, None, &[a])
            }

            #[doc = concat!("Elementwise `", stringify!($op), "` of `a` as an array of `output` elements.")]
            pub fn $name_as(a: &LargeArray, output: LargeArrayType) -> Result<LargeArray> {
                evaluate(LargeArrayOperator::$op, Some(output), &[a])
            }
        )*
    };
}

macro_rules! binary_impl {
    ($(($name:ident, $name_as:ident, $op:ident)),*) => {
        $(
            #[doc = concat!("Elementwise `", stringify!($op), "` of `a` and `b`.")]
            pub fn $name(a: &LargeArray, b: &LargeArray) -> Result<LargeArray> {
                evaluate(LargeArrayOperator::$op, None, &[a, b])
            }

            #[doc = concat!("Elementwise `", stringify!($op), "` of `a` and `b` as an array of `output` elements.")]
            pub fn $name_as(a: &LargeArray, b: &LargeArray, output: LargeArrayType) -> Result<LargeArray> {
                evaluate(LargeArrayOperator::$op, Some(output), &[a, b])
            }
        )*
    };
}

binary_impl!(
    (add, add_as, Add),
    (diff, diff_as, Diff),
    (mult, mult_as, Mult),
    (div, div_as, Div),
    (pow, pow_as, Pow)
);

unary_impl!(
    (neg, neg_as, Neg),
    (sqrt, sqrt_as, Sqrt),
    (log, log_as, Log),
    (log10, log10_as, Log10),
    (exp, exp_as, Exp),
    (abs, abs_as, Abs),
    (sin, sin_as, Sin),
    (cos, cos_as, Cos),
    (tan, tan_as, Tan),
    (asin, asin_as, Asin),
    (acos, acos_as, Acos),
    (atan, atan_as, Atan),
    (signum, signum_as, Signum)
);

/// `a * x + b` elementwise.
pub fn axpy(a: &LargeArray, x: &LargeArray, b: &LargeArray) -> Result<LargeArray> {
    evaluate(LargeArrayOperator::Axpy, None, &[a, x, b])
}

/// `a * x + b` elementwise as an array of `output` elements.
pub fn axpy_as(
    a: &LargeArray,
    x: &LargeArray,
    b: &LargeArray,
    output: LargeArrayType,
) -> Result<LargeArray> {
    evaluate(LargeArrayOperator::Axpy, Some(output), &[a, x, b])
}

/// The exponent as a constant array. Integer and `Float` bases get a `Float`
/// exponent, every other base a `Double` one.
fn scalar_exponent(a: &LargeArray, n: f64) -> Result<LargeArray> {
    let t = a.get_type();
    Ok(if t.is_integer_numeric_type() || t == LargeArrayType::Float {
        NumericLargeArray::new_constant(a.length(), n as f32)?.into()
    } else {
        NumericLargeArray::new_constant(a.length(), n)?.into()
    })
}

/// Raises every element of `a` to the real power `n`.
pub fn pow_scalar(a: &LargeArray, n: f64) -> Result<LargeArray> {
    pow(a, &scalar_exponent(a, n)?)
}

/// Raises every element of `a` to the real power `n` as an array of `output`
/// elements.
pub fn pow_scalar_as(a: &LargeArray, n: f64, output: LargeArrayType) -> Result<LargeArray> {
    pow_as(a, &scalar_exponent(a, n)?, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn scalar_powers_promote() {
        let ints: LargeArray = NumericLargeArray::wrap(vec![1i16, 2, 3]).into();
        let squared = pow_scalar(&ints, 2.0).unwrap();
        assert_eq!(squared.get_type(), LargeArrayType::Float);
        assert_eq!(squared.get_float_data().unwrap().unwrap(), vec![1.0, 4.0, 9.0]);

        let doubles: LargeArray = NumericLargeArray::wrap(vec![0.5f64, 4.0]).into();
        let roots = pow_scalar(&doubles, 0.5).unwrap();
        assert_eq!(roots.get_type(), LargeArrayType::Double);
        assert_eq!(roots.get_double(1).unwrap(), 2.0);

        let as_long = pow_scalar_as(&ints, 3.0, LargeArrayType::Long).unwrap();
        assert_eq!(as_long.get_long_data().unwrap().unwrap(), vec![1, 8, 27]);
    }

    #[test]
    fn complex_base_with_real_exponent() {
        let c: LargeArray =
            NumericLargeArray::<Complex<f64>>::from_interleaved(vec![0.0, 1.0]).unwrap().into();
        let r = pow_scalar(&c, 2.0).unwrap();
        let v = r.get_complex_double(0).unwrap();
        assert!((v.re + 1.0).abs() < 1e-12);
        assert!(v.im.abs() < 1e-12);
    }

    #[test]
    fn explicit_output_types() {
        let a: LargeArray = NumericLargeArray::wrap(vec![1.9f64, -1.9]).into();
        let b: LargeArray = NumericLargeArray::wrap(vec![0.2f64, 0.2]).into();
        let r = add_as(&a, &b, LargeArrayType::Int).unwrap();
        assert_eq!(r.get_int_data().unwrap().unwrap(), vec![2, -1]);
        let s = signum_as(&a, LargeArrayType::Short).unwrap();
        assert_eq!(s.get_short_data().unwrap().unwrap(), vec![1, -1]);
    }
}
