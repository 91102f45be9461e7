//! Elementwise evaluation of operators over numeric arrays
//!
//! Every operator runs in one of three domains chosen from the operand and
//! output kinds: wrapping `i64` when everything is integral, `f64` for real
//! results and `Complex<f64>` as soon as a complex value is involved. The
//! result is converted to the output representation element by element.

use std::fmt::{self, Debug, Display, Formatter};

use num_complex::Complex;
use rayon::prelude::*;
use tracing::debug;

use crate::array::LargeArray;
use crate::complex;
use crate::config;
use crate::element::Element;
use crate::error::{LargeArrayError, Result};
use crate::numeric::NumericLargeArray;
use crate::types::LargeArrayType;

/// Elementwise operators understood by [`evaluate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LargeArrayOperator {
    /// `|a|`
    Abs,
    /// Arc cosine
    Acos,
    /// Sum of two or more operands
    Add,
    /// Arc sine
    Asin,
    /// Arc tangent
    Atan,
    /// `a * x + b`
    Axpy,
    /// Cosine
    Cos,
    /// `a - b`
    Diff,
    /// `a / b`
    Div,
    /// `e^a`
    Exp,
    /// Natural logarithm
    Log,
    /// Base 10 logarithm
    Log10,
    /// `a * b`
    Mult,
    /// `-a`
    Neg,
    /// `a` raised to `b`
    Pow,
    /// -1, 0 or 1 as a byte
    Signum,
    /// Sine
    Sin,
    /// Square root
    Sqrt,
    /// Tangent
    Tan,
}

impl LargeArrayOperator {
    /// Smallest and largest number of operands accepted.
    #[must_use]
    pub fn arity(self) -> (usize, usize) {
        use LargeArrayOperator::*;
        match self {
            Add => (2, usize::MAX),
            Diff | Mult | Div | Pow => (2, 2),
            Axpy => (3, 3),
            _ => (1, 1),
        }
    }

    /// True for operators whose result is fractional even on integers.
    fn is_floating(self) -> bool {
        use LargeArrayOperator::*;
        matches!(
            self,
            Sqrt | Log | Log10 | Exp | Sin | Cos | Tan | Asin | Acos | Atan | Pow
        )
    }
}

impl Display for LargeArrayOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

#[derive(Copy, Clone)]
enum Operand<'a> {
    Logic(&'a NumericLargeArray<bool>),
    Byte(&'a NumericLargeArray<i8>),
    UnsignedByte(&'a NumericLargeArray<u8>),
    Short(&'a NumericLargeArray<i16>),
    Int(&'a NumericLargeArray<i32>),
    Long(&'a NumericLargeArray<i64>),
    Float(&'a NumericLargeArray<f32>),
    Double(&'a NumericLargeArray<f64>),
    ComplexFloat(&'a NumericLargeArray<Complex<f32>>),
    ComplexDouble(&'a NumericLargeArray<Complex<f64>>),
}

macro_rules! with_operand {
    ($operand:expr, $a:ident => $body:expr) => {
        match $operand {
            Operand::Logic($a) => $body,
            Operand::Byte($a) => $body,
            Operand::UnsignedByte($a) => $body,
            Operand::Short($a) => $body,
            Operand::Int($a) => $body,
            Operand::Long($a) => $body,
            Operand::Float($a) => $body,
            Operand::Double($a) => $body,
            Operand::ComplexFloat($a) => $body,
            Operand::ComplexDouble($a) => $body,
        }
    };
}

impl<'a> Operand<'a> {
    fn new(operator: LargeArrayOperator, array: &'a LargeArray) -> Result<Self> {
        Ok(match array {
            LargeArray::Logic(a) => Operand::Logic(a),
            LargeArray::Byte(a) => Operand::Byte(a),
            LargeArray::UnsignedByte(a) => Operand::UnsignedByte(a),
            LargeArray::Short(a) => Operand::Short(a),
            LargeArray::Int(a) => Operand::Int(a),
            LargeArray::Long(a) => Operand::Long(a),
            LargeArray::Float(a) => Operand::Float(a),
            LargeArray::Double(a) => Operand::Double(a),
            LargeArray::ComplexFloat(a) => Operand::ComplexFloat(a),
            LargeArray::ComplexDouble(a) => Operand::ComplexDouble(a),
            other => {
                return Err(LargeArrayError::UnsupportedOperator {
                    operator,
                    element_type: other.get_type(),
                })
            }
        })
    }

    fn get_type(self) -> LargeArrayType {
        with_operand!(self, a => a.get_type())
    }

    fn length(self) -> i64 {
        with_operand!(self, a => a.length())
    }

    fn is_constant(self) -> bool {
        with_operand!(self, a => a.is_constant())
    }

    fn long(self, i: usize) -> i64 {
        with_operand!(self, a => a.value(i).to_long())
    }

    fn double(self, i: usize) -> f64 {
        with_operand!(self, a => a.value(i).to_double())
    }

    fn complex(self, i: usize) -> Complex<f64> {
        with_operand!(self, a => a.value(i).to_complex())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Domain {
    Integer,
    Real,
    Complex,
}

/// Output kind chosen when the caller does not name one.
///
/// The widest operand kind wins. Fractional operators lift integers to
/// `Float`, or to `Double` for `Long`. Complex operands produce
/// `ComplexDouble` when any operand carries double precision and
/// `ComplexFloat` otherwise, and `Abs` maps complex kinds back to their
/// real counterpart. `Signum` always yields `Byte`.
#[must_use]
pub fn result_type(operator: LargeArrayOperator, operands: &[LargeArrayType]) -> LargeArrayType {
    use LargeArrayType::*;
    if operator == LargeArrayOperator::Signum {
        return Byte;
    }
    let widest = operands.iter().copied().max().unwrap_or(Double);
    if widest.is_complex_numeric_type() {
        let double = operands.iter().any(|&t| t == Double || t == ComplexDouble);
        return match (operator, double) {
            (LargeArrayOperator::Abs, true) => Double,
            (LargeArrayOperator::Abs, false) => Float,
            (_, true) => ComplexDouble,
            (_, false) => ComplexFloat,
        };
    }
    if operator.is_floating() && widest.is_integer_numeric_type() {
        return if widest == Long { Double } else { Float };
    }
    widest
}

fn signum(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn integer_kernel(
    operator: LargeArrayOperator,
    n: usize,
    arg: impl Fn(usize) -> i64,
) -> Result<i64> {
    use LargeArrayOperator::*;
    Ok(match operator {
        Add => (1..n).fold(arg(0), |acc, k| acc.wrapping_add(arg(k))),
        Diff => arg(0).wrapping_sub(arg(1)),
        Mult => arg(0).wrapping_mul(arg(1)),
        Div => {
            let d = arg(1);
            if d == 0 {
                return Err(LargeArrayError::invalid("integer division by zero"));
            }
            arg(0).wrapping_div(d)
        }
        Neg => arg(0).wrapping_neg(),
        Abs => arg(0).wrapping_abs(),
        Signum => arg(0).signum(),
        Axpy => arg(0).wrapping_mul(arg(1)).wrapping_add(arg(2)),
        _ => real_kernel(operator, n, |k| arg(k) as f64) as i64,
    })
}

fn real_kernel(operator: LargeArrayOperator, n: usize, arg: impl Fn(usize) -> f64) -> f64 {
    use LargeArrayOperator::*;
    match operator {
        Add => (1..n).fold(arg(0), |acc, k| acc + arg(k)),
        Diff => arg(0) - arg(1),
        Mult => arg(0) * arg(1),
        Div => arg(0) / arg(1),
        Pow => arg(0).powf(arg(1)),
        Neg => -arg(0),
        Abs => arg(0).abs(),
        Signum => signum(arg(0)),
        Sqrt => arg(0).sqrt(),
        Log => arg(0).ln(),
        Log10 => arg(0).log10(),
        Exp => arg(0).exp(),
        Sin => arg(0).sin(),
        Cos => arg(0).cos(),
        Tan => arg(0).tan(),
        Asin => arg(0).asin(),
        Acos => arg(0).acos(),
        Atan => arg(0).atan(),
        Axpy => arg(0) * arg(1) + arg(2),
    }
}

fn complex_kernel(
    operator: LargeArrayOperator,
    n: usize,
    complex_exponent: bool,
    arg: impl Fn(usize) -> Complex<f64>,
) -> Complex<f64> {
    use LargeArrayOperator::*;
    match operator {
        Add => (1..n).fold(arg(0), |acc, k| complex::add(acc, arg(k))),
        Diff => complex::diff(arg(0), arg(1)),
        Mult => complex::mult(arg(0), arg(1)),
        Div => complex::div(arg(0), arg(1)),
        Pow if complex_exponent => complex::pow_complex(arg(0), arg(1)),
        Pow => complex::pow(arg(0), arg(1).re),
        Neg => complex::neg(arg(0)),
        Abs => Complex::new(complex::abs(arg(0)), 0.0),
        Signum => Complex::new(signum(arg(0).re), 0.0),
        Sqrt => complex::sqrt(arg(0)),
        Log => complex::log(arg(0)),
        Log10 => complex::log10(arg(0)),
        Exp => complex::exp(arg(0)),
        Sin => complex::sin(arg(0)),
        Cos => complex::cos(arg(0)),
        Tan => complex::tan(arg(0)),
        Asin => complex::asin(arg(0)),
        Acos => complex::acos(arg(0)),
        Atan => complex::atan(arg(0)),
        Axpy => complex::axpy(arg(0), arg(1), arg(2)),
    }
}

struct Evaluation<'a> {
    operator: LargeArrayOperator,
    operands: Vec<Operand<'a>>,
    domain: Domain,
    complex_exponent: bool,
    length: i64,
}

impl Evaluation<'_> {
    fn element<T: Element>(&self, i: usize) -> Result<T> {
        let n = self.operands.len();
        let ops = &self.operands;
        match self.domain {
            Domain::Integer => T::from_long(integer_kernel(self.operator, n, |k| ops[k].long(i))?),
            Domain::Real => T::from_double(real_kernel(self.operator, n, |k| ops[k].double(i))),
            Domain::Complex => T::from_complex(complex_kernel(
                self.operator,
                n,
                self.complex_exponent,
                |k| ops[k].complex(i),
            )),
        }
    }

    fn compute<T: Element>(&self) -> Result<NumericLargeArray<T>> {
        if self.operands.iter().all(|o| o.is_constant()) {
            let value = if self.length > 0 {
                self.element(0)?
            } else {
                T::default()
            };
            return NumericLargeArray::new_constant(self.length, value);
        }
        let mut out = NumericLargeArray::<T>::new(self.length)?;
        let slots = out.as_mut_slice()?;
        let pool = if self.length as u64 >= config::concurrent_threshold() {
            config::worker_pool()
        } else {
            None
        };
        debug!(
            operator = ?self.operator,
            output = ?T::TYPE,
            length = self.length,
            parallel = pool.is_some(),
            "evaluating operator"
        );
        match pool {
            Some(pool) => {
                let chunk = (slots.len() / pool.current_num_threads()).max(1);
                pool.install(|| {
                    slots
                        .par_chunks_mut(chunk)
                        .enumerate()
                        .try_for_each(|(c, part)| {
                            for (j, slot) in part.iter_mut().enumerate() {
                                *slot = self.element(c * chunk + j)?;
                            }
                            Ok::<_, LargeArrayError>(())
                        })
                })?;
            }
            None => {
                for (i, slot) in slots.iter_mut().enumerate() {
                    *slot = self.element(i)?;
                }
            }
        }
        Ok(out)
    }
}

macro_rules! compute_as {
    ($eval:expr, $output:expr) => {
        match $output {
            LargeArrayType::Logic => $eval.compute::<bool>().map(LargeArray::from),
            LargeArrayType::Byte => $eval.compute::<i8>().map(LargeArray::from),
            LargeArrayType::UnsignedByte => $eval.compute::<u8>().map(LargeArray::from),
            LargeArrayType::Short => $eval.compute::<i16>().map(LargeArray::from),
            LargeArrayType::Int => $eval.compute::<i32>().map(LargeArray::from),
            LargeArrayType::Long => $eval.compute::<i64>().map(LargeArray::from),
            LargeArrayType::Float => $eval.compute::<f32>().map(LargeArray::from),
            LargeArrayType::Double => $eval.compute::<f64>().map(LargeArray::from),
            LargeArrayType::ComplexFloat => $eval.compute::<Complex<f32>>().map(LargeArray::from),
            LargeArrayType::ComplexDouble => $eval.compute::<Complex<f64>>().map(LargeArray::from),
            other => Err(LargeArrayError::invalid(format!(
                "{} is not a numeric output type",
                other
            ))),
        }
    };
}

/// Applies `operator` elementwise to `operands` and returns a new array.
///
/// `output` names the result kind; without it the kind comes from
/// [`result_type`]. Every operand must be numeric and all must share one
/// length. When every operand is constant, so is the result. Long arrays
/// are split across the worker pool. Either the whole result is returned
/// or an error, never a partially written array.
pub fn evaluate(
    operator: LargeArrayOperator,
    output: Option<LargeArrayType>,
    operands: &[&LargeArray],
) -> Result<LargeArray> {
    let (min, max) = operator.arity();
    if operands.len() < min || operands.len() > max {
        return Err(LargeArrayError::invalid(format!(
            "{} takes {} operands, {} given",
            operator,
            if min == max {
                min.to_string()
            } else {
                format!("at least {}", min)
            },
            operands.len()
        )));
    }
    if let Some(t) = output {
        if !t.is_numeric_type() {
            return Err(LargeArrayError::invalid(format!(
                "{} is not a numeric output type",
                t
            )));
        }
    }
    let operands = operands
        .iter()
        .map(|&a| Operand::new(operator, a))
        .collect::<Result<Vec<_>>>()?;
    let length = operands[0].length();
    for o in &operands[1..] {
        if o.length() != length {
            return Err(LargeArrayError::DimensionMismatch {
                expected: length,
                found: o.length(),
            });
        }
    }
    let types: Vec<LargeArrayType> = operands.iter().map(|o| o.get_type()).collect();
    if operator == LargeArrayOperator::Signum {
        if let Some(&t) = types.iter().find(|t| t.is_complex_numeric_type()) {
            return Err(LargeArrayError::UnsupportedOperator {
                operator,
                element_type: t,
            });
        }
    }
    let output = output.unwrap_or_else(|| result_type(operator, &types));
    let domain = if output.is_complex_numeric_type()
        || types.iter().any(|t| t.is_complex_numeric_type())
    {
        Domain::Complex
    } else if output.is_integer_numeric_type() && types.iter().all(|t| t.is_integer_numeric_type())
    {
        Domain::Integer
    } else {
        Domain::Real
    };
    let complex_exponent =
        operator == LargeArrayOperator::Pow && types[1].is_complex_numeric_type();
    let eval = Evaluation {
        operator,
        operands,
        domain,
        complex_exponent,
        length,
    };
    compute_as!(eval, output)
}
