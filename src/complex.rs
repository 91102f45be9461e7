//! Scalar complex arithmetic used by the evaluation engine
//!
//! Each function follows one fixed closed form so that signed zeros and
//! branch cuts come out the same on every platform. They deliberately do
//! not defer to the `num_complex` methods of the same name.
#![allow(clippy::float_cmp)]

use num_complex::Complex;

const I: Complex<f64> = Complex { re: 0.0, im: 1.0 };
const ONE: Complex<f64> = Complex { re: 1.0, im: 0.0 };

/// `a + b`
#[must_use]
pub fn add(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re + b.re, a.im + b.im)
}

/// `a - b`
#[must_use]
pub fn diff(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re - b.re, a.im - b.im)
}

/// `a * b`
#[must_use]
pub fn mult(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re * b.re - a.im * b.im, a.im * b.re + a.re * b.im)
}

/// `a / b`, multiplying by the conjugate of `b` over its squared modulus.
#[must_use]
pub fn div(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    let r = b.re * b.re + b.im * b.im;
    Complex::new(
        (a.re * b.re + a.im * b.im) / r,
        (a.im * b.re - a.re * b.im) / r,
    )
}

/// `-a`
#[must_use]
pub fn neg(a: Complex<f64>) -> Complex<f64> {
    Complex::new(-a.re, -a.im)
}

/// Modulus. A zero imaginary part short-circuits to `|re|`.
#[must_use]
pub fn abs(a: Complex<f64>) -> f64 {
    if a.im == 0.0 {
        a.re.abs()
    } else {
        (a.re * a.re + a.im * a.im).sqrt()
    }
}

/// Argument in `(-pi, pi]`
#[must_use]
pub fn arg(a: Complex<f64>) -> f64 {
    a.im.atan2(a.re)
}

/// `a` raised to a real power, in polar form.
#[must_use]
pub fn pow(a: Complex<f64>, n: f64) -> Complex<f64> {
    let modulus = abs(a).powf(n);
    let theta = arg(a);
    Complex::new(modulus * (n * theta).cos(), modulus * (n * theta).sin())
}

/// `a` raised to a complex power: `exp(n * log(a))`.
#[must_use]
pub fn pow_complex(a: Complex<f64>, n: Complex<f64>) -> Complex<f64> {
    exp(mult(n, log(a)))
}

/// Principal square root by the half-angle formula. The sign of the
/// imaginary part follows `a.im`, with `+0.0` counting as positive.
#[must_use]
pub fn sqrt(a: Complex<f64>) -> Complex<f64> {
    let modulus = abs(a);
    let re = ((a.re + modulus) / 2.0).max(0.0).sqrt();
    let im = a.im.signum() * ((-a.re + modulus) / 2.0).max(0.0).sqrt();
    Complex::new(re, im)
}

/// Natural logarithm
#[must_use]
pub fn log(a: Complex<f64>) -> Complex<f64> {
    Complex::new(abs(a).ln(), arg(a))
}

/// Base-10 logarithm
#[must_use]
pub fn log10(a: Complex<f64>) -> Complex<f64> {
    let ln10 = std::f64::consts::LN_10;
    Complex::new(abs(a).ln() / ln10, arg(a) / ln10)
}

/// `e^a`
#[must_use]
pub fn exp(a: Complex<f64>) -> Complex<f64> {
    let e = a.re.exp();
    Complex::new(e * a.im.cos(), e * a.im.sin())
}

/// `sin(a)`
#[must_use]
pub fn sin(a: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re.sin() * a.im.cosh(), a.re.cos() * a.im.sinh())
}

/// `cos(a)`
#[must_use]
pub fn cos(a: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re.cos() * a.im.cosh(), -a.re.sin() * a.im.sinh())
}

/// `sin(a) / cos(a)`
#[must_use]
pub fn tan(a: Complex<f64>) -> Complex<f64> {
    div(sin(a), cos(a))
}

/// `-i ln(iz + sqrt(1 - z^2))`
#[must_use]
pub fn asin(a: Complex<f64>) -> Complex<f64> {
    let root = sqrt(diff(ONE, mult(a, a)));
    mult(neg(I), log(add(mult(I, a), root)))
}

/// `-i ln(z + i sqrt(1 - z^2))`
#[must_use]
pub fn acos(a: Complex<f64>) -> Complex<f64> {
    let root = sqrt(diff(ONE, mult(a, a)));
    mult(neg(I), log(add(a, mult(I, root))))
}

/// `(i/2) ln((i + z) / (i - z))`
#[must_use]
pub fn atan(a: Complex<f64>) -> Complex<f64> {
    let half_i = Complex::new(0.0, 0.5);
    mult(half_i, log(div(add(I, a), diff(I, a))))
}

/// `a * x + b`
#[must_use]
pub fn axpy(a: Complex<f64>, x: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    add(mult(a, x), b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Complex<f64>, b: Complex<f64>) -> bool {
        (a.re - b.re).abs() < 1e-9 && (a.im - b.im).abs() < 1e-9
    }

    #[test]
    fn sqrt_of_negative_real() {
        assert_eq!(sqrt(Complex::new(-4.0, 0.0)), Complex::new(0.0, 2.0));
        assert_eq!(sqrt(Complex::new(-4.0, -0.0)), Complex::new(0.0, -2.0));
        assert!(close(sqrt(Complex::new(3.0, 4.0)), Complex::new(2.0, 1.0)));
    }

    #[test]
    fn division_inverts_multiplication() {
        let a = Complex::new(1.5, -2.25);
        let b = Complex::new(-0.5, 3.0);
        assert!(close(mult(div(a, b), b), a));
    }

    #[test]
    fn abs_fast_path_keeps_sign_handling() {
        assert_eq!(abs(Complex::new(-3.0, 0.0)), 3.0);
        assert_eq!(abs(Complex::new(-3.0, -0.0)), 3.0);
        assert_eq!(abs(Complex::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn powers_agree() {
        let a = Complex::new(0.75, -1.25);
        assert!(close(pow(a, 2.0), mult(a, a)));
        assert!(close(pow_complex(a, Complex::new(2.0, 0.0)), mult(a, a)));
        assert!(close(exp(log(a)), a));
        assert!(close(log10(Complex::new(100.0, 0.0)), Complex::new(2.0, 0.0)));
    }

    #[test]
    fn trig_matches_real_axis() {
        let x = 0.3;
        let z = Complex::new(x, 0.0);
        assert!(close(sin(z), Complex::new(x.sin(), 0.0)));
        assert!(close(cos(z), Complex::new(x.cos(), 0.0)));
        assert!(close(tan(z), Complex::new(x.tan(), 0.0)));
        assert!(close(asin(z), Complex::new(x.asin(), 0.0)));
        assert!(close(acos(z), Complex::new(x.acos(), 0.0)));
        assert!(close(atan(z), Complex::new(x.atan(), 0.0)));
    }

    #[test]
    fn inverse_trig_round_trips() {
        let z = Complex::new(0.2, 0.4);
        assert!(close(sin(asin(z)), z));
        assert!(close(cos(acos(z)), z));
        assert!(close(tan(atan(z)), z));
    }

    #[test]
    fn axpy_composes() {
        let a = Complex::new(2.0, 1.0);
        let x = Complex::new(0.0, 1.0);
        let b = Complex::new(1.0, 1.0);
        assert_eq!(axpy(a, x, b), Complex::new(0.0, 3.0));
    }
}
