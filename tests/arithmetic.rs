use largearrays::arithmetic::{add, diff, div, mult, pow_scalar, sqrt};
use largearrays::utils::generate_random_with;
use largearrays::{
    evaluate, LargeArray, LargeArrayError, LargeArrayOperator, LargeArrayType,
    NumericLargeArray,
};
use num_complex::Complex;
use rand::rngs::StdRng;
use rand::SeedableRng;

const EPS: f64 = 1e-9;

#[test]
fn add_then_diff_gives_back_the_operand() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = generate_random_with(LargeArrayType::Double, 64, &mut rng).unwrap();
    let b = generate_random_with(LargeArrayType::Double, 64, &mut rng).unwrap();
    let back = diff(&add(&a, &b).unwrap(), &b).unwrap();
    for i in 0..64 {
        let x = a.get_double(i).unwrap();
        assert!((back.get_double(i).unwrap() - x).abs() < EPS);
    }
}

#[test]
fn complex_division_undoes_multiplication() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = generate_random_with(LargeArrayType::ComplexDouble, 32, &mut rng).unwrap();
    let b = generate_random_with(LargeArrayType::ComplexDouble, 32, &mut rng).unwrap();
    let back = div(&mult(&a, &b).unwrap(), &b).unwrap();
    for i in 0..32 {
        let x = a.get_complex_double(i).unwrap();
        let y = back.get_complex_double(i).unwrap();
        assert!((x - y).norm() < 1e-6, "{} != {}", x, y);
    }
}

#[test]
fn squaring_matches_self_multiplication() {
    let a: LargeArray = NumericLargeArray::wrap(vec![-1.5f64, 0.0, 2.25, 10.0]).into();
    let squared = pow_scalar(&a, 2.0).unwrap();
    let product = mult(&a, &a).unwrap();
    for i in 0..4 {
        let x = squared.get_double(i).unwrap();
        let y = product.get_double(i).unwrap();
        assert!((x - y).abs() < EPS);
    }
}

#[test]
fn mismatched_lengths_are_rejected() {
    let a = LargeArray::new(LargeArrayType::Int, 3).unwrap();
    let b = LargeArray::new(LargeArrayType::Int, 4).unwrap();
    assert!(matches!(
        add(&a, &b),
        Err(LargeArrayError::DimensionMismatch { .. })
    ));
}

#[test]
fn square_root_of_negative_one_is_i() {
    let a: LargeArray = NumericLargeArray::<Complex<f64>>::from_interleaved(vec![-1.0, 0.0])
        .unwrap()
        .into();
    let r = sqrt(&a).unwrap();
    let v = r.get_complex_double(0).unwrap();
    assert!(v.re.abs() < EPS);
    assert!((v.im - 1.0).abs() < EPS);
}

#[test]
fn constant_int_scenario() {
    let a = LargeArray::new_constant(LargeArrayType::Int, 10, 3.0).unwrap();
    let b = LargeArray::new_constant(LargeArrayType::Int, 10, 4.0).unwrap();
    let sum = add(&a, &b).unwrap();
    assert_eq!(sum.get_type(), LargeArrayType::Int);
    assert!(sum.is_constant());
    assert_eq!(sum.get_int(9).unwrap(), 7);

    let sum = evaluate(LargeArrayOperator::Add, None, &[&a, &b, &a]).unwrap();
    assert_eq!(sum.get_int(0).unwrap(), 10);
}

#[test]
fn unsigned_bytes_are_range_checked() {
    let mut a = LargeArray::new(LargeArrayType::UnsignedByte, 2).unwrap();
    a.set_unsigned_byte(0, 255).unwrap();
    assert_eq!(a.get_unsigned_byte(0).unwrap(), 255);
    assert!(matches!(
        a.set_unsigned_byte(1, 300),
        Err(LargeArrayError::InvalidArgument(_))
    ));
    assert_eq!(a.get_unsigned_byte(1).unwrap(), 0);
}
