//! Arrays above the large array threshold live in raw memory. Every test in
//! this file lowers the threshold to the same value.

use largearrays::config::set_large_array_threshold;
use largearrays::utils::{arraycopy, convert, strings};
use largearrays::{
    LargeArray, LargeArrayError, LargeArrayType, NumericLargeArray, StorageMode,
    StringLargeArray,
};

const THRESHOLD: i64 = 8;

fn lower_threshold() {
    set_large_array_threshold(THRESHOLD).unwrap();
}

#[test]
fn numeric_arrays_switch_to_raw() {
    lower_threshold();
    let small = LargeArray::new(LargeArrayType::Int, THRESHOLD).unwrap();
    assert_eq!(small.mode(), StorageMode::Heap);
    assert!(!small.is_large());

    let mut large = LargeArray::new(LargeArrayType::Int, THRESHOLD + 1).unwrap();
    assert_eq!(large.mode(), StorageMode::Raw);
    assert!(large.is_large());
    assert_eq!(large.get_int(THRESHOLD).unwrap(), 0);
    large.set_int(3, -7).unwrap();
    assert_eq!(large.get_long(3).unwrap(), -7);
    assert!(matches!(
        large.get_int(THRESHOLD + 1),
        Err(LargeArrayError::IndexOutOfRange { .. })
    ));
}

#[test]
fn raw_and_heap_arrays_compare_by_content() {
    lower_threshold();
    let items: Vec<f64> = (0..20).map(f64::from).collect();
    let raw: LargeArray = NumericLargeArray::from_vec(items.clone()).unwrap().into();
    let heap: LargeArray = NumericLargeArray::wrap(items).into();
    assert_eq!(raw.mode(), StorageMode::Raw);
    assert_eq!(heap.mode(), StorageMode::Heap);
    assert_eq!(raw, heap);
    assert_eq!(raw.hash_code(1.0).unwrap(), heap.hash_code(1.0).unwrap());
}

#[test]
fn constants_materialize_into_raw_storage() {
    lower_threshold();
    let mut a = LargeArray::new_constant(LargeArrayType::Short, 32, 5.0).unwrap();
    assert_eq!(a.mode(), StorageMode::Constant);
    a.set_short(31, 1).unwrap();
    assert!(!a.is_constant());
    assert_eq!(a.mode(), StorageMode::Raw);
    assert_eq!(a.get_short(0).unwrap(), 5);
    assert_eq!(a.get_short(31).unwrap(), 1);
}

#[test]
fn raw_strings_enforce_capacity() {
    lower_threshold();
    let mut a = StringLargeArray::new(16, 4).unwrap();
    assert_eq!(a.mode(), StorageMode::Raw);
    a.set(0, Some("abcd".to_owned())).unwrap();
    a.set(1, Some(String::new())).unwrap();
    assert!(matches!(
        a.set(2, Some("abcde".to_owned())),
        Err(LargeArrayError::ElementTooLarge { .. })
    ));
    assert_eq!(a.get(0).unwrap().as_deref(), Some("abcd"));
    assert_eq!(a.get(1).unwrap().as_deref(), Some(""));
    assert_eq!(a.get(2).unwrap(), None);
}

#[test]
fn raw_constants_check_capacity_up_front() {
    lower_threshold();
    assert!(matches!(
        StringLargeArray::new_with_value(16, 4, Some("abcde".to_owned()), true),
        Err(LargeArrayError::ElementTooLarge { .. })
    ));

    let mut a = StringLargeArray::new_with_value(16, 4, Some("abcd".to_owned()), true).unwrap();
    assert!(a.is_constant());
    a.set(3, Some("x".to_owned())).unwrap();
    assert_eq!(a.mode(), StorageMode::Raw);
    assert_eq!(a.get(0).unwrap().as_deref(), Some("abcd"));

    let small = StringLargeArray::new_with_value(THRESHOLD, 4, Some("abcde".to_owned()), true);
    assert!(small.is_ok());
}

#[test]
fn copies_between_storage_modes() {
    lower_threshold();
    let src: LargeArray = NumericLargeArray::from_vec((0..12i64).collect()).unwrap().into();
    let mut dest = LargeArray::new(LargeArrayType::Long, 4).unwrap();
    arraycopy(&src, 8, &mut dest, 0, 4).unwrap();
    assert_eq!(dest.get_long_data().unwrap().unwrap(), vec![8, 9, 10, 11]);

    let text = convert(&src, LargeArrayType::String).unwrap();
    assert_eq!(text.mode(), StorageMode::Raw);
    assert_eq!(text.get_text(11).unwrap().as_deref(), Some("11"));

    let words = strings((0..10).map(|i| Some(format!("w{}", i)))).unwrap();
    let mut copy = LargeArray::new(LargeArrayType::String, 10).unwrap();
    assert_eq!(copy.mode(), StorageMode::Raw);
    arraycopy(&words, 0, &mut copy, 0, 10).unwrap();
    assert_eq!(copy.get_text(9).unwrap().as_deref(), Some("w9"));
    assert_eq!(copy, words);
}

#[test]
fn oversized_raw_request_fails_cleanly() {
    lower_threshold();
    assert!(matches!(
        LargeArray::new(LargeArrayType::Double, i64::MAX),
        Err(LargeArrayError::OutOfMemory(_))
    ));
    assert!(matches!(
        NumericLargeArray::<i64>::new(i64::MAX / 4),
        Err(LargeArrayError::OutOfMemory(_))
    ));
}

#[test]
fn rejected_string_copy_writes_nothing() {
    lower_threshold();
    let src = strings(vec![Some("ab"), Some("abcdef")]).unwrap();
    let mut dest: LargeArray = StringLargeArray::new(16, 4).unwrap().into();
    assert_eq!(dest.mode(), StorageMode::Raw);
    assert!(matches!(
        arraycopy(&src, 0, &mut dest, 0, 2),
        Err(LargeArrayError::ElementTooLarge { .. })
    ));
    assert_eq!(dest.get_text(0).unwrap(), None);

    arraycopy(&src, 0, &mut dest, 5, 1).unwrap();
    assert_eq!(dest.get_text(5).unwrap().as_deref(), Some("ab"));
}
