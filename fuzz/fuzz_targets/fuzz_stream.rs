#![no_main]

use largearrays::{LargeArray, LargeArrayType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let expected = match data.first() {
        Some(&b) => LargeArrayType::values()[b as usize % LargeArrayType::values().len()],
        None => return,
    };
    if let Ok(array) = LargeArray::read_from(&mut &data[..], expected) {
        // Object elements may grow when written back in canonical form.
        let mut out = Vec::new();
        if array.write_to(&mut out).is_ok() {
            let again = LargeArray::read_from(&mut out.as_slice(), expected).unwrap();
            assert_eq!(array, again);
        }
    }
});
