#![no_main]

use arbitrary::Arbitrary;
use largearrays::LargeArray;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Element {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Pair(f64, f64),
}

impl Element {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Element::Null => serde_json::Value::Null,
            Element::Bool(b) => (*b).into(),
            Element::Int(n) => (*n).into(),
            Element::Real(n) => (*n).into(),
            Element::Text(s) => s.clone().into(),
            Element::Pair(re, im) => serde_json::json!([re, im]),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct Record {
    element_type: u8,
    length: i64,
    max_element_size: Option<i32>,
    elements: Vec<Element>,
}

fuzz_target!(|record: Record| {
    let types = largearrays::LargeArrayType::values();
    let element_type = types[record.element_type as usize % types.len()];
    let value = serde_json::json!({
        "type": element_type,
        "length": record.length,
        "max_element_size": record.max_element_size,
        "elements": record.elements.iter().map(Element::to_json).collect::<Vec<_>>(),
    });
    if let Ok(array) = serde_json::from_value::<LargeArray>(value) {
        assert_eq!(array.get_type(), element_type);
        assert_eq!(array.length(), record.length);
    }
});
