//! serde support for [`LargeArray`]
//!
//! An array is a record of its `type`, `length`, `max_element_size` (null
//! for fixed-width kinds) and `elements`. Elements are streamed one by one,
//! so serializing a constant array never materializes it. Elements that
//! arrive before the `type` field are buffered as JSON values.

use std::fmt::{self, Formatter};

use num_complex::Complex;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::array::LargeArray;
use crate::config::{DEFAULT_MAX_OBJECT_SIZE, DEFAULT_MAX_STRING_LENGTH};
use crate::element::Element;
use crate::numeric::NumericLargeArray;
use crate::types::LargeArrayType;
use crate::varlen::{VarElement, VarLengthLargeArray};

const FIELDS: &[&str] = &["type", "length", "max_element_size", "elements"];

struct NumericElements<'a, T: Element>(&'a NumericLargeArray<T>);

impl<'a, T: Element> Serialize for NumericElements<'a, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.0.length() as usize;
        let mut seq = serializer.serialize_seq(Some(len))?;
        for i in 0..len {
            seq.serialize_element(&self.0.value(i))?;
        }
        seq.end()
    }
}

struct VarElements<'a, V: VarElement>(&'a VarLengthLargeArray<V>);

impl<'a, V: VarElement> Serialize for VarElements<'a, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.0.length() as usize;
        let mut seq = serializer.serialize_seq(Some(len))?;
        for i in 0..len {
            seq.serialize_element(&self.0.value(i))?;
        }
        seq.end()
    }
}

impl Serialize for LargeArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("LargeArray", FIELDS.len())?;
        record.serialize_field("type", &self.get_type())?;
        record.serialize_field("length", &self.length())?;
        let max_element_size = match self {
            LargeArray::String(a) => Some(a.max_element_size()),
            LargeArray::Object(a) => Some(a.max_element_size()),
            _ => None,
        };
        record.serialize_field("max_element_size", &max_element_size)?;
        match self {
            LargeArray::Logic(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::Byte(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::UnsignedByte(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::Short(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::Int(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::Long(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::Float(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::Double(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::ComplexFloat(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::ComplexDouble(a) => record.serialize_field("elements", &NumericElements(a))?,
            LargeArray::String(a) => record.serialize_field("elements", &VarElements(a))?,
            LargeArray::Object(a) => record.serialize_field("elements", &VarElements(a))?,
        }
        record.end()
    }
}

/// Deserializes the `elements` field once the kind is known.
struct ElementsSeed {
    element_type: LargeArrayType,
    max_element_size: Option<i32>,
}

impl<'de> DeserializeSeed<'de> for ElementsSeed {
    type Value = LargeArray;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<LargeArray, D::Error> {
        use LargeArrayType::*;
        let res = match self.element_type {
            Logic => NumericLargeArray::from_vec(Vec::<bool>::deserialize(deserializer)?).map(LargeArray::from),
            Byte => NumericLargeArray::from_vec(Vec::<i8>::deserialize(deserializer)?).map(LargeArray::from),
            UnsignedByte => NumericLargeArray::from_vec(Vec::<u8>::deserialize(deserializer)?).map(LargeArray::from),
            Short => NumericLargeArray::from_vec(Vec::<i16>::deserialize(deserializer)?).map(LargeArray::from),
            Int => NumericLargeArray::from_vec(Vec::<i32>::deserialize(deserializer)?).map(LargeArray::from),
            Long => NumericLargeArray::from_vec(Vec::<i64>::deserialize(deserializer)?).map(LargeArray::from),
            Float => NumericLargeArray::from_vec(Vec::<f32>::deserialize(deserializer)?).map(LargeArray::from),
            Double => NumericLargeArray::from_vec(Vec::<f64>::deserialize(deserializer)?).map(LargeArray::from),
            ComplexFloat => {
                NumericLargeArray::from_vec(Vec::<Complex<f32>>::deserialize(deserializer)?)
                    .map(LargeArray::from)
            }
            ComplexDouble => {
                NumericLargeArray::from_vec(Vec::<Complex<f64>>::deserialize(deserializer)?)
                    .map(LargeArray::from)
            }
            String => VarLengthLargeArray::from_items(
                Vec::<Option<std::string::String>>::deserialize(deserializer)?,
                self.max_element_size.unwrap_or(DEFAULT_MAX_STRING_LENGTH),
            )
            .map(LargeArray::from),
            Object => VarLengthLargeArray::from_items(
                Vec::<Option<serde_json::Value>>::deserialize(deserializer)?,
                self.max_element_size.unwrap_or(DEFAULT_MAX_OBJECT_SIZE),
            )
            .map(LargeArray::from),
        };
        res.map_err(de::Error::custom)
    }
}

struct LargeArrayVisitor;

impl LargeArrayVisitor {
    fn finish<E: de::Error>(array: LargeArray, length: Option<i64>) -> Result<LargeArray, E> {
        let length = length.ok_or_else(|| de::Error::missing_field("length"))?;
        if array.length() != length {
            return Err(de::Error::invalid_length(
                array.length() as usize,
                &format!("{} elements", length).as_str(),
            ));
        }
        Ok(array)
    }
}

impl<'de> Visitor<'de> for LargeArrayVisitor {
    type Value = LargeArray;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a large array record")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<LargeArray, A::Error> {
        let element_type: LargeArrayType = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let length: i64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let max_element_size: Option<i32> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
        let array = seq
            .next_element_seed(ElementsSeed {
                element_type,
                max_element_size,
            })?
            .ok_or_else(|| de::Error::invalid_length(3, &self))?;
        Self::finish(array, Some(length))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<LargeArray, A::Error> {
        let mut element_type = None;
        let mut length = None;
        let mut max_element_size = None;
        let mut array = None;
        let mut pending = None;
        while let Some(key) = map.next_key::<std::string::String>()? {
            match key.as_str() {
                "type" => element_type = Some(map.next_value::<LargeArrayType>()?),
                "length" => length = Some(map.next_value::<i64>()?),
                "max_element_size" => max_element_size = map.next_value::<Option<i32>>()?,
                "elements" => match element_type {
                    Some(element_type) => {
                        array = Some(map.next_value_seed(ElementsSeed {
                            element_type,
                            max_element_size,
                        })?)
                    }
                    None => pending = Some(map.next_value::<serde_json::Value>()?),
                },
                other => return Err(de::Error::unknown_field(other, FIELDS)),
            }
        }
        let array = match (array, pending) {
            (Some(array), _) => array,
            (None, Some(pending)) => {
                let element_type =
                    element_type.ok_or_else(|| de::Error::missing_field("type"))?;
                ElementsSeed {
                    element_type,
                    max_element_size,
                }
                .deserialize(pending)
                .map_err(de::Error::custom)?
            }
            (None, None) => return Err(de::Error::missing_field("elements")),
        };
        Self::finish(array, length)
    }
}

impl<'de> Deserialize<'de> for LargeArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_struct("LargeArray", FIELDS, LargeArrayVisitor)
    }
}
