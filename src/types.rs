//! The closed set of element kinds

use std::convert::TryFrom;
use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::LargeArrayError;

/// Kind of the elements stored in a large array.
///
/// Variants are declared in promotion order: the arithmetic engine picks the
/// largest ordinal among its operands as the starting point of type
/// resolution.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LargeArrayType {
    /// Boolean values stored as one byte each
    Logic = 0,
    /// Signed 8-bit integers
    Byte = 1,
    /// Unsigned 8-bit integers
    UnsignedByte = 2,
    /// Signed 16-bit integers
    Short = 3,
    /// Signed 32-bit integers
    Int = 4,
    /// Signed 64-bit integers
    Long = 5,
    /// 32-bit floats
    Float = 6,
    /// 64-bit floats
    Double = 7,
    /// Pairs of 32-bit floats
    ComplexFloat = 8,
    /// Pairs of 64-bit floats
    ComplexDouble = 9,
    /// Variable-length strings
    String = 10,
    /// Variable-length serialized objects
    Object = 11,
}

const ALL_TYPES: [LargeArrayType; 12] = [
    LargeArrayType::Logic,
    LargeArrayType::Byte,
    LargeArrayType::UnsignedByte,
    LargeArrayType::Short,
    LargeArrayType::Int,
    LargeArrayType::Long,
    LargeArrayType::Float,
    LargeArrayType::Double,
    LargeArrayType::ComplexFloat,
    LargeArrayType::ComplexDouble,
    LargeArrayType::String,
    LargeArrayType::Object,
];

impl LargeArrayType {
    /// All element kinds in ordinal order
    #[must_use]
    pub fn values() -> &'static [LargeArrayType] {
        &ALL_TYPES
    }

    /// Position of this kind in the promotion order
    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Size in bytes of one stored scalar. Complex kinds report the width of
    /// a single component.
    #[must_use]
    pub fn size_of(self) -> usize {
        use LargeArrayType::*;
        match self {
            Logic | Byte | UnsignedByte | String | Object => 1,
            Short => 2,
            Int | Float | ComplexFloat => 4,
            Long | Double | ComplexDouble => 8,
        }
    }

    /// True for every kind the arithmetic engine accepts
    #[must_use]
    pub fn is_numeric_type(self) -> bool {
        !matches!(self, Self::String | Self::Object)
    }

    /// True for logic and the signed/unsigned integer kinds
    #[must_use]
    pub fn is_integer_numeric_type(self) -> bool {
        self <= Self::Long
    }

    /// True for `Float` and `Double`
    #[must_use]
    pub fn is_real_numeric_type(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// True for `ComplexFloat` and `ComplexDouble`
    #[must_use]
    pub fn is_complex_numeric_type(self) -> bool {
        matches!(self, Self::ComplexFloat | Self::ComplexDouble)
    }

    /// True for kinds whose elements have no fixed width
    #[must_use]
    pub fn is_variable_length(self) -> bool {
        !self.is_numeric_type()
    }
}

impl TryFrom<u8> for LargeArrayType {
    type Error = LargeArrayError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        ALL_TYPES
            .get(usize::from(ordinal))
            .copied()
            .ok_or_else(|| LargeArrayError::invalid(format!("unknown array type ordinal {}", ordinal)))
    }
}

impl Display for LargeArrayType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_storage_widths() {
        use LargeArrayType::*;
        let sizes: Vec<usize> = LargeArrayType::values().iter().map(|t| t.size_of()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 2, 4, 8, 4, 8, 4, 8, 1, 1]);
        assert_eq!(ComplexDouble.size_of(), Double.size_of());
    }

    #[test]
    fn capability_flags() {
        use LargeArrayType::*;
        for &t in LargeArrayType::values() {
            let kinds = [
                t.is_integer_numeric_type(),
                t.is_real_numeric_type(),
                t.is_complex_numeric_type(),
            ];
            let count = kinds.iter().filter(|&&k| k).count();
            assert_eq!(count, usize::from(t.is_numeric_type()), "{:?}", t);
        }
        assert!(Logic.is_integer_numeric_type());
        assert!(UnsignedByte.is_integer_numeric_type());
        assert!(!Float.is_integer_numeric_type());
        assert!(String.is_variable_length());
        assert!(!Object.is_numeric_type());
    }

    #[test]
    fn ordinal_round_trip() {
        for &t in LargeArrayType::values() {
            assert_eq!(LargeArrayType::try_from(t.ordinal()).unwrap(), t);
        }
        assert!(LargeArrayType::try_from(12).is_err());
    }

    #[test]
    fn serializes_by_name() {
        let json = serde_json::to_string(&LargeArrayType::ComplexFloat).unwrap();
        assert_eq!(json, "\"COMPLEX_FLOAT\"");
        let back: LargeArrayType = serde_json::from_str("\"UNSIGNED_BYTE\"").unwrap();
        assert_eq!(back, LargeArrayType::UnsignedByte);
    }
}
