//! Arrays of strings

use crate::config::DEFAULT_MAX_STRING_LENGTH;
use crate::error::{LargeArrayError, Result};
use crate::types::LargeArrayType;
use crate::varlen::{text_fingerprint, VarElement, VarLengthLargeArray};

/// Bytes reserved per character in a raw slot
const CHARSET_SIZE: usize = 4;

/// A large array of optional strings. The maximum element size counts
/// characters.
pub type StringLargeArray = VarLengthLargeArray<String>;

impl VarElement for String {
    const TYPE: LargeArrayType = LargeArrayType::String;
    const NULLABLE: bool = true;

    fn slot_size(max_element_size: i32) -> usize {
        max_element_size as usize * CHARSET_SIZE
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn empty() -> Option<Self> {
        Some(String::new())
    }

    fn class(&self) -> &'static str {
        "string"
    }

    fn check_capacity(&self, max_element_size: i32) -> Result<()> {
        let chars = self.chars().count();
        if chars > max_element_size as usize {
            return Err(LargeArrayError::ElementTooLarge {
                size: chars,
                max: max_element_size as usize,
            });
        }
        Ok(())
    }

    fn fingerprint(&self) -> i32 {
        text_fingerprint(self)
    }
}

fn text_len(value: &Option<String>) -> usize {
    value.as_ref().map_or(0, |s| s.chars().count())
}

macro_rules! string_view_impl {
    ($(($get:ident, $set:ident, $get_data:ident, $get_data_range:ident, $ty:ty)),*) => {
        $(
            #[doc = concat!("Length of the string at index `i` as `", stringify!($ty), "`.")]
            pub fn $get(&self, i: i64) -> Result<$ty> {
                Ok(text_len(&self.get(i)?) as $ty)
            }

            #[doc = concat!("Stores the decimal text of a `", stringify!($ty), "`.")]
            pub fn $set(&mut self, i: i64, value: $ty) -> Result<()> {
                self.set(i, Some(value.to_string()))
            }

            #[doc = concat!("Lengths of every string as `", stringify!($ty), "`.")]
            #[must_use]
            pub fn $get_data(&self) -> Option<Vec<$ty>> {
                self.extract_all(|v| text_len(&v) as $ty)
            }

            #[doc = concat!("Lengths of every `step`-th string of `start..end` as `", stringify!($ty), "`.")]
            pub fn $get_data_range(
                &self,
                buf: Option<Vec<$ty>>,
                start: i64,
                end: i64,
                step: i64,
            ) -> Result<Option<Vec<$ty>>> {
                self.extract(buf, start, end, step, |v| text_len(&v) as $ty)
            }
        )*
    };
}

impl VarLengthLargeArray<String> {
    /// Creates an array of unset strings of up to 100 characters.
    pub fn with_length(length: i64) -> Result<Self> {
        Self::new(length, DEFAULT_MAX_STRING_LENGTH)
    }

    /// Takes ownership of `items`. The capacity is the longest string, but
    /// never less than the default.
    pub fn wrap_strings(items: Vec<Option<String>>) -> Result<Self> {
        let longest = items.iter().map(text_len).max().unwrap_or(0);
        let max = (longest as i32).max(DEFAULT_MAX_STRING_LENGTH);
        Self::wrap(items, max)
    }

    /// True if the string at index `i` is set and not empty.
    pub fn get_boolean(&self, i: i64) -> Result<bool> {
        Ok(text_len(&self.get(i)?) != 0)
    }

    /// Stores `"true"` or `"false"`.
    pub fn set_boolean(&mut self, i: i64, value: bool) -> Result<()> {
        self.set(i, Some(value.to_string()))
    }

    /// Whether each string is nonempty.
    #[must_use]
    pub fn get_boolean_data(&self) -> Option<Vec<bool>> {
        self.extract_all(|v| text_len(&v) != 0)
    }

    /// Whether each `step`-th string of `start..end` is nonempty.
    pub fn get_boolean_data_range(
        &self,
        buf: Option<Vec<bool>>,
        start: i64,
        end: i64,
        step: i64,
    ) -> Result<Option<Vec<bool>>> {
        self.extract(buf, start, end, step, |v| text_len(&v) != 0)
    }

    /// Stores the decimal text of a value in `0..=255`.
    pub fn set_unsigned_byte(&mut self, i: i64, value: i16) -> Result<()> {
        if !(0..=255).contains(&value) {
            return Err(LargeArrayError::invalid(format!(
                "{} is not in the range [0, 255]",
                value
            )));
        }
        self.set(i, Some(value.to_string()))
    }

    /// Length of the string at index `i`, truncated to a byte.
    pub fn get_unsigned_byte(&self, i: i64) -> Result<u8> {
        Ok(text_len(&self.get(i)?) as u8)
    }

    /// Lengths of every string truncated to a byte.
    #[must_use]
    pub fn get_unsigned_byte_data(&self) -> Option<Vec<u8>> {
        self.extract_all(|v| text_len(&v) as u8)
    }

    string_view_impl!(
        (get_byte, set_byte, get_byte_data, get_byte_data_range, i8),
        (get_short, set_short, get_short_data, get_short_data_range, i16),
        (get_int, set_int, get_int_data, get_int_data_range, i32),
        (get_long, set_long, get_long_data, get_long_data_range, i64),
        (get_float, set_float, get_float_data, get_float_data_range, f32),
        (get_double, set_double, get_double_data, get_double_data_range, f64)
    );
}
