//! Arrays whose elements have no fixed width
//!
//! In raw storage every element gets a slot of the same capacity. A
//! parallel table of `i16` lengths records how many bytes of the slot are
//! used: `-1` marks an unset element and `0` an explicitly empty one.

use std::fmt::{self, Debug, Formatter};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::alloc::{AllocError, RawBuffer};
use crate::array::{base_fingerprint, check_range, sample_step, ArrayId};
use crate::config::LARGEST_SUBARRAY;
use crate::error::{LargeArrayError, Result};
use crate::numeric::check_length;
use crate::storage::{needs_raw, try_vec, StorageMode};
use crate::types::LargeArrayType;

/// A value that can be stored in a [`VarLengthLargeArray`].
pub trait VarElement:
    Clone + PartialEq + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Element kind stored by arrays of this representation
    const TYPE: LargeArrayType;
    /// Whether an element may be set back to "no value"
    const NULLABLE: bool;

    /// Bytes reserved per slot for a given maximum element size.
    fn slot_size(max_element_size: i32) -> usize;

    /// Serializes the value into its slot representation.
    fn encode(&self) -> Result<Vec<u8>>;

    /// Restores a value from its slot representation. Failures yield `None`.
    fn decode(bytes: &[u8]) -> Option<Self>;

    /// The value read back from a slot with a recorded length of zero.
    fn empty() -> Option<Self>;

    /// Name of the runtime class shared by every element of an array.
    fn class(&self) -> &'static str;

    /// True for values that count as a null reference.
    fn is_null(&self) -> bool {
        false
    }

    /// Checks limits beyond the encoded size before a raw store.
    fn check_capacity(&self, _max_element_size: i32) -> Result<()> {
        Ok(())
    }

    /// 32-bit fingerprint folded into the sampled hash
    fn fingerprint(&self) -> i32;
}

/// `31 * h + c` hash over the UTF-16 units of `s`.
pub(crate) fn text_fingerprint(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

struct Slots {
    bytes: RawBuffer<u8>,
    lengths: RawBuffer<i16>,
    slot_size: usize,
}

impl Slots {
    fn new(len: usize, slot_size: usize) -> Result<Self, AllocError> {
        let total = len.checked_mul(slot_size).ok_or(AllocError)?;
        Ok(Self {
            bytes: RawBuffer::filled(total, 0)?,
            lengths: RawBuffer::filled(len, -1)?,
            slot_size,
        })
    }

    /// The used part of slot `i`, or `None` if it was never set.
    fn read(&self, i: usize) -> Option<&[u8]> {
        let len = self.lengths.as_slice()[i];
        if len < 0 {
            return None;
        }
        let start = i * self.slot_size;
        Some(&self.bytes.as_slice()[start..start + len as usize])
    }

    fn write(&mut self, i: usize, encoded: Option<&[u8]>) {
        match encoded {
            None => self.lengths.as_mut_slice()[i] = -1,
            Some(encoded) => {
                let start = i * self.slot_size;
                self.bytes.as_mut_slice()[start..start + encoded.len()].copy_from_slice(encoded);
                self.lengths.as_mut_slice()[i] = encoded.len() as i16;
            }
        }
    }

    fn try_clone(&self) -> Result<Self, AllocError> {
        Ok(Self {
            bytes: self.bytes.try_clone()?,
            lengths: self.lengths.try_clone()?,
            slot_size: self.slot_size,
        })
    }
}

enum VarStorage<V> {
    Heap(Vec<Option<V>>),
    Raw(Slots),
    Constant(Option<V>),
}

/// A large array of variable-length elements of representation `V`.
pub struct VarLengthLargeArray<V: VarElement> {
    length: i64,
    max_element_size: i32,
    element_class: Option<&'static str>,
    storage: VarStorage<V>,
    id: ArrayId,
    parent: Option<ArrayId>,
}

fn check_max_size(max_element_size: i32) -> Result<()> {
    if max_element_size <= 0 {
        return Err(LargeArrayError::invalid(format!(
            "{} is not a positive maximum element size",
            max_element_size
        )));
    }
    Ok(())
}

impl<V: VarElement> VarLengthLargeArray<V> {
    fn with_storage(
        length: i64,
        max_element_size: i32,
        element_class: Option<&'static str>,
        storage: VarStorage<V>,
    ) -> Self {
        Self {
            length,
            max_element_size,
            element_class,
            storage,
            id: ArrayId::next(),
            parent: None,
        }
    }

    /// Creates an array of unset elements, each able to hold up to
    /// `max_element_size` units.
    pub fn new(length: i64, max_element_size: i32) -> Result<Self> {
        let len = check_length(length)?;
        Self::new_in(length, max_element_size, needs_raw(len))
    }

    pub(crate) fn new_in(length: i64, max_element_size: i32, raw: bool) -> Result<Self> {
        let len = check_length(length)?;
        check_max_size(max_element_size)?;
        let storage = if raw {
            VarStorage::Raw(Slots::new(len, V::slot_size(max_element_size))?)
        } else {
            VarStorage::Heap(try_vec(len, None)?)
        };
        Ok(Self::with_storage(length, max_element_size, None, storage))
    }

    /// Creates an array with every element set to `value`. With `constant`
    /// the array holds a single slot until it is first written.
    pub fn new_with_value(
        length: i64,
        max_element_size: i32,
        value: Option<V>,
        constant: bool,
    ) -> Result<Self> {
        let len = check_length(length)?;
        check_max_size(max_element_size)?;
        let class = match &value {
            Some(_) => Self::check_value(value.as_ref(), None)?,
            None => None,
        };
        let mut res = Self::with_storage(length, max_element_size, class, VarStorage::Constant(value));
        if constant {
            // The value must fit a raw slot once the array materializes.
            if needs_raw(len) {
                if let VarStorage::Constant(value) = &res.storage {
                    res.encode_for_slot(value.as_ref())?;
                }
            }
        } else {
            res.materialize()?;
        }
        Ok(res)
    }

    /// Takes ownership of `items` without copying them.
    ///
    /// Every element must share one runtime class, and non-nullable kinds
    /// reject missing elements.
    pub fn wrap(items: Vec<Option<V>>, max_element_size: i32) -> Result<Self> {
        check_max_size(max_element_size)?;
        let mut class = None;
        for item in &items {
            match item {
                None if !V::NULLABLE => {
                    return Err(LargeArrayError::invalid("elements of the data cannot be null"))
                }
                None => {}
                Some(v) if v.is_null() => {
                    return Err(LargeArrayError::invalid("elements of the data cannot be null"))
                }
                Some(v) => match class {
                    None => class = Some(v.class()),
                    Some(c) if c != v.class() => {
                        return Err(LargeArrayError::invalid(
                            "all elements of the data must be of the same type",
                        ))
                    }
                    Some(_) => {}
                },
            }
        }
        let length = items.len() as i64;
        Ok(Self::with_storage(length, max_element_size, class, VarStorage::Heap(items)))
    }

    /// Like [`wrap`](Self::wrap), but moves the elements into raw slots when
    /// the length is above the large array threshold.
    pub fn from_vec(items: Vec<Option<V>>, max_element_size: i32) -> Result<Self> {
        let mut res = Self::wrap(items, max_element_size)?;
        if needs_raw(res.length as usize) {
            let items = match std::mem::replace(&mut res.storage, VarStorage::Constant(None)) {
                VarStorage::Heap(items) => items,
                _ => Vec::new(),
            };
            let mut slots = Slots::new(items.len(), V::slot_size(max_element_size))?;
            for (i, item) in items.iter().enumerate() {
                let encoded = res.encode_for_slot(item.as_ref())?;
                slots.write(i, encoded.as_deref());
            }
            res.storage = VarStorage::Raw(slots);
        }
        Ok(res)
    }

    /// Builds an array of `items` through [`set`](Self::set), so missing
    /// elements stay unset even for kinds that cannot store a null.
    pub(crate) fn from_items(items: Vec<Option<V>>, max_element_size: i32) -> Result<Self> {
        let mut res = Self::new(items.len() as i64, max_element_size)?;
        for (i, item) in items.into_iter().enumerate() {
            if item.is_some() {
                res.set(i as i64, item)?;
            }
        }
        Ok(res)
    }

    /// Number of elements
    #[must_use]
    pub fn length(&self) -> i64 {
        self.length
    }

    /// Element kind of this array
    #[must_use]
    pub fn get_type(&self) -> LargeArrayType {
        V::TYPE
    }

    /// Capacity of one element
    #[must_use]
    pub fn max_element_size(&self) -> i32 {
        self.max_element_size
    }

    /// Runtime class fixed by the first stored value, if any
    #[must_use]
    pub fn element_class(&self) -> Option<&'static str> {
        self.element_class
    }

    /// Current storage mode
    #[must_use]
    pub fn mode(&self) -> StorageMode {
        match self.storage {
            VarStorage::Heap(_) => StorageMode::Heap,
            VarStorage::Raw(_) => StorageMode::Raw,
            VarStorage::Constant(_) => StorageMode::Constant,
        }
    }

    /// True while a single value stands in for every index
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.mode() == StorageMode::Constant
    }

    /// True when the elements live in raw storage
    #[must_use]
    pub fn is_large(&self) -> bool {
        self.mode() == StorageMode::Raw
    }

    /// Identity assigned at creation
    #[must_use]
    pub fn id(&self) -> ArrayId {
        self.id
    }

    /// Array this one is a view of, if any
    #[must_use]
    pub fn parent(&self) -> Option<ArrayId> {
        self.parent
    }

    /// Marks this array as a view of the array identified by `parent`.
    pub fn set_parent(&mut self, parent: Option<ArrayId>) {
        self.parent = parent;
    }

    pub(crate) fn check_index(&self, i: i64) -> Result<usize> {
        if i < 0 || i >= self.length {
            return Err(LargeArrayError::IndexOutOfRange {
                index: i,
                length: self.length,
            });
        }
        Ok(i as usize)
    }

    /// Validates a value against the nullability rules and the established
    /// class, returning the class the array has afterwards.
    fn check_value(
        value: Option<&V>,
        class: Option<&'static str>,
    ) -> Result<Option<&'static str>> {
        match value {
            None if V::NULLABLE => Ok(class),
            Some(v) if !v.is_null() => match class {
                Some(c) if c != v.class() => Err(LargeArrayError::TypeMismatch {
                    expected: c.to_owned(),
                    found: v.class().to_owned(),
                }),
                _ => Ok(Some(v.class())),
            },
            _ => Err(LargeArrayError::invalid("value cannot be null")),
        }
    }

    fn encode_for_slot(&self, value: Option<&V>) -> Result<Option<Vec<u8>>> {
        let value = match value {
            Some(value) => value,
            None => return Ok(None),
        };
        value.check_capacity(self.max_element_size)?;
        let encoded = value.encode()?;
        let max = V::slot_size(self.max_element_size).min(i16::MAX as usize);
        if encoded.len() > max {
            return Err(LargeArrayError::ElementTooLarge {
                size: encoded.len(),
                max,
            });
        }
        Ok(Some(encoded))
    }

    /// Replaces constant storage with one real element per index.
    fn materialize(&mut self) -> Result<()> {
        let value = match &self.storage {
            VarStorage::Constant(value) => value.clone(),
            _ => return Ok(()),
        };
        let len = self.length as usize;
        self.storage = if needs_raw(len) {
            let encoded = self.encode_for_slot(value.as_ref())?;
            let mut slots = Slots::new(len, V::slot_size(self.max_element_size))?;
            for i in 0..len {
                slots.write(i, encoded.as_deref());
            }
            VarStorage::Raw(slots)
        } else {
            VarStorage::Heap(try_vec(len, value)?)
        };
        debug!(len, mode = ?self.mode(), "materialized constant array");
        Ok(())
    }

    /// Writes `values` from index `start` on. Every value is checked before
    /// the first write, so on error the array is left as it was.
    pub(crate) fn set_range(&mut self, start: usize, values: Vec<Option<V>>) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut class = self.element_class;
        for value in &values {
            class = Self::check_value(value.as_ref(), class)?;
        }
        let raw = match self.storage {
            VarStorage::Raw(_) => true,
            VarStorage::Constant(_) => needs_raw(self.length as usize),
            VarStorage::Heap(_) => false,
        };
        let encoded = if raw {
            values
                .iter()
                .map(|value| self.encode_for_slot(value.as_ref()))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };
        self.materialize()?;
        match &mut self.storage {
            VarStorage::Heap(items) => {
                for (slot, value) in items[start..start + values.len()].iter_mut().zip(values) {
                    *slot = value;
                }
            }
            VarStorage::Raw(slots) => {
                for (j, bytes) in encoded.iter().enumerate() {
                    slots.write(start + j, bytes.as_deref());
                }
            }
            VarStorage::Constant(_) => {}
        }
        self.element_class = class;
        Ok(())
    }

    /// Reads index `i`; unset elements read as `None`.
    pub fn get(&self, i: i64) -> Result<Option<V>> {
        let i = self.check_index(i)?;
        Ok(self.value(i))
    }

    pub(crate) fn value(&self, i: usize) -> Option<V> {
        match &self.storage {
            VarStorage::Heap(items) => items[i].clone(),
            VarStorage::Constant(value) => value.clone(),
            VarStorage::Raw(slots) => match slots.read(i) {
                None => None,
                Some([]) => V::empty(),
                Some(bytes) => V::decode(bytes),
            },
        }
    }

    /// Writes index `i`, materializing a constant array first.
    pub fn set(&mut self, i: i64, value: Option<V>) -> Result<()> {
        let i = self.check_index(i)?;
        let class = Self::check_value(value.as_ref(), self.element_class)?;
        self.materialize()?;
        let encoded = if matches!(self.storage, VarStorage::Raw(_)) {
            self.encode_for_slot(value.as_ref())?
        } else {
            None
        };
        match &mut self.storage {
            VarStorage::Heap(items) => items[i] = value,
            VarStorage::Raw(slots) => slots.write(i, encoded.as_deref()),
            VarStorage::Constant(_) => {}
        }
        self.element_class = class;
        Ok(())
    }

    /// Copies every element, or `None` if the array is too long.
    #[must_use]
    pub fn get_data(&self) -> Option<Vec<Option<V>>> {
        self.extract_all(|v| v)
    }

    /// Copies every `step`-th element of `start..end`.
    pub fn get_data_range(
        &self,
        buf: Option<Vec<Option<V>>>,
        start: i64,
        end: i64,
        step: i64,
    ) -> Result<Option<Vec<Option<V>>>> {
        self.extract(buf, start, end, step, |v| v)
    }

    pub(crate) fn extract_all<U>(&self, f: impl Fn(Option<V>) -> U) -> Option<Vec<U>> {
        if self.length > LARGEST_SUBARRAY {
            return None;
        }
        Some((0..self.length as usize).map(|i| f(self.value(i))).collect())
    }

    pub(crate) fn extract<U>(
        &self,
        buf: Option<Vec<U>>,
        start: i64,
        end: i64,
        step: i64,
        f: impl Fn(Option<V>) -> U,
    ) -> Result<Option<Vec<U>>> {
        let count = match check_range(self.length, start, end, step)? {
            Some(count) => count,
            None => return Ok(None),
        };
        let indices = (start as usize..end as usize).step_by(step as usize);
        Ok(Some(match buf {
            Some(mut buf) if buf.len() >= count => {
                for (slot, i) in buf.iter_mut().zip(indices) {
                    *slot = f(self.value(i));
                }
                buf
            }
            _ => indices.map(|i| f(self.value(i))).collect(),
        }))
    }

    /// Allocates an independent copy. Constant arrays stay constant.
    pub fn try_clone(&self) -> Result<Self> {
        let storage = match &self.storage {
            VarStorage::Heap(items) => {
                let mut copy = Vec::new();
                copy.try_reserve_exact(items.len()).map_err(|_| AllocError)?;
                copy.extend(items.iter().cloned());
                VarStorage::Heap(copy)
            }
            VarStorage::Raw(slots) => VarStorage::Raw(slots.try_clone()?),
            VarStorage::Constant(value) => VarStorage::Constant(value.clone()),
        };
        let mut res =
            Self::with_storage(self.length, self.max_element_size, self.element_class, storage);
        res.parent = self.parent;
        Ok(res)
    }

    /// Sampled fingerprint of the array; see
    /// [`LargeArray::hash_code`](crate::LargeArray::hash_code).
    pub fn hash_code(&self, quality: f32) -> Result<i32> {
        let mut fprint = base_fingerprint(V::TYPE, self.length, self.is_constant(), self.parent, quality)?
            .wrapping_mul(29);
        fprint = fprint
            .wrapping_mul(29)
            .wrapping_add(self.max_element_size ^ (self.max_element_size >> 16));
        fprint = fprint
            .wrapping_mul(29)
            .wrapping_add(self.element_class.map_or(0, text_fingerprint));
        if let Some(step) = sample_step(self.length, quality) {
            for i in (0..self.length as usize).step_by(step) {
                let h = self.value(i).map_or(0, |v| v.fingerprint());
                fprint = fprint.wrapping_mul(31).wrapping_add(h);
            }
        }
        Ok(fprint)
    }
}

impl<V: VarElement> PartialEq for VarLengthLargeArray<V> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length
            || self.max_element_size != other.max_element_size
            || self.element_class != other.element_class
            || self.parent != other.parent
        {
            return false;
        }
        match (&self.storage, &other.storage) {
            (VarStorage::Constant(a), VarStorage::Constant(b)) => a == b,
            _ => (0..self.length as usize).all(|i| self.value(i) == other.value(i)),
        }
    }
}

impl<V: VarElement> Debug for VarLengthLargeArray<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 16;
        let shown = (self.length as usize).min(PREVIEW);
        let mut list = f.debug_list();
        for i in 0..shown {
            list.entry(&self.value(i));
        }
        if shown < self.length as usize {
            list.entry(&format_args!("... {} more", self.length as usize - shown));
        }
        list.finish()
    }
}
