//! Typed column vectors: a buffer (or bitmap, for `Boolean`) plus an
//! optional not-null mask.

use crate::bitmap::Bitmap;
use crate::datatype::{DataType, ScalarValue};
use crate::pool::Slab;

/// Backing storage for a column vector. `Boolean`'s storage IS a bitmap
/// (spec §4.3: "the result vector is a Boolean column vector whose storage
/// IS a bitmap"); `String` is an array of owned references, not pooled.
#[derive(Debug, Clone)]
pub enum ColumnStorage {
    Fixed(Slab),
    Boolean(Bitmap),
    Strings(Vec<String>),
}

/// One column's worth of a batch, or a constant-answering literal.
#[derive(Debug, Clone)]
pub struct ColumnVector {
    data_type: DataType,
    not_null: Option<Bitmap>,
    storage: ColumnStorage,
    is_literal: bool,
}

macro_rules! fixed_accessor {
    ($get:ident, $set:ident, $ty:ty, $dtype:ident) => {
        pub fn $get(&self, index: usize) -> $ty {
            assert_eq!(
                self.data_type,
                DataType::$dtype,
                "type mismatch on typed accessor"
            );
            let index = if self.is_literal { 0 } else { index };
            match &self.storage {
                ColumnStorage::Fixed(slab) => {
                    <$ty>::from_ne_bytes(slab.read(index).try_into().unwrap())
                }
                _ => unreachable!("DataType::{} must use Fixed storage", stringify!($dtype)),
            }
        }

        pub fn $set(&mut self, index: usize, value: $ty) {
            assert_eq!(
                self.data_type,
                DataType::$dtype,
                "type mismatch on typed accessor"
            );
            assert!(!self.is_literal, "literal vectors are immutable");
            match &mut self.storage {
                ColumnStorage::Fixed(slab) => slab.write(index, &value.to_ne_bytes()),
                _ => unreachable!("DataType::{} must use Fixed storage", stringify!($dtype)),
            }
        }
    };
}

impl ColumnVector {
    pub fn new_fixed(data_type: DataType, slab: Slab) -> Self {
        assert!(data_type.element_width().is_some());
        Self {
            data_type,
            not_null: None,
            storage: ColumnStorage::Fixed(slab),
            is_literal: false,
        }
    }

    pub fn new_boolean(bits: Bitmap) -> Self {
        Self {
            data_type: DataType::Boolean,
            not_null: None,
            storage: ColumnStorage::Boolean(bits),
            is_literal: false,
        }
    }

    pub fn new_strings(values: Vec<String>) -> Self {
        Self {
            data_type: DataType::String,
            not_null: None,
            storage: ColumnStorage::Strings(values),
            is_literal: false,
        }
    }

    /// A literal-scalar vector: answers every `get` with the same value
    /// regardless of index (spec §3).
    pub fn literal(value: ScalarValue) -> Self {
        let data_type = value.data_type();
        let storage = match value {
            ScalarValue::Boolean(b) => {
                let mut bits = Bitmap::with_capacity(1);
                if b {
                    bits.set(0);
                }
                ColumnStorage::Boolean(bits)
            }
            ScalarValue::Int(v) => {
                let mut slab = Slab::standalone(1, 4);
                slab.write(0, &v.to_ne_bytes());
                ColumnStorage::Fixed(slab)
            }
            ScalarValue::Long(v) => {
                let mut slab = Slab::standalone(1, 8);
                slab.write(0, &v.to_ne_bytes());
                ColumnStorage::Fixed(slab)
            }
            ScalarValue::Float(v) => {
                let mut slab = Slab::standalone(1, 4);
                slab.write(0, &v.to_ne_bytes());
                ColumnStorage::Fixed(slab)
            }
            ScalarValue::Double(v) => {
                let mut slab = Slab::standalone(1, 8);
                slab.write(0, &v.to_ne_bytes());
                ColumnStorage::Fixed(slab)
            }
            ScalarValue::String(s) => ColumnStorage::Strings(vec![s]),
        };
        Self {
            data_type,
            not_null: None,
            storage,
            is_literal: true,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_literal(&self) -> bool {
        self.is_literal
    }

    pub fn not_null(&self) -> Option<&Bitmap> {
        self.not_null.as_ref()
    }

    pub fn set_not_null(&mut self, not_null: Option<Bitmap>) {
        self.not_null = not_null;
    }

    pub fn capacity(&self) -> usize {
        match &self.storage {
            ColumnStorage::Fixed(slab) => slab.capacity(),
            ColumnStorage::Boolean(bits) => bits.available_bits(),
            ColumnStorage::Strings(values) => values.len(),
        }
    }

    fixed_accessor!(get_i32, set_i32, i32, Int);
    fixed_accessor!(get_i64, set_i64, i64, Long);
    fixed_accessor!(get_f32, set_f32, f32, Float);
    fixed_accessor!(get_f64, set_f64, f64, Double);

    pub fn get_bool(&self, index: usize) -> bool {
        assert_eq!(self.data_type, DataType::Boolean);
        let index = if self.is_literal { 0 } else { index };
        match &self.storage {
            ColumnStorage::Boolean(bits) => bits.test(index),
            _ => unreachable!("DataType::Boolean must use Boolean storage"),
        }
    }

    pub fn set_bool(&mut self, index: usize, value: bool) {
        assert_eq!(self.data_type, DataType::Boolean);
        assert!(!self.is_literal, "literal vectors are immutable");
        match &mut self.storage {
            ColumnStorage::Boolean(bits) => {
                if value {
                    bits.set(index);
                } else {
                    bits.clear(index);
                }
            }
            _ => unreachable!("DataType::Boolean must use Boolean storage"),
        }
    }

    pub fn get_str(&self, index: usize) -> &str {
        assert_eq!(self.data_type, DataType::String);
        let index = if self.is_literal { 0 } else { index };
        match &self.storage {
            ColumnStorage::Strings(values) => values[index].as_str(),
            _ => unreachable!("DataType::String must use Strings storage"),
        }
    }

    pub fn set_str(&mut self, index: usize, value: String) {
        assert_eq!(self.data_type, DataType::String);
        assert!(!self.is_literal, "literal vectors are immutable");
        match &mut self.storage {
            ColumnStorage::Strings(values) => values[index] = value,
            _ => unreachable!("DataType::String must use Strings storage"),
        }
    }

    /// Boolean-only raw bitmap access, used by the `And`/`Or`/`Not`
    /// lowerings which operate on boolean storage directly rather than
    /// through Template B (spec §4.3).
    pub fn boolean_bits(&self) -> &Bitmap {
        assert_eq!(self.data_type, DataType::Boolean);
        match &self.storage {
            ColumnStorage::Boolean(bits) => bits,
            _ => unreachable!("DataType::Boolean must use Boolean storage"),
        }
    }

    /// Consume the vector, handing back its storage so a batch tearing
    /// itself down can return pool-backed slabs.
    pub(crate) fn into_storage(self) -> ColumnStorage {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::MemoryPool;

    #[test]
    fn fixed_vector_roundtrips_values() {
        let mut pool = MemoryPool::new(4);
        let slab = pool.borrow(4);
        let mut vector = ColumnVector::new_fixed(DataType::Int, slab);
        vector.set_i32(0, 10);
        vector.set_i32(3, -5);
        assert_eq!(vector.get_i32(0), 10);
        assert_eq!(vector.get_i32(3), -5);
    }

    #[test]
    fn literal_vector_answers_every_index_the_same() {
        let vector = ColumnVector::literal(ScalarValue::Long(42));
        assert_eq!(vector.get_i64(0), 42);
        assert_eq!(vector.get_i64(999), 42);
        assert!(vector.is_literal());
    }

    #[test]
    fn boolean_vector_uses_bitmap_storage() {
        let mut vector = ColumnVector::new_boolean(Bitmap::with_capacity(4));
        vector.set_bool(1, true);
        assert!(vector.get_bool(1));
        assert!(!vector.get_bool(2));
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn typed_accessor_panics_on_mismatched_type() {
        let mut pool = MemoryPool::new(4);
        let slab = pool.borrow(4);
        let vector = ColumnVector::new_fixed(DataType::Int, slab);
        vector.get_i64(0);
    }
}
