//! Row batch: a horizontally-partitioned slice of a relation, materialized
//! as parallel column vectors with a shared row count.

use crate::bitmap::Bitmap;
use crate::datatype::DataType;
use crate::expr::Schema;
use crate::pool::MemoryPool;
use crate::vector::{ColumnStorage, ColumnVector};

/// Container of named (ordinal-addressed) column vectors, a current row
/// selector, and the memory pool that owns their buffers.
pub struct RowBatch {
    row_num: usize,
    schema: Schema,
    columns: Vec<ColumnVector>,
    cur_selector: Option<Bitmap>,
    pool: MemoryPool,
}

impl RowBatch {
    /// Allocate one column vector per schema attribute, each backed by a
    /// pool-borrowed slab (or type-specific storage for `String`/`Boolean`).
    pub fn build(schema: Schema, row_num: usize) -> Self {
        let mut pool = MemoryPool::new(row_num);
        let mut columns = Vec::with_capacity(schema.len());
        for ordinal in 0..schema.len() {
            let (_, dtype, _) = schema.attribute(ordinal).unwrap();
            let column = match dtype.element_width() {
                Some(width) => ColumnVector::new_fixed(*dtype, pool.borrow(width)),
                None if *dtype == DataType::Boolean => {
                    ColumnVector::new_boolean(Bitmap::with_capacity(row_num))
                }
                None => ColumnVector::new_strings(vec![String::new(); row_num]),
            };
            columns.push(column);
        }
        Self {
            row_num,
            schema,
            columns,
            cur_selector: None,
            pool,
        }
    }

    pub fn row_num(&self) -> usize {
        self.row_num
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column(&self, ordinal: usize) -> &ColumnVector {
        &self.columns[ordinal]
    }

    pub fn column_mut(&mut self, ordinal: usize) -> &mut ColumnVector {
        &mut self.columns[ordinal]
    }

    pub fn cur_selector(&self) -> Option<&Bitmap> {
        self.cur_selector.as_ref()
    }

    pub fn set_cur_selector(&mut self, selector: Option<Bitmap>) {
        if let Some(ref s) = selector {
            debug_assert_eq!(s.available_bits(), self.row_num);
        }
        self.cur_selector = selector;
    }

    /// Return every pool-backed slab and drop column references. Must be
    /// called exactly once when the batch is retired (spec §5).
    pub fn free(mut self) {
        let columns = std::mem::take(&mut self.columns);
        for column in columns {
            if let ColumnStorage::Fixed(slab) = column.into_storage() {
                self.pool.release(slab);
            }
        }
        self.pool.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataType;

    #[test]
    fn build_allocates_one_column_per_attribute() {
        let schema = Schema::new(vec![
            ("id".to_string(), DataType::Int, false),
            ("flag".to_string(), DataType::Boolean, true),
            ("label".to_string(), DataType::String, true),
        ]);
        let batch = RowBatch::build(schema, 8);
        assert_eq!(batch.row_num(), 8);
        assert_eq!(batch.column(0).data_type(), DataType::Int);
        assert_eq!(batch.column(0).capacity(), 8);
        assert_eq!(batch.column(1).data_type(), DataType::Boolean);
        assert_eq!(batch.column(2).data_type(), DataType::String);
    }

    #[test]
    fn cur_selector_defaults_to_all_rows_selected() {
        let schema = Schema::new(vec![("id".to_string(), DataType::Int, false)]);
        let batch = RowBatch::build(schema, 4);
        assert!(batch.cur_selector().is_none());
    }

    #[test]
    fn free_releases_every_slab_without_panicking() {
        let schema = Schema::new(vec![("id".to_string(), DataType::Long, false)]);
        let batch = RowBatch::build(schema, 4);
        batch.free();
    }
}
