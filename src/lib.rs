//! Vectorized expression evaluator with runtime code generation for a
//! columnar query engine core: compiles bound expression trees into
//! cacheable programs that execute directly over column-vector batches.

pub mod batch;
pub mod bitmap;
pub mod codegen;
pub mod datatype;
pub mod error;
pub mod expr;
pub mod pool;
pub mod vector;

pub use batch::RowBatch;
pub use bitmap::{and_with_null, Bitmap};
pub use codegen::{BatchCodeGenerator, Projection, RowProjection};
pub use datatype::{DataType, ScalarValue};
pub use error::CoreError;
pub use expr::{CmpOp, Expr, Schema};
pub use pool::{MemoryPool, Slab};
pub use vector::{ColumnStorage, ColumnVector};
