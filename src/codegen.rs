//! Lowers bound expression trees into a compiled, cacheable bytecode
//! [`Program`], and the [`BatchCodeGenerator`] that owns the compilation
//! cache and the single compile lock (spec §4.2, §4.4, §4.5).
//!
//! Realizes design note (b) of spec §9: compilation targets a small
//! bytecode evaluated by a tight interpreter specialized per expression,
//! rather than emitting native machine code. See DESIGN.md for why the
//! teacher's `dynasmrt`-based native JIT sketch was not carried forward.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use lru::LruCache;
use parking_lot::Mutex as PlMutex;

use crate::batch::RowBatch;
use crate::bitmap::{and_with_null, Bitmap};
use crate::datatype::{DataType, ScalarValue};
use crate::error::CoreError;
use crate::expr::{CmpOp, Expr, Schema};
use crate::pool::Slab;
use crate::vector::ColumnVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// One instruction in a compiled program. The instruction's own index in
/// `Program::instructions` is its fresh name (spec §4.4): later
/// instructions address earlier results by that index.
#[derive(Debug, Clone)]
enum Instruction {
    BoundRef { ordinal: usize },
    Literal { value: ScalarValue },
    Cast { src: usize, from: DataType, to: DataType },
    Arith { op: ArithOp, dtype: DataType, lhs: usize, rhs: usize },
    Rem { dtype: DataType, lhs: usize, rhs: usize },
    Cmp { op: CmpOp, dtype: DataType, lhs: usize, rhs: usize },
    And { lhs: usize, rhs: usize },
    Or { lhs: usize, rhs: usize },
    Not { child: usize },
}

/// A compiled, cacheable projection program for one bound expression tree.
#[derive(Debug)]
pub struct Program {
    instructions: Vec<Instruction>,
    output: usize,
    output_type: DataType,
    source_text: String,
}

impl Program {
    pub fn output_type(&self) -> DataType {
        self.output_type
    }

    /// Render the instruction listing, used as the "generated source"
    /// attached to `CompileFailure` (spec §4.2).
    pub fn disassembly(&self) -> &str {
        &self.source_text
    }

    /// Interpret the program against a concrete batch, producing one
    /// result column vector.
    pub fn execute(&self, batch: &RowBatch) -> Result<ColumnVector, CoreError> {
        let row_num = batch.row_num();
        let mut slots: Vec<ColumnVector> = Vec::with_capacity(self.instructions.len());

        for instr in &self.instructions {
            let vector = match instr {
                Instruction::BoundRef { ordinal } => batch.column(*ordinal).clone(),
                Instruction::Literal { value } => ColumnVector::literal(value.clone()),
                Instruction::Cast { src, from, to } => {
                    template_unary(row_num, batch, &slots[*src], *to, |child, i, result| {
                        apply_cast(child, *from, *to, i, result)
                    })
                }
                Instruction::Arith { op, dtype, lhs, rhs } => template_binary(
                    row_num,
                    batch,
                    &slots[*lhs],
                    &slots[*rhs],
                    *dtype,
                    |l, r, i, result| apply_arith(*op, *dtype, l, r, i, result),
                )?,
                Instruction::Rem { dtype, lhs, rhs } => template_binary(
                    row_num,
                    batch,
                    &slots[*lhs],
                    &slots[*rhs],
                    *dtype,
                    |l, r, i, result| apply_rem(*dtype, l, r, i, result),
                )?,
                Instruction::Cmp { op, dtype, lhs, rhs } => template_binary(
                    row_num,
                    batch,
                    &slots[*lhs],
                    &slots[*rhs],
                    DataType::Boolean,
                    |l, r, i, result| {
                        result.set_bool(i, apply_cmp(*op, *dtype, l, r, i));
                        Ok(())
                    },
                )?,
                Instruction::And { lhs, rhs } => {
                    bool_binary(row_num, batch, &slots[*lhs], &slots[*rhs], BoolOp::And)
                }
                Instruction::Or { lhs, rhs } => {
                    bool_binary(row_num, batch, &slots[*lhs], &slots[*rhs], BoolOp::Or)
                }
                Instruction::Not { child } => bool_not(row_num, batch, &slots[*child]),
            };
            slots.push(vector);
        }

        Ok(slots.into_iter().nth(self.output).expect("program has an output instruction"))
    }
}

/// Template U (spec §4.3): allocate a result vector, combine the child's
/// not-null with the selector to drive iteration, and write the result
/// either over the set bits of that mask or densely.
fn template_unary(
    row_num: usize,
    batch: &RowBatch,
    child: &ColumnVector,
    result_type: DataType,
    mut compute: impl FnMut(&ColumnVector, usize, &mut ColumnVector),
) -> ColumnVector {
    let mut result = allocate_vector(result_type, row_num);
    let result_not_null = child.not_null().map(Bitmap::copy);
    let iter_mask = and_with_null(child.not_null(), batch.cur_selector(), false);

    for_each_index(row_num, iter_mask.as_ref(), |i| compute(child, i, &mut result));

    result.set_not_null(result_not_null);
    result
}

/// Template B (spec §4.3): result not-null is the AND of both children's
/// not-nulls (owned copy), iteration runs over that ANDed with the
/// selector.
fn template_binary(
    row_num: usize,
    batch: &RowBatch,
    lhs: &ColumnVector,
    rhs: &ColumnVector,
    result_type: DataType,
    mut compute: impl FnMut(&ColumnVector, &ColumnVector, usize, &mut ColumnVector) -> Result<(), CoreError>,
) -> Result<ColumnVector, CoreError> {
    let mut result = allocate_vector(result_type, row_num);
    let result_not_null = and_with_null(lhs.not_null(), rhs.not_null(), true);
    let iter_mask = and_with_null(result_not_null.as_ref(), batch.cur_selector(), false);

    let mut error = None;
    for_each_index(row_num, iter_mask.as_ref(), |i| {
        if error.is_none() {
            if let Err(e) = compute(lhs, rhs, i, &mut result) {
                error = Some(e);
            }
        }
    });
    if let Some(e) = error {
        return Err(e);
    }

    result.set_not_null(result_not_null);
    Ok(result)
}

fn for_each_index(row_num: usize, mask: Option<&Bitmap>, mut f: impl FnMut(usize)) {
    match mask {
        Some(mask) => {
            let mut mask = mask.copy();
            mask.set_available_bits(row_num);
            for i in mask.iter_set_bits() {
                f(i);
            }
        }
        None => {
            for i in 0..row_num {
                f(i);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum BoolOp {
    And,
    Or,
}

/// Broadcast a boolean vector's raw bit storage to `row_num` bits,
/// materializing a literal's single bit if needed (spec §9 "literal
/// scalars as vectors").
fn broadcast_bool_bits(vector: &ColumnVector, row_num: usize) -> Bitmap {
    if vector.is_literal() {
        let value = vector.get_bool(0);
        if value {
            Bitmap::filled(row_num)
        } else {
            Bitmap::with_capacity(row_num)
        }
    } else {
        let mut bits = vector.boolean_bits().copy();
        bits.set_available_bits(row_num);
        bits
    }
}

/// `And`/`Or` lowering (spec §4.3): special-cased because the result
/// vector's storage IS a bitmap, so the two operands' raw boolean storage
/// is combined directly rather than through Template B.
fn bool_binary(
    row_num: usize,
    batch: &RowBatch,
    lhs: &ColumnVector,
    rhs: &ColumnVector,
    op: BoolOp,
) -> ColumnVector {
    let result_not_null = and_with_null(lhs.not_null(), rhs.not_null(), true);
    // Computed for parity with the spec's description; not consulted below.
    let _useful = and_with_null(result_not_null.as_ref(), batch.cur_selector(), false);

    let left_bits = broadcast_bool_bits(lhs, row_num);
    let right_bits = broadcast_bool_bits(rhs, row_num);
    let result_bits = match op {
        BoolOp::And => left_bits.and(&right_bits),
        BoolOp::Or => left_bits.or(&right_bits),
    };

    let mut result = ColumnVector::new_boolean(result_bits);
    result.set_not_null(result_not_null);
    result
}

/// `Not` lowering (spec §4.3, with bug fix #3: attach the child's
/// not-null, not an unassigned one).
fn bool_not(row_num: usize, batch: &RowBatch, child: &ColumnVector) -> ColumnVector {
    let complement = broadcast_bool_bits(child, row_num).not();
    let valid_mask = and_with_null(batch.cur_selector(), child.not_null(), false);
    let result_bits = match valid_mask {
        Some(mask) => complement.and(&mask),
        None => complement,
    };

    let mut result = ColumnVector::new_boolean(result_bits);
    result.set_not_null(child.not_null().cloned());
    result
}

fn allocate_vector(dtype: DataType, row_num: usize) -> ColumnVector {
    match dtype.element_width() {
        Some(width) => ColumnVector::new_fixed(dtype, Slab::standalone(row_num, width)),
        None if dtype == DataType::Boolean => {
            ColumnVector::new_boolean(Bitmap::with_capacity(row_num))
        }
        None => ColumnVector::new_strings(vec![String::new(); row_num]),
    }
}

fn apply_cast(src: &ColumnVector, from: DataType, to: DataType, i: usize, result: &mut ColumnVector) {
    match (from, to) {
        (DataType::Int, DataType::Int) => result.set_i32(i, src.get_i32(i)),
        (DataType::Int, DataType::Long) => result.set_i64(i, src.get_i32(i) as i64),
        (DataType::Int, DataType::Float) => result.set_f32(i, src.get_i32(i) as f32),
        (DataType::Int, DataType::Double) => result.set_f64(i, src.get_i32(i) as f64),
        (DataType::Long, DataType::Int) => result.set_i32(i, src.get_i64(i) as i32),
        (DataType::Long, DataType::Long) => result.set_i64(i, src.get_i64(i)),
        (DataType::Long, DataType::Float) => result.set_f32(i, src.get_i64(i) as f32),
        (DataType::Long, DataType::Double) => result.set_f64(i, src.get_i64(i) as f64),
        (DataType::Float, DataType::Int) => result.set_i32(i, src.get_f32(i) as i32),
        (DataType::Float, DataType::Long) => result.set_i64(i, src.get_f32(i) as i64),
        (DataType::Float, DataType::Float) => result.set_f32(i, src.get_f32(i)),
        (DataType::Float, DataType::Double) => result.set_f64(i, src.get_f32(i) as f64),
        (DataType::Double, DataType::Int) => result.set_i32(i, src.get_f64(i) as i32),
        (DataType::Double, DataType::Long) => result.set_i64(i, src.get_f64(i) as i64),
        (DataType::Double, DataType::Float) => result.set_f32(i, src.get_f64(i) as f32),
        (DataType::Double, DataType::Double) => result.set_f64(i, src.get_f64(i)),
        _ => unreachable!("cast is only defined between numeric types"),
    }
}

fn apply_arith(
    op: ArithOp,
    dtype: DataType,
    lhs: &ColumnVector,
    rhs: &ColumnVector,
    i: usize,
    result: &mut ColumnVector,
) -> Result<(), CoreError> {
    match dtype {
        DataType::Int => {
            let (a, b) = (lhs.get_i32(i), rhs.get_i32(i));
            let v = match op {
                ArithOp::Add => a.wrapping_add(b),
                ArithOp::Sub => a.wrapping_sub(b),
                ArithOp::Mul => a.wrapping_mul(b),
                ArithOp::Div => {
                    if b == 0 {
                        return Err(CoreError::DivideByZero);
                    }
                    a.wrapping_div(b)
                }
            };
            result.set_i32(i, v);
        }
        DataType::Long => {
            let (a, b) = (lhs.get_i64(i), rhs.get_i64(i));
            let v = match op {
                ArithOp::Add => a.wrapping_add(b),
                ArithOp::Sub => a.wrapping_sub(b),
                ArithOp::Mul => a.wrapping_mul(b),
                ArithOp::Div => {
                    if b == 0 {
                        return Err(CoreError::DivideByZero);
                    }
                    a.wrapping_div(b)
                }
            };
            result.set_i64(i, v);
        }
        DataType::Float => {
            let (a, b) = (lhs.get_f32(i), rhs.get_f32(i));
            let v = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
            };
            result.set_f32(i, v);
        }
        DataType::Double => {
            let (a, b) = (lhs.get_f64(i), rhs.get_f64(i));
            let v = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
            };
            result.set_f64(i, v);
        }
        _ => unreachable!("arithmetic is only defined between numeric types"),
    }
    Ok(())
}

fn apply_rem(
    dtype: DataType,
    lhs: &ColumnVector,
    rhs: &ColumnVector,
    i: usize,
    result: &mut ColumnVector,
) -> Result<(), CoreError> {
    match dtype {
        DataType::Int => {
            let (a, b) = (lhs.get_i32(i), rhs.get_i32(i));
            if b == 0 {
                return Err(CoreError::DivideByZero);
            }
            result.set_i32(i, a.wrapping_rem(b));
        }
        DataType::Long => {
            let (a, b) = (lhs.get_i64(i), rhs.get_i64(i));
            if b == 0 {
                return Err(CoreError::DivideByZero);
            }
            result.set_i64(i, a.wrapping_rem(b));
        }
        _ => unreachable!("Rem is only defined for integer types"),
    }
    Ok(())
}

fn apply_cmp(op: CmpOp, dtype: DataType, lhs: &ColumnVector, rhs: &ColumnVector, i: usize) -> bool {
    match dtype {
        DataType::Int => cmp_ord(op, lhs.get_i32(i), rhs.get_i32(i)),
        DataType::Long => cmp_ord(op, lhs.get_i64(i), rhs.get_i64(i)),
        DataType::Float => cmp_ord(op, lhs.get_f32(i), rhs.get_f32(i)),
        DataType::Double => cmp_ord(op, lhs.get_f64(i), rhs.get_f64(i)),
        DataType::Boolean => lhs.get_bool(i) == rhs.get_bool(i),
        DataType::String => lhs.get_str(i) == rhs.get_str(i),
    }
}

fn cmp_ord<T: PartialOrd>(op: CmpOp, a: T, b: T) -> bool {
    match op {
        CmpOp::Eq => a == b,
        CmpOp::Gt => a > b,
        CmpOp::Ge => a >= b,
        CmpOp::Lt => a < b,
        CmpOp::Le => a <= b,
    }
}

/// The compiled callable produced by [`BatchCodeGenerator::compile`]:
/// `apply(batch) -> result column vector` (spec §4.2, §6).
#[derive(Clone)]
pub struct Projection {
    program: Arc<Program>,
}

impl Projection {
    pub fn apply(&self, batch: &RowBatch) -> Result<ColumnVector, CoreError> {
        self.program.execute(batch)
    }

    pub fn output_type(&self) -> DataType {
        self.program.output_type()
    }
}

/// A composed, multi-expression projection returning a vector of result
/// columns with an explicit output schema (spec §6).
pub struct RowProjection {
    programs: Vec<Arc<Program>>,
    output_schema: Schema,
}

impl RowProjection {
    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn apply(&self, batch: &RowBatch) -> Result<Vec<ColumnVector>, CoreError> {
        self.programs.iter().map(|p| p.execute(batch)).collect()
    }
}

/// Owns the bounded compilation cache and the single compile lock that
/// serializes cache-miss lowering (spec §4.5).
pub struct BatchCodeGenerator {
    cache: PlMutex<LruCache<String, Arc<Program>>>,
    compile_lock: std::sync::Mutex<()>,
    fresh_counter: AtomicUsize,
}

const DEFAULT_CACHE_CAPACITY: usize = 1000;

impl Default for BatchCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl BatchCodeGenerator {
    pub fn new(capacity: usize) -> Self {
        let capacity = std::num::NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            cache: PlMutex::new(LruCache::new(capacity)),
            compile_lock: std::sync::Mutex::new(()),
            fresh_counter: AtomicUsize::new(0),
        }
    }

    fn fresh_name(&self, prefix: &str) -> String {
        format!("{prefix}${}", self.fresh_counter.fetch_add(1, Ordering::Relaxed))
    }

    /// `compile(expr, schema) = compile_bound(bind(expr, schema))` (spec §4.2).
    pub fn compile(&self, expr: &Expr, schema: &Schema) -> Result<Projection, CoreError> {
        let bound = expr.bind(schema)?;
        self.compile_bound(&bound)
    }

    pub fn compile_bound(&self, bound: &Expr) -> Result<Projection, CoreError> {
        let key = bound.cache_key();

        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(Projection { program: hit.clone() });
        }

        // Cache miss: the underlying lowering pass is serialized behind a
        // single process-wide lock (spec §4.5, §5).
        let _guard = self.compile_lock.lock().unwrap();
        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(Projection { program: hit.clone() });
        }

        let start = Instant::now();
        let program = Arc::new(self.lower(bound)?);
        log::debug!("compiled expression in {:?}", start.elapsed());

        self.cache.lock().put(key, program.clone());
        Ok(Projection { program })
    }

    /// Compile several expressions into one composed row projection sharing
    /// the cache and compile lock (spec §6's "composed row-projection
    /// variant").
    pub fn compile_row(
        &self,
        exprs: &[Expr],
        schema: &Schema,
        output_schema: Schema,
    ) -> Result<RowProjection, CoreError> {
        let programs = exprs
            .iter()
            .map(|e| Ok(self.compile(e, schema)?.program))
            .collect::<Result<Vec<_>, CoreError>>()?;
        Ok(RowProjection { programs, output_schema })
    }

    fn lower(&self, bound: &Expr) -> Result<Program, CoreError> {
        let mut instructions = Vec::new();
        let mut source_lines = Vec::new();
        let output = self.lower_node(bound, &mut instructions, &mut source_lines)?;
        let output_type = bound.data_type();
        Ok(Program {
            instructions,
            output,
            output_type,
            source_text: source_lines.join("\n"),
        })
    }

    fn lower_node(
        &self,
        expr: &Expr,
        instructions: &mut Vec<Instruction>,
        source_lines: &mut Vec<String>,
    ) -> Result<usize, CoreError> {
        let instr = match expr {
            Expr::Attribute(name) => {
                return Err(CoreError::UnsupportedExpression(format!(
                    "unbound attribute `{name}` reached the code generator"
                )))
            }
            Expr::BoundRef(ordinal, ..) => Instruction::BoundRef { ordinal: *ordinal },
            Expr::Literal(value, _) => Instruction::Literal { value: value.clone() },
            Expr::Cast(child, to) => {
                let from = child.data_type();
                if !from.is_numeric()
                    || !matches!(to, DataType::Int | DataType::Long | DataType::Double | DataType::Float)
                {
                    return Err(CoreError::TypeMismatch(format!(
                        "cannot cast {from:?} to {to:?}"
                    )));
                }
                let src = self.lower_node(child, instructions, source_lines)?;
                Instruction::Cast { src, from, to: *to }
            }
            Expr::Add(l, r) => self.lower_arith(ArithOp::Add, l, r, instructions, source_lines)?,
            Expr::Sub(l, r) => self.lower_arith(ArithOp::Sub, l, r, instructions, source_lines)?,
            Expr::Mul(l, r) => self.lower_arith(ArithOp::Mul, l, r, instructions, source_lines)?,
            Expr::Div(l, r) => self.lower_arith(ArithOp::Div, l, r, instructions, source_lines)?,
            Expr::Rem(l, r) => {
                let ldt = l.data_type();
                let rdt = r.data_type();
                if ldt != rdt || !ldt.is_integer() {
                    return Err(CoreError::UnsupportedExpression(format!(
                        "Rem requires matching integer operands, got {ldt:?} and {rdt:?}"
                    )));
                }
                let lhs = self.lower_node(l, instructions, source_lines)?;
                let rhs = self.lower_node(r, instructions, source_lines)?;
                Instruction::Rem { dtype: ldt, lhs, rhs }
            }
            Expr::Cmp(op, l, r) => {
                let ldt = l.data_type();
                let rdt = r.data_type();
                if ldt != rdt {
                    return Err(CoreError::TypeMismatch(format!(
                        "comparison operands disagree in type: {ldt:?} vs {rdt:?}"
                    )));
                }
                if *op != CmpOp::Eq && !ldt.is_numeric() {
                    return Err(CoreError::TypeMismatch(format!(
                        "ordered comparison requires numeric operands, got {ldt:?}"
                    )));
                }
                let lhs = self.lower_node(l, instructions, source_lines)?;
                let rhs = self.lower_node(r, instructions, source_lines)?;
                Instruction::Cmp { op: *op, dtype: ldt, lhs, rhs }
            }
            Expr::And(l, r) => self.lower_bool_binary(l, r, instructions, source_lines, true)?,
            Expr::Or(l, r) => self.lower_bool_binary(l, r, instructions, source_lines, false)?,
            Expr::Not(x) => {
                if x.data_type() != DataType::Boolean {
                    return Err(CoreError::TypeMismatch(format!(
                        "Not requires a boolean operand, got {:?}",
                        x.data_type()
                    )));
                }
                let child = self.lower_node(x, instructions, source_lines)?;
                Instruction::Not { child }
            }
        };

        let name = self.fresh_name("v");
        source_lines.push(format!("{name} = {instr:?}"));
        instructions.push(instr);
        Ok(instructions.len() - 1)
    }

    fn lower_arith(
        &self,
        op: ArithOp,
        l: &Expr,
        r: &Expr,
        instructions: &mut Vec<Instruction>,
        source_lines: &mut Vec<String>,
    ) -> Result<Instruction, CoreError> {
        let ldt = l.data_type();
        let rdt = r.data_type();
        if ldt != rdt || !ldt.is_numeric() {
            return Err(CoreError::TypeMismatch(format!(
                "arithmetic requires matching numeric operands, got {ldt:?} and {rdt:?}"
            )));
        }
        let lhs = self.lower_node(l, instructions, source_lines)?;
        let rhs = self.lower_node(r, instructions, source_lines)?;
        Ok(Instruction::Arith { op, dtype: ldt, lhs, rhs })
    }

    fn lower_bool_binary(
        &self,
        l: &Expr,
        r: &Expr,
        instructions: &mut Vec<Instruction>,
        source_lines: &mut Vec<String>,
        is_and: bool,
    ) -> Result<Instruction, CoreError> {
        if l.data_type() != DataType::Boolean || r.data_type() != DataType::Boolean {
            return Err(CoreError::TypeMismatch(
                "And/Or require boolean operands".to_string(),
            ));
        }
        let lhs = self.lower_node(l, instructions, source_lines)?;
        let rhs = self.lower_node(r, instructions, source_lines)?;
        Ok(if is_and {
            Instruction::And { lhs, rhs }
        } else {
            Instruction::Or { lhs, rhs }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RowBatch;
    use crate::expr::Schema;

    fn int_batch(values: &[i32]) -> RowBatch {
        let schema = Schema::new(vec![("a".to_string(), DataType::Int, true)]);
        let mut batch = RowBatch::build(schema, values.len());
        for (i, v) in values.iter().enumerate() {
            batch.column_mut(0).set_i32(i, *v);
        }
        batch
    }

    #[test]
    fn add_literal_to_bound_column() {
        let batch = int_batch(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let expr = Expr::Add(
            Box::new(Expr::BoundRef(0, DataType::Int, true)),
            Box::new(Expr::literal(ScalarValue::Int(10))),
        );
        let gen = BatchCodeGenerator::default();
        let projection = gen.compile_bound(&expr).unwrap();
        let result = projection.apply(&batch).unwrap();
        for i in 0..8 {
            assert_eq!(result.get_i32(i), i as i32 + 11);
            assert!(result.not_null().is_none() || result.not_null().unwrap().test(i));
        }
    }

    #[test]
    fn cache_hit_returns_same_program_instance() {
        let gen = BatchCodeGenerator::default();
        let expr = Expr::Add(
            Box::new(Expr::BoundRef(0, DataType::Int, true)),
            Box::new(Expr::literal(ScalarValue::Int(1))),
        );
        let first = gen.compile_bound(&expr).unwrap();
        let second = gen.compile_bound(&expr).unwrap();
        assert!(Arc::ptr_eq(&first.program, &second.program));
    }

    #[test]
    fn rem_on_float_is_unsupported() {
        let gen = BatchCodeGenerator::default();
        let expr = Expr::Rem(
            Box::new(Expr::BoundRef(0, DataType::Double, true)),
            Box::new(Expr::literal(ScalarValue::Double(2.0))),
        );
        let result = gen.compile_bound(&expr);
        assert!(matches!(result, Err(CoreError::UnsupportedExpression(_))));
    }

    #[test]
    fn mismatched_arithmetic_types_is_type_mismatch() {
        let gen = BatchCodeGenerator::default();
        let expr = Expr::Add(
            Box::new(Expr::BoundRef(0, DataType::Int, true)),
            Box::new(Expr::literal(ScalarValue::Double(1.0))),
        );
        let result = gen.compile_bound(&expr);
        assert!(matches!(result, Err(CoreError::TypeMismatch(_))));
    }

    #[test]
    fn integer_division_by_zero_errors() {
        let batch = int_batch(&[1, 0]);
        let expr = Expr::Div(
            Box::new(Expr::literal(ScalarValue::Int(10))),
            Box::new(Expr::BoundRef(0, DataType::Int, true)),
        );
        let gen = BatchCodeGenerator::default();
        let projection = gen.compile_bound(&expr).unwrap();
        let result = projection.apply(&batch);
        assert!(matches!(result, Err(CoreError::DivideByZero)));
    }
}
