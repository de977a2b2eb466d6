//! Small end-to-end demonstration of compiling and running a projection
//! over a row batch, used to sanity-check the core outside of the test
//! suite.

use eocene_vec::{BatchCodeGenerator, CmpOp, DataType, Expr, RowBatch, ScalarValue, Schema};

fn build_employees() -> (Schema, RowBatch) {
    let schema = Schema::new(vec![
        ("id".to_string(), DataType::Int, false),
        ("salary".to_string(), DataType::Int, true),
    ]);
    let names = [
        ("Alice", 1, 12000),
        ("Bob", 2, 10000),
        ("Charlie", 3, 9000),
        ("David", 4, 11000),
        ("Eve", 5, 13000),
    ];
    let mut batch = RowBatch::build(schema.clone(), names.len());
    for (i, (_, id, salary)) in names.iter().enumerate() {
        batch.column_mut(0).set_i32(i, *id);
        batch.column_mut(1).set_i32(i, *salary);
    }
    (schema, batch)
}

fn main() {
    env_logger::init();

    let (schema, batch) = build_employees();
    let generator = BatchCodeGenerator::default();

    let raise = Expr::Add(
        Box::new(Expr::Attribute("salary".to_string())),
        Box::new(Expr::literal(ScalarValue::Int(500))),
    );
    let projection = generator.compile(&raise, &schema).expect("raise compiles");
    let raised = projection.apply(&batch).expect("raise evaluates");

    let high_earner = Expr::Cmp(
        CmpOp::Gt,
        Box::new(Expr::Attribute("salary".to_string())),
        Box::new(Expr::literal(ScalarValue::Int(10000))),
    );
    let filter = generator.compile(&high_earner, &schema).expect("filter compiles");
    let mask = filter.apply(&batch).expect("filter evaluates");

    for i in 0..batch.row_num() {
        println!(
            "row {i}: salary+500 = {}, salary > 10000 = {}",
            raised.get_i32(i),
            mask.get_bool(i)
        );
    }

    batch.free();
}
