//! Expression IR: unbound attribute references, bound references, and the
//! arithmetic/comparison/logical/cast operators the core understands.

use crate::datatype::{DataType, ScalarValue};
use crate::error::CoreError;

/// The schema the upstream planner hands the core: an ordered list of
/// attributes, each resolvable to an ordinal position in a row batch.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<(String, DataType, bool)>,
}

impl Schema {
    pub fn new(attributes: Vec<(String, DataType, bool)>) -> Self {
        Self { attributes }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|(n, _, _)| n == name)
    }

    pub fn attribute(&self, ordinal: usize) -> Option<&(String, DataType, bool)> {
        self.attributes.get(ordinal)
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Tagged expression tree. `Attribute` is the only unbound variant; `bind`
/// resolves it to `BoundRef` against a `Schema` (spec §4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Attribute(String),
    BoundRef(usize, DataType, bool),
    Literal(ScalarValue, DataType),
    Cast(Box<Expr>, DataType),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Rem(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn literal(value: ScalarValue) -> Expr {
        let dtype = value.data_type();
        Expr::Literal(value, dtype)
    }

    /// Resolve every `Attribute(name)` leaf to a `BoundRef` against `schema`.
    pub fn bind(&self, schema: &Schema) -> Result<Expr, CoreError> {
        match self {
            Expr::Attribute(name) => {
                let ordinal = schema
                    .ordinal_of(name)
                    .ok_or_else(|| CoreError::UnsupportedExpression(format!(
                        "unknown attribute `{name}`"
                    )))?;
                let (_, dtype, nullable) = schema.attribute(ordinal).unwrap();
                Ok(Expr::BoundRef(ordinal, *dtype, *nullable))
            }
            Expr::BoundRef(..) | Expr::Literal(..) => Ok(self.clone()),
            Expr::Cast(child, to) => Ok(Expr::Cast(Box::new(child.bind(schema)?), *to)),
            Expr::Add(l, r) => Ok(Expr::Add(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?))),
            Expr::Sub(l, r) => Ok(Expr::Sub(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?))),
            Expr::Mul(l, r) => Ok(Expr::Mul(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?))),
            Expr::Div(l, r) => Ok(Expr::Div(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?))),
            Expr::Rem(l, r) => Ok(Expr::Rem(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?))),
            Expr::Cmp(op, l, r) => Ok(Expr::Cmp(
                *op,
                Box::new(l.bind(schema)?),
                Box::new(r.bind(schema)?),
            )),
            Expr::And(l, r) => Ok(Expr::And(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?))),
            Expr::Or(l, r) => Ok(Expr::Or(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?))),
            Expr::Not(x) => Ok(Expr::Not(Box::new(x.bind(schema)?))),
        }
    }

    /// Output type of this (bound) expression node.
    pub fn data_type(&self) -> DataType {
        match self {
            Expr::Attribute(_) => unreachable!("data_type called on an unbound expression"),
            Expr::BoundRef(_, dtype, _) => *dtype,
            Expr::Literal(_, dtype) => *dtype,
            Expr::Cast(_, to) => *to,
            Expr::Add(l, _) | Expr::Sub(l, _) | Expr::Mul(l, _) | Expr::Div(l, _) => l.data_type(),
            Expr::Rem(l, _) => l.data_type(),
            Expr::Cmp(..) => DataType::Boolean,
            Expr::And(..) | Expr::Or(..) => DataType::Boolean,
            Expr::Not(_) => DataType::Boolean,
        }
    }

    /// True for operators that are commutative and associative, i.e. safe
    /// to reorder for canonicalization purposes.
    fn is_commutative(&self) -> bool {
        matches!(
            self,
            Expr::Add(..) | Expr::Mul(..) | Expr::And(..) | Expr::Or(..) | Expr::Cmp(CmpOp::Eq, ..)
        )
    }

    /// A deterministic, purely structural rewrite used as the compilation
    /// cache key (spec §3, §4.5). Strips nothing else (there is no debug
    /// metadata carried on this IR) but normalizes child order for
    /// commutative-and-associative operators using a stable textual key, so
    /// that `canonicalize(canonicalize(e)) == canonicalize(e)`.
    pub fn canonicalize(&self) -> Expr {
        match self {
            Expr::Attribute(name) => Expr::Attribute(name.clone()),
            Expr::BoundRef(ord, dtype, nullable) => Expr::BoundRef(*ord, *dtype, *nullable),
            Expr::Literal(value, dtype) => Expr::Literal(value.clone(), *dtype),
            Expr::Cast(child, to) => Expr::Cast(Box::new(child.canonicalize()), *to),
            Expr::Add(l, r) => canonicalize_commutative(Expr::Add as fn(_, _) -> _, l, r),
            Expr::Mul(l, r) => canonicalize_commutative(Expr::Mul as fn(_, _) -> _, l, r),
            Expr::And(l, r) => canonicalize_commutative(Expr::And as fn(_, _) -> _, l, r),
            Expr::Or(l, r) => canonicalize_commutative(Expr::Or as fn(_, _) -> _, l, r),
            Expr::Cmp(CmpOp::Eq, l, r) => {
                let (l, r) = order_pair(l.canonicalize(), r.canonicalize());
                Expr::Cmp(CmpOp::Eq, Box::new(l), Box::new(r))
            }
            Expr::Sub(l, r) => Expr::Sub(Box::new(l.canonicalize()), Box::new(r.canonicalize())),
            Expr::Div(l, r) => Expr::Div(Box::new(l.canonicalize()), Box::new(r.canonicalize())),
            Expr::Rem(l, r) => Expr::Rem(Box::new(l.canonicalize()), Box::new(r.canonicalize())),
            Expr::Cmp(op, l, r) => {
                Expr::Cmp(*op, Box::new(l.canonicalize()), Box::new(r.canonicalize()))
            }
            Expr::Not(x) => Expr::Not(Box::new(x.canonicalize())),
        }
    }

    /// Textual key used by the compilation cache; two trees canonicalizing
    /// equal must produce the same key (spec §4.5).
    pub fn cache_key(&self) -> String {
        format!("{:?}", self.canonicalize())
    }
}

fn order_pair(l: Expr, r: Expr) -> (Expr, Expr) {
    let lk = format!("{l:?}");
    let rk = format!("{r:?}");
    if lk <= rk {
        (l, r)
    } else {
        (r, l)
    }
}

fn canonicalize_commutative(
    ctor: fn(Box<Expr>, Box<Expr>) -> Expr,
    l: &Expr,
    r: &Expr,
) -> Expr {
    let (l, r) = order_pair(l.canonicalize(), r.canonicalize());
    ctor(Box::new(l), Box::new(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_resolves_attribute_to_bound_ref() {
        let schema = Schema::new(vec![("salary".to_string(), DataType::Int, true)]);
        let bound = Expr::Attribute("salary".to_string()).bind(&schema).unwrap();
        assert_eq!(bound, Expr::BoundRef(0, DataType::Int, true));
    }

    #[test]
    fn bind_unknown_attribute_is_unsupported() {
        let schema = Schema::new(vec![]);
        let result = Expr::Attribute("missing".to_string()).bind(&schema);
        assert!(matches!(result, Err(CoreError::UnsupportedExpression(_))));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let e = Expr::Add(
            Box::new(Expr::literal(ScalarValue::Int(2))),
            Box::new(Expr::BoundRef(0, DataType::Int, false)),
        );
        let once = e.canonicalize();
        let twice = once.canonicalize();
        assert_eq!(format!("{once:?}"), format!("{twice:?}"));
    }

    #[test]
    fn canonicalize_normalizes_commutative_order() {
        let a = Expr::Add(
            Box::new(Expr::BoundRef(0, DataType::Int, false)),
            Box::new(Expr::literal(ScalarValue::Int(2))),
        );
        let b = Expr::Add(
            Box::new(Expr::literal(ScalarValue::Int(2))),
            Box::new(Expr::BoundRef(0, DataType::Int, false)),
        );
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn canonicalize_preserves_non_commutative_order() {
        let a = Expr::Cmp(
            CmpOp::Gt,
            Box::new(Expr::BoundRef(0, DataType::Int, false)),
            Box::new(Expr::literal(ScalarValue::Int(2))),
        );
        let b = Expr::Cmp(
            CmpOp::Gt,
            Box::new(Expr::literal(ScalarValue::Int(2))),
            Box::new(Expr::BoundRef(0, DataType::Int, false)),
        );
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
