//! Filter predicates pushed down into the reader.
//!
//! A [`Predicate`] is an owned boolean expression tree over field values.
//! The in-memory tree never crosses a process boundary: the planning side
//! serializes it into a byte buffer through the [`carrier`], and every
//! execution context rehydrates its own instance from those bytes. The wire
//! format is an explicit tagged encoding of the tree (one variant per
//! operator and literal kind), so compatibility between planner and executor
//! versions is controlled here rather than by a generic object serializer.
//!
//! During a split read the rehydrated tree is handed to the external reader
//! as a row filter (see [`eval`]), letting it skip rows before full decode.

pub mod carrier;
pub mod eval;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::Value;

pub use carrier::{PredicateCarrier, PredicateCodecError};
pub use eval::PredicateEvalError;

/// Comparison operators usable in a [`Predicate::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    NotEq,
    /// Less than.
    Lt,
    /// Less than or equal.
    LtEq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    GtEq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::LtEq => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::GtEq => write!(f, ">="),
        }
    }
}

/// Boolean filter expression over field values.
///
/// Comparisons follow SQL semantics: comparing against a null cell yields
/// neither true nor false, and such rows are dropped by the row filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Compare a column against a literal value.
    Compare {
        /// Column the comparison reads.
        column: String,
        /// Comparison operator.
        op: CompareOp,
        /// Literal right-hand side.
        value: Value,
    },
    /// True where the column is null.
    IsNull {
        /// Column the check reads.
        column: String,
    },
    /// True where the column is not null.
    IsNotNull {
        /// Column the check reads.
        column: String,
    },
    /// Both operands must hold.
    And(Box<Predicate>, Box<Predicate>),
    /// Either operand must hold.
    Or(Box<Predicate>, Box<Predicate>),
    /// The operand must not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// `column op value` comparison node.
    pub fn compare(column: impl Into<String>, op: CompareOp, value: Value) -> Predicate {
        Predicate::Compare {
            column: column.into(),
            op,
            value,
        }
    }

    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: Value) -> Predicate {
        Predicate::compare(column, CompareOp::Eq, value)
    }

    /// `column != value`.
    pub fn not_eq(column: impl Into<String>, value: Value) -> Predicate {
        Predicate::compare(column, CompareOp::NotEq, value)
    }

    /// `column < value`.
    pub fn lt(column: impl Into<String>, value: Value) -> Predicate {
        Predicate::compare(column, CompareOp::Lt, value)
    }

    /// `column <= value`.
    pub fn lt_eq(column: impl Into<String>, value: Value) -> Predicate {
        Predicate::compare(column, CompareOp::LtEq, value)
    }

    /// `column > value`.
    pub fn gt(column: impl Into<String>, value: Value) -> Predicate {
        Predicate::compare(column, CompareOp::Gt, value)
    }

    /// `column >= value`.
    pub fn gt_eq(column: impl Into<String>, value: Value) -> Predicate {
        Predicate::compare(column, CompareOp::GtEq, value)
    }

    /// `column IS NULL`.
    pub fn is_null(column: impl Into<String>) -> Predicate {
        Predicate::IsNull {
            column: column.into(),
        }
    }

    /// `column IS NOT NULL`.
    pub fn is_not_null(column: impl Into<String>) -> Predicate {
        Predicate::IsNotNull {
            column: column.into(),
        }
    }

    /// Conjunction of two predicates.
    pub fn and(a: Predicate, b: Predicate) -> Predicate {
        Predicate::And(Box::new(a), Box::new(b))
    }

    /// Disjunction of two predicates.
    pub fn or(a: Predicate, b: Predicate) -> Predicate {
        Predicate::Or(Box::new(a), Box::new(b))
    }

    /// Negation of a predicate.
    pub fn not(inner: Predicate) -> Predicate {
        Predicate::Not(Box::new(inner))
    }

    /// All column names this predicate reads, deduplicated and ordered.
    pub fn referenced_columns(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::IsNull { column }
            | Predicate::IsNotNull { column } => {
                out.insert(column.as_str());
            }
            Predicate::And(a, b) | Predicate::Or(a, b) => {
                a.collect_columns(out);
                b.collect_columns(out);
            }
            Predicate::Not(inner) => inner.collect_columns(out),
        }
    }
}
