//! Predicate and projection expressions.
//!
//! An [`Expr`] is a small tree over record fields and constants. It is built
//! with combinators (or the arithmetic operators) and handed to
//! [`compile`](crate::compile()) to produce SQLite text.
//!
//! ```
//! use rowforge_core::Expr;
//!
//! let adult = Expr::col("age").gt(18).and(Expr::col("age").le(65));
//! let discounted = (Expr::col("price") * 0.9).lt(100);
//! assert!(!adult.has_aggregate());
//! assert!(Expr::count().gt(1).has_aggregate());
//! # let _ = discounted;
//! ```

use std::ops;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::value::Value;

/// Binary operators. Every variant except [`BitXor`](Self::BitXor) and
/// [`Power`](Self::Power) has a SQLite spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
    BitAnd,
    BitOr,
    ShiftLeft,
    ShiftRight,
    BitXor,
    Power,
}

impl BinaryOp {
    /// SQLite token, or `None` for operators SQLite lacks.
    pub fn token(&self) -> Option<&'static str> {
        Some(match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitXor | BinaryOp::Power => return None,
        })
    }

    /// Operator name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
            BinaryOp::Modulo => "modulo",
            BinaryOp::Eq => "equal",
            BinaryOp::Ne => "not equal",
            BinaryOp::Gt => "greater than",
            BinaryOp::Ge => "greater than or equal",
            BinaryOp::Lt => "less than",
            BinaryOp::Le => "less than or equal",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::BitAnd => "bitwise and",
            BinaryOp::BitOr => "bitwise or",
            BinaryOp::ShiftLeft => "shift left",
            BinaryOp::ShiftRight => "shift right",
            BinaryOp::BitXor => "exclusive or",
            BinaryOp::Power => "power",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
    BitNot,
}

impl UnaryOp {
    pub fn token(&self) -> &'static str {
        match self {
            UnaryOp::Not => "NOT ",
            UnaryOp::Negate => "-",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Aggregate functions usable in projections and `HAVING` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// Expression tree. Column references name record fields, not SQL columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `field: None` means `*` (only meaningful for `COUNT`).
    Aggregate {
        func: Aggregate,
        field: Option<String>,
    },
}

impl Expr {
    /// References a record field.
    pub fn col(field: impl Into<String>) -> Self {
        Expr::Column(field.into())
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    /// `COUNT(*)`
    pub fn count() -> Self {
        Expr::Aggregate {
            func: Aggregate::Count,
            field: None,
        }
    }

    pub fn count_of(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Count, field)
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Sum, field)
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Avg, field)
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Min, field)
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Max, field)
    }

    fn aggregate(func: Aggregate, field: impl Into<String>) -> Self {
        Expr::Aggregate {
            func,
            field: Some(field.into()),
        }
    }

    pub fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Self {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right.into()),
        }
    }

    pub fn unary(self, op: UnaryOp) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(self),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn ne(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn ge(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn le(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, right)
    }

    pub fn and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    pub fn bit_and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::BitAnd, right)
    }

    pub fn bit_or(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::BitOr, right)
    }

    pub fn bit_xor(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::BitXor, right)
    }

    pub fn shl(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::ShiftLeft, right)
    }

    pub fn shr(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::ShiftRight, right)
    }

    pub fn pow(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Power, right)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        self.unary(UnaryOp::Not)
    }

    pub fn bit_not(self) -> Self {
        self.unary(UnaryOp::BitNot)
    }

    /// True if any node is an aggregate call.
    pub fn has_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Column(_) | Expr::Literal(_) => false,
            Expr::Binary { left, right, .. } => left.has_aggregate() || right.has_aggregate(),
            Expr::Unary { operand, .. } => operand.has_aggregate(),
        }
    }
}

macro_rules! expr_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Literal(Value::from(value))
                }
            }
        )*
    };
}

expr_from_literal!(
    i8, i16, i32, i64, u8, u16, u32, bool, f32, f64, &str, String, char, DateTime<Utc>, Decimal,
    Value,
);

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        self.unary(UnaryOp::Negate)
    }
}

macro_rules! expr_arith {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl<R: Into<Expr>> ops::$trait<R> for Expr {
                type Output = Expr;

                fn $method(self, right: R) -> Expr {
                    self.binary(BinaryOp::$op, right)
                }
            }
        )*
    };
}

expr_arith!(
    Add::add => Add,
    Sub::sub => Subtract,
    Mul::mul => Multiply,
    Div::div => Divide,
    Rem::rem => Modulo,
    BitAnd::bitand => BitAnd,
    BitOr::bitor => BitOr,
    Shl::shl => ShiftLeft,
    Shr::shr => ShiftRight,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_build_trees() {
        let expr = (Expr::col("a") + 1) * Expr::col("b");
        assert_eq!(
            expr,
            Expr::col("a").binary(BinaryOp::Add, 1).binary(BinaryOp::Multiply, Expr::col("b"))
        );
        assert_eq!(-Expr::col("a"), Expr::col("a").unary(UnaryOp::Negate));
        assert_eq!(!Expr::col("a"), Expr::col("a").not());
    }

    #[test]
    fn test_literal_conversions() {
        assert_eq!(Expr::from("x"), Expr::Literal(Value::Text("x".into())));
        assert_eq!(Expr::from(true), Expr::Literal(Value::Integer(1)));
        assert_eq!(Expr::from(Value::Null), Expr::null());
    }

    #[test]
    fn test_unsupported_tokens() {
        assert_eq!(BinaryOp::BitXor.token(), None);
        assert_eq!(BinaryOp::Power.token(), None);
        assert_eq!(BinaryOp::Ne.token(), Some("!="));
    }
}
