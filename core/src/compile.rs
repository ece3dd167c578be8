//! Expression-to-SQL compiler.
//!
//! Parenthesization is fixed:
//!
//! - comparisons render bare: `age > 18`
//! - arithmetic and bitwise binaries wrap themselves: `(age + 1)`
//! - `AND`/`OR` wrap each operand that is itself a comparison, a logical
//!   expression or a `NOT`: `(age > 18) AND (age <= 65)`
//!
//! Comparison operands that are comparisons or logical expressions are
//! wrapped the same way, so the output never relies on SQLite's operator
//! precedence.
//!
//! ```
//! use rowforge_core::{Expr, Record, TableBuilder, TableSchema, compile};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Record for User {
//!     fn describe(table: &mut TableBuilder<Self>) {
//!         table.name("users");
//!         table.column("name", |u| &u.name, |u| &mut u.name);
//!         table.column("age", |u| &u.age, |u| &mut u.age);
//!     }
//! }
//!
//! let schema = TableSchema::<User>::build().unwrap();
//! let adult = Expr::col("age").gt(18).and(Expr::col("age").le(65));
//! assert_eq!(compile(&schema, &adult).unwrap(), "(age > 18) AND (age <= 65)");
//!
//! let unnamed = Expr::col("name").eq(Expr::null());
//! assert_eq!(compile(&schema, &unnamed).unwrap(), "name IS NULL");
//! ```

use crate::client::Parameter;
use crate::codec::render_literal;
use crate::error::{CompileError, Result};
use crate::expr::{Aggregate, BinaryOp, Expr, UnaryOp};
use crate::types::TableSchema;
use crate::value::Value;

/// Compiles `expr` with every constant inlined as a literal.
pub fn compile<T>(schema: &TableSchema<T>, expr: &Expr) -> Result<String> {
    Compiler { schema, params: None }.expr(expr)
}

/// Compiles `expr` with every non-NULL constant bound as a parameter.
///
/// Parameters are appended to `params` and named `:p<n>`, continuing from the
/// number of parameters already present.
pub fn compile_bound<T>(
    schema: &TableSchema<T>,
    expr: &Expr,
    params: &mut Vec<Parameter>,
) -> Result<String> {
    Compiler {
        schema,
        params: Some(params),
    }
    .expr(expr)
}

struct Compiler<'a, T> {
    schema: &'a TableSchema<T>,
    params: Option<&'a mut Vec<Parameter>>,
}

impl<T> Compiler<'_, T> {
    fn expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Column(field) => Ok(self.schema.column(field)?.name().to_string()),
            Expr::Literal(value) => self.literal(value),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Aggregate { func, field } => self.aggregate(*func, field.as_deref()),
        }
    }

    fn literal(&mut self, value: &Value) -> Result<String> {
        match value {
            Value::Blob(_) => Err(CompileError::UnsupportedLiteral("BLOB").into()),
            Value::Null => Ok("NULL".to_string()),
            scalar => match self.params.as_deref_mut() {
                Some(params) => {
                    let name = format!(":p{}", params.len() + 1);
                    params.push(Parameter::new(name.clone(), scalar.clone()));
                    Ok(name)
                }
                None => Ok(render_literal(scalar)?),
            },
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<String> {
        let token = op
            .token()
            .ok_or(CompileError::UnsupportedOperator(op.name()))?;

        let token = match op {
            BinaryOp::Eq if is_null(left) || is_null(right) => "IS",
            BinaryOp::Ne if is_null(left) || is_null(right) => "IS NOT",
            _ => token,
        };

        let left = self.operand(left)?;
        let right = self.operand(right)?;
        if op.is_comparison() || op.is_logical() {
            Ok(format!("{left} {token} {right}"))
        } else {
            Ok(format!("({left} {token} {right})"))
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<String> {
        let inner = self.operand(operand)?;
        // `- -x` must not collapse into a `--` comment
        if op == UnaryOp::Negate && inner.starts_with('-') {
            return Ok(format!("-({inner})"));
        }
        Ok(format!("{}{inner}", op.token()))
    }

    fn aggregate(&mut self, func: Aggregate, field: Option<&str>) -> Result<String> {
        match field {
            Some(field) => {
                let column = self.schema.column(field)?;
                Ok(format!("{}({})", func.as_str(), column.name()))
            }
            None if func == Aggregate::Count => Ok("COUNT(*)".to_string()),
            None => Err(CompileError::UnsupportedOperator(func.as_str()).into()),
        }
    }

    /// Compiles a sub-expression, wrapping it when it would otherwise bind
    /// looser than its parent.
    fn operand(&mut self, expr: &Expr) -> Result<String> {
        let text = self.expr(expr)?;
        if needs_wrap(expr) {
            Ok(format!("({text})"))
        } else {
            Ok(text)
        }
    }
}

fn needs_wrap(expr: &Expr) -> bool {
    match expr {
        Expr::Binary { op, .. } => op.is_comparison() || op.is_logical(),
        Expr::Unary { op, .. } => *op == UnaryOp::Not,
        _ => false,
    }
}

fn is_null(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, SchemaError};
    use crate::types::{Record, TableBuilder};
    use crate::value::Blob;

    #[derive(Debug, Default)]
    struct Item {
        id: i64,
        name: String,
        qty: i32,
        price: f64,
        flags: i64,
        data: Blob<Vec<u8>>,
    }

    impl Record for Item {
        fn describe(table: &mut TableBuilder<Self>) {
            table.name("items");
            table.column("id", |i| &i.id, |i| &mut i.id);
            table.column("name", |i| &i.name, |i| &mut i.name).rename("item_name");
            table.column("qty", |i| &i.qty, |i| &mut i.qty);
            table.column("price", |i| &i.price, |i| &mut i.price);
            table.column("flags", |i| &i.flags, |i| &mut i.flags);
            table.column("data", |i| &i.data, |i| &mut i.data);
        }
    }

    fn schema() -> TableSchema<Item> {
        TableSchema::build().unwrap()
    }

    fn sql(expr: Expr) -> String {
        compile(&schema(), &expr).unwrap()
    }

    #[test]
    fn test_comparison_renders_bare() {
        assert_eq!(sql(Expr::col("qty").gt(18)), "qty > 18");
        assert_eq!(sql(Expr::col("qty").ne(3)), "qty != 3");
        assert_eq!(sql(Expr::col("name").eq("O'Neil")), "item_name = 'O''Neil'");
    }

    #[test]
    fn test_arithmetic_wraps_itself() {
        assert_eq!(sql((Expr::col("qty") + 1).gt(5)), "(qty + 1) > 5");
        assert_eq!(
            sql((Expr::col("price") * Expr::col("qty")).le(100.0)),
            "(price * qty) <= 100.0"
        );
        assert_eq!(sql((Expr::col("qty") % 2).eq(0)), "(qty % 2) = 0");
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(sql(Expr::col("flags").bit_and(4).ne(0)), "(flags & 4) != 0");
        assert_eq!(sql((Expr::col("flags") | 1).eq(1)), "(flags | 1) = 1");
        assert_eq!(sql(Expr::col("flags").shl(2).gt(0)), "(flags << 2) > 0");
        assert_eq!(sql(Expr::col("flags").shr(1).gt(0)), "(flags >> 1) > 0");
        assert_eq!(sql(Expr::col("flags").bit_not().eq(0)), "~flags = 0");
    }

    #[test]
    fn test_logical_wraps_operands() {
        let expr = Expr::col("qty")
            .gt(1)
            .and(Expr::col("qty").lt(10).or(Expr::col("id").eq(7)));
        assert_eq!(sql(expr), "(qty > 1) AND ((qty < 10) OR (id = 7))");
        assert_eq!(sql(Expr::col("qty").gt(1).not()), "NOT (qty > 1)");
    }

    #[test]
    fn test_null_comparisons_use_is() {
        assert_eq!(sql(Expr::col("name").eq(Value::Null)), "item_name IS NULL");
        assert_eq!(sql(Expr::col("name").ne(Expr::null())), "item_name IS NOT NULL");
    }

    #[test]
    fn test_negation_avoids_comment_token() {
        assert_eq!(sql(-Expr::col("qty")), "-qty");
        assert_eq!(sql(-(-Expr::col("qty"))), "-(-qty)");
        assert_eq!(sql(-Expr::lit(-3)), "-(-3)");
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(sql(Expr::count().gt(1)), "COUNT(*) > 1");
        assert_eq!(sql(Expr::sum("qty").ge(10)), "SUM(qty) >= 10");
        assert_eq!(sql(Expr::avg("price")), "AVG(price)");
        assert_eq!(sql(Expr::max("name")), "MAX(item_name)");
    }

    #[test]
    fn test_unsupported_shapes() {
        let schema = schema();
        assert!(matches!(
            compile(&schema, &Expr::col("qty").bit_xor(1)),
            Err(Error::Compile(CompileError::UnsupportedOperator("exclusive or")))
        ));
        assert!(matches!(
            compile(&schema, &Expr::col("qty").pow(2)),
            Err(Error::Compile(CompileError::UnsupportedOperator("power")))
        ));
        assert!(matches!(
            compile(&schema, &Expr::col("data").eq(Value::Blob(vec![1]))),
            Err(Error::Compile(CompileError::UnsupportedLiteral("BLOB")))
        ));
        assert!(matches!(
            compile(&schema, &Expr::col("item_name").eq("x")),
            Err(Error::Schema(SchemaError::UnmappedField { .. }))
        ));
    }

    #[test]
    fn test_bound_constants() {
        let schema = schema();
        let mut params = vec![Parameter::new("@data", Value::Blob(vec![]))];
        let expr = Expr::col("qty").gt(18).and(Expr::col("name").eq("Ann"));
        let text = compile_bound(&schema, &expr, &mut params).unwrap();
        assert_eq!(text, "(qty > :p2) AND (item_name = :p3)");
        assert_eq!(params[1], Parameter::new(":p2", Value::Integer(18)));
        assert_eq!(params[2], Parameter::new(":p3", Value::Text("Ann".into())));

        let text = compile_bound(&schema, &Expr::col("name").eq(Expr::null()), &mut params).unwrap();
        assert_eq!(text, "item_name IS NULL");
        assert_eq!(params.len(), 3);
    }

    /// Every tree up to a small depth over all supported node kinds compiles
    /// and yields balanced parentheses.
    #[test]
    fn test_exhaustive_trees_balance_parentheses() {
        let leaves = vec![
            Expr::col("qty"),
            Expr::col("name"),
            Expr::lit(3),
            Expr::lit(-2.5),
            Expr::lit("a(b"),
            Expr::null(),
            Expr::count(),
        ];
        let binaries = [
            BinaryOp::Add,
            BinaryOp::Subtract,
            BinaryOp::Multiply,
            BinaryOp::Divide,
            BinaryOp::Modulo,
            BinaryOp::Eq,
            BinaryOp::Ne,
            BinaryOp::Gt,
            BinaryOp::Ge,
            BinaryOp::Lt,
            BinaryOp::Le,
            BinaryOp::And,
            BinaryOp::Or,
            BinaryOp::BitAnd,
            BinaryOp::BitOr,
            BinaryOp::ShiftLeft,
            BinaryOp::ShiftRight,
        ];
        let unaries = [UnaryOp::Not, UnaryOp::Negate, UnaryOp::BitNot];

        let mut level = leaves.clone();
        for _ in 0..2 {
            let mut next = Vec::new();
            for left in &level {
                for op in unaries {
                    next.push(left.clone().unary(op));
                }
                for right in leaves.iter().take(3) {
                    for op in binaries {
                        next.push(left.clone().binary(op, right.clone()));
                        next.push(right.clone().binary(op, left.clone()));
                    }
                }
            }
            level = next;
        }

        let schema = schema();
        for expr in &level {
            let text = compile(&schema, expr).unwrap();
            let mut depth = 0i32;
            let mut in_string = false;
            for c in text.chars() {
                match c {
                    '\'' => in_string = !in_string,
                    '(' if !in_string => depth += 1,
                    ')' if !in_string => {
                        depth -= 1;
                        assert!(depth >= 0, "unbalanced: {text}");
                    }
                    _ => {}
                }
            }
            assert_eq!(depth, 0, "unbalanced: {text}");
            assert!(!text.contains("--"), "comment token in: {text}");
        }
    }
}
