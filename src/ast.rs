// ABOUTME: Unresolved AST produced by the parser and consumed by resolution

use crate::cond::{Cond, Rel};
use crate::error::TransformError;
use crate::expr::Expr;
use crate::symbol::Symbol;

/// An additive accumulator update: `target += amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    pub target: Symbol,
    pub amount: Expr,
}

impl Increment {
    pub fn new(target: impl Into<Symbol>, amount: Expr) -> Self {
        Increment {
            target: target.into(),
            amount,
        }
    }
}

/// A conditional over a statement block. The condition may be any boolean
/// combination; resolution flattens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub condition: Cond,
    pub body: StatementBlock,
}

impl If {
    pub fn new(condition: Cond, body: StatementBlock) -> Self {
        If { condition, body }
    }

    /// The else-branch of this statement: same shape, negated condition.
    pub fn negated(&self, body: StatementBlock) -> If {
        If {
            condition: self.condition.negated(),
            body,
        }
    }
}

/// A counting loop described by its index and the inequalities bounding it.
/// Every inequality must mention the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct For {
    pub index: Symbol,
    pub bounds: Vec<Rel>,
    pub body: StatementBlock,
}

impl For {
    pub fn new(
        index: impl Into<Symbol>,
        bounds: Vec<Rel>,
        body: StatementBlock,
    ) -> Result<Self, TransformError> {
        let index = index.into();
        for bound in &bounds {
            if !bound.mentions(&index) {
                return Err(TransformError::ForeignInequality {
                    index: index.to_string(),
                    inequality: bound.to_string(),
                });
            }
        }
        Ok(For {
            index,
            bounds,
            body,
        })
    }

    /// Convenience constructor for the `range(lo, hi)` surface form:
    /// `lo <= index < hi`.
    pub fn counting(
        index: impl Into<Symbol>,
        lo: Expr,
        hi: Expr,
        body: StatementBlock,
    ) -> Result<Self, TransformError> {
        let index = index.into();
        let bounds = vec![
            Rel::le(lo, Expr::sym(index.clone())),
            Rel::lt(Expr::sym(index.clone()), hi),
        ];
        For::new(index, bounds, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Increment(Increment),
    If(If),
    For(For),
}

/// An ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBlock(pub Vec<Statement>);

impl StatementBlock {
    pub fn new(statements: Vec<Statement>) -> Self {
        StatementBlock(statements)
    }

    pub fn push(&mut self, statement: Statement) {
        self.0.push(statement);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cond::RelOp;

    #[test]
    fn test_for_rejects_foreign_inequality() {
        let bounds = vec![Rel::lt(Expr::sym("a"), Expr::sym("b"))];
        let result = For::new("i", bounds, StatementBlock::default());
        assert!(matches!(
            result,
            Err(TransformError::ForeignInequality { .. })
        ));
    }

    #[test]
    fn test_counting_builds_half_open_bounds() {
        let f = For::counting("i", Expr::int(0), Expr::sym("n"), StatementBlock::default())
            .unwrap();
        assert_eq!(f.bounds.len(), 2);
        assert_eq!(f.bounds[0].op, RelOp::Le);
        assert_eq!(f.bounds[1].op, RelOp::Lt);
    }

    #[test]
    fn test_if_negation() {
        let cond = Cond::rel(Rel::lt(Expr::sym("c"), Expr::sym("x")));
        let stmt = If::new(cond, StatementBlock::default());
        let negated = stmt.negated(StatementBlock::default());
        let mut env = std::collections::HashMap::new();
        env.insert(Symbol::new("c"), 1);
        env.insert(Symbol::new("x"), 0);
        assert!(!stmt.condition.eval(&env).unwrap());
        assert!(negated.condition.eval(&env).unwrap());
    }
}
