// ABOUTME: Reduces a set of guard atoms into canonical half-open loop bounds

use crate::cond::{Atom, NormOp, Rel};
use crate::error::TransformError;
use crate::expr::Expr;
use crate::rat::Rat;
use crate::symbol::Symbol;

/// Canonical loop domain: `{ i : start <= i < end }` together with the
/// conditions that do not constrain the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopRange {
    pub start: Expr,
    pub end: Expr,
    pub remaining: Vec<Atom>,
}

/// Reduce a mixed atom set into `(start, end, remaining)`.
///
/// Index-mentioning relations are isolated to one of the five canonical
/// forms and translated to half-open contributions; multiple lower bounds
/// combine with `max`, multiple upper bounds with `min`. Atoms that do not
/// constrain the index — flags, foreign relations, and relations whose
/// index terms cancel — are returned in `remaining`.
pub fn reduce_index_range(index: &Symbol, atoms: &[Atom]) -> Result<LoopRange, TransformError> {
    let mut starts: Vec<Expr> = Vec::new();
    let mut ends: Vec<Expr> = Vec::new();
    let mut remaining: Vec<Atom> = Vec::new();

    for atom in atoms {
        let rel = match atom {
            Atom::Rel(rel) if rel.mentions(index) => rel,
            other => {
                remaining.push(other.clone());
                continue;
            }
        };
        match isolate(index, rel)? {
            Isolated::Free => remaining.push(atom.clone()),
            Isolated::Start(e) => starts.push(e),
            Isolated::End(e) => ends.push(e),
            Isolated::Exact(e) => {
                ends.push(Expr::add2(e.clone(), Expr::int(1)));
                starts.push(e);
            }
        }
    }

    if starts.is_empty() {
        return Err(TransformError::UnboundedRange {
            index: index.to_string(),
            side: "lower",
        });
    }
    if ends.is_empty() {
        return Err(TransformError::UnboundedRange {
            index: index.to_string(),
            side: "upper",
        });
    }

    Ok(LoopRange {
        start: Expr::max_of(starts),
        end: Expr::min_of(ends),
        remaining,
    })
}

enum Isolated {
    /// The index cancelled out of the relation
    Free,
    /// `index >= e`
    Start(Expr),
    /// `index < e`
    End(Expr),
    /// `index == e`
    Exact(Expr),
}

/// Rewrite a relation mentioning the index as a bound on the index. The
/// index must occur linearly with coefficient 1 or -1.
fn isolate(index: &Symbol, rel: &Rel) -> Result<Isolated, TransformError> {
    let (diff, op) = rel.norm();
    let mut coefficient = Rat::ZERO;
    let mut rest: Vec<(Rat, Vec<Expr>)> = Vec::new();

    for (coeff, factors) in diff.combined_monomials() {
        let is_bare_index = factors.len() == 1 && factors[0] == Expr::Symbol(index.clone());
        if is_bare_index {
            coefficient = coefficient.add(coeff);
            continue;
        }
        if factors.iter().any(|f| f.contains(index)) {
            return Err(TransformError::NonLinearIndex {
                index: index.to_string(),
                expression: rel.to_string(),
            });
        }
        rest.push((coeff, factors));
    }

    if coefficient.is_zero() {
        return Ok(Isolated::Free);
    }
    let unit = if coefficient == Rat::int(1) {
        1
    } else if coefficient == Rat::int(-1) {
        -1
    } else {
        return Err(TransformError::NonUnitCoefficient {
            index: index.to_string(),
            coefficient: format!("{}/{}", coefficient.num(), coefficient.den()),
            inequality: rel.to_string(),
        });
    };

    // For coefficient 1 the relation reads `index + rest ⋈ 0`, so the bound
    // is `-rest`; for -1 it reads `-index + rest ⋈ 0` with bound `rest` and
    // the comparison direction flipped.
    let bound = if unit == 1 {
        Expr::from_monomials(rest.into_iter().map(|(c, f)| (c.neg(), f)).collect())
    } else {
        Expr::from_monomials(rest)
    };
    let one_past = |e: Expr| Expr::add2(e, Expr::int(1));

    Ok(match (op, unit) {
        (NormOp::Eq0, _) => Isolated::Exact(bound),
        // index < bound / index <= bound
        (NormOp::Lt0, 1) => Isolated::End(bound),
        (NormOp::Le0, 1) => Isolated::End(one_past(bound)),
        // bound < index / bound <= index
        (NormOp::Lt0, -1) => Isolated::Start(one_past(bound)),
        (NormOp::Le0, -1) => Isolated::Start(bound),
        _ => unreachable!("unit coefficient is 1 or -1"),
    })
}
