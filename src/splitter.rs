// ABOUTME: Max/min case splitter eliminating extrema over target symbols

use crate::cond::{Atom, Cond, Rel};
use crate::expr::Expr;
use crate::symbol::Symbol;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtremumKind {
    Max,
    Min,
}

/// Splits expressions and conditions into inequality-guarded cases in which
/// every `max`/`min` subexpression mentioning a target symbol resolves to a
/// single argument.
///
/// Case convention (required for a disjoint yet complete integer cover):
/// earlier symbol-bearing arguments win ties non-strictly, later arguments
/// and the collapsed non-symbol remainder lose ties strictly, and the
/// remainder case itself wins ties non-strictly against every symbol-bearing
/// argument.
pub struct ExtremumSplitter {
    cache: HashMap<(Expr, Vec<Symbol>), Vec<(Vec<Rel>, Expr)>>,
}

impl ExtremumSplitter {
    pub fn new() -> Self {
        ExtremumSplitter {
            cache: HashMap::new(),
        }
    }

    /// All cases of `expr` with extrema over `targets` eliminated. Returns
    /// a single unguarded case when nothing splits.
    pub fn split_expr(&mut self, expr: &Expr, targets: &[Symbol]) -> Vec<(Vec<Rel>, Expr)> {
        let key = (expr.clone(), targets.to_vec());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let result = match find_candidate(expr, targets) {
            None => vec![(Vec::new(), expr.clone())],
            Some(candidate) => {
                let (kind, cases) = split_cases(&candidate, targets);
                let mut out = Vec::new();
                for case in cases {
                    let replaced = replace_in_expr(expr, kind, &case);
                    for (sub_rels, sub_expr) in self.split_expr(&replaced, targets) {
                        let mut rels = case.rels.clone();
                        rels.extend(sub_rels);
                        out.push((rels, sub_expr));
                    }
                }
                out
            }
        };
        self.cache.insert(key, result.clone());
        result
    }

    /// Condition counterpart of `split_expr`: the rewrite is applied across
    /// every relation side of the condition at once.
    pub fn split_cond(&mut self, cond: &Cond, targets: &[Symbol]) -> Vec<(Vec<Rel>, Cond)> {
        match find_cond_candidate(cond, targets) {
            None => vec![(Vec::new(), cond.clone())],
            Some(candidate) => {
                let (kind, cases) = split_cases(&candidate, targets);
                let mut out = Vec::new();
                for case in cases {
                    let replaced = replace_in_cond(cond, kind, &case);
                    for (sub_rels, sub_cond) in self.split_cond(&replaced, targets) {
                        let mut rels = case.rels.clone();
                        rels.extend(sub_rels);
                        out.push((rels, sub_cond));
                    }
                }
                out
            }
        }
    }
}

impl Default for ExtremumSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// One resolution case of an extremum node: the argument that wins, the
/// arguments removed alongside it, and the side conditions making it win.
struct SplitCase {
    winner: Expr,
    removed: Vec<Expr>,
    /// false for the collapsed non-symbol remainder case, where the winner
    /// need not occur verbatim among a node's arguments
    winner_is_argument: bool,
    rels: Vec<Rel>,
}

/// Innermost `max`/`min` node with at least one target-bearing argument,
/// in postorder.
fn find_candidate(expr: &Expr, targets: &[Symbol]) -> Option<Expr> {
    for child in expr.children() {
        if let Some(found) = find_candidate(child, targets) {
            return Some(found);
        }
    }
    match expr {
        Expr::Max(args) | Expr::Min(args) => {
            if args.iter().any(|a| a.contains_any(targets)) {
                Some(expr.clone())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn find_cond_candidate(cond: &Cond, targets: &[Symbol]) -> Option<Expr> {
    match cond {
        Cond::True | Cond::False => None,
        Cond::Atom(Atom::Flag { .. }) => None,
        Cond::Atom(Atom::Rel(rel)) => {
            find_candidate(&rel.lhs, targets).or_else(|| find_candidate(&rel.rhs, targets))
        }
        Cond::And(children) | Cond::Or(children) => {
            children.iter().find_map(|c| find_cond_candidate(c, targets))
        }
    }
}

fn split_cases(candidate: &Expr, targets: &[Symbol]) -> (ExtremumKind, Vec<SplitCase>) {
    let (kind, args) = match candidate {
        Expr::Max(args) => (ExtremumKind::Max, args),
        Expr::Min(args) => (ExtremumKind::Min, args),
        _ => return (ExtremumKind::Max, Vec::new()),
    };
    let (symbol_args, other_args): (Vec<Expr>, Vec<Expr>) = args
        .iter()
        .cloned()
        .partition(|a| a.contains_any(targets));

    let mut cases = Vec::new();
    for (i, winner) in symbol_args.iter().enumerate() {
        let earlier = &symbol_args[..i];
        let later: Vec<Expr> = symbol_args[i + 1..]
            .iter()
            .chain(other_args.iter())
            .cloned()
            .collect();

        let mut rels = Vec::new();
        for arg in earlier {
            rels.push(tie_rel(kind, arg.clone(), winner.clone(), false));
        }
        for arg in &later {
            rels.push(tie_rel(kind, arg.clone(), winner.clone(), true));
        }

        let mut removed: Vec<Expr> = earlier.to_vec();
        removed.extend(later);
        cases.push(SplitCase {
            winner: winner.clone(),
            removed,
            winner_is_argument: true,
            rels,
        });
    }

    if !other_args.is_empty() {
        let winner = match kind {
            ExtremumKind::Max => Expr::max_of(other_args),
            ExtremumKind::Min => Expr::min_of(other_args),
        };
        let rels = symbol_args
            .iter()
            .map(|arg| tie_rel(kind, arg.clone(), winner.clone(), false))
            .collect();
        cases.push(SplitCase {
            winner,
            removed: symbol_args,
            winner_is_argument: false,
            rels,
        });
    }
    (kind, cases)
}

/// Inequality making `winner` beat `loser` for the given extremum kind.
fn tie_rel(kind: ExtremumKind, loser: Expr, winner: Expr, strict: bool) -> Rel {
    match (kind, strict) {
        (ExtremumKind::Max, false) => Rel::le(loser, winner),
        (ExtremumKind::Max, true) => Rel::lt(loser, winner),
        (ExtremumKind::Min, false) => Rel::le(winner, loser),
        (ExtremumKind::Min, true) => Rel::lt(winner, loser),
    }
}

/// Collapse every matching extremum node in `expr` according to `case`,
/// bottom-up, rebuilding through the canonical constructors.
fn replace_in_expr(expr: &Expr, kind: ExtremumKind, case: &SplitCase) -> Expr {
    let rebuilt = match expr {
        Expr::Add(cs) => Expr::add(cs.iter().map(|c| replace_in_expr(c, kind, case)).collect()),
        Expr::Mul(cs) => Expr::mul(cs.iter().map(|c| replace_in_expr(c, kind, case)).collect()),
        Expr::Max(cs) => {
            Expr::max_of(cs.iter().map(|c| replace_in_expr(c, kind, case)).collect())
        }
        Expr::Min(cs) => {
            Expr::min_of(cs.iter().map(|c| replace_in_expr(c, kind, case)).collect())
        }
        _ => expr.clone(),
    };
    let matches_kind = matches!(
        (&rebuilt, kind),
        (Expr::Max(_), ExtremumKind::Max) | (Expr::Min(_), ExtremumKind::Min)
    );
    if !matches_kind {
        return rebuilt;
    }
    let args = rebuilt.children();
    if case.winner_is_argument && !args.contains(&case.winner) {
        return rebuilt;
    }
    let kept: Vec<Expr> = args
        .iter()
        .filter(|a| !case.removed.contains(a))
        .cloned()
        .collect();
    if kept.is_empty() {
        return rebuilt;
    }
    match kind {
        ExtremumKind::Max => Expr::max_of(kept),
        ExtremumKind::Min => Expr::min_of(kept),
    }
}

fn replace_in_cond(cond: &Cond, kind: ExtremumKind, case: &SplitCase) -> Cond {
    match cond {
        Cond::True | Cond::False => cond.clone(),
        Cond::Atom(Atom::Flag { .. }) => cond.clone(),
        Cond::Atom(Atom::Rel(rel)) => Cond::rel(Rel::new(
            rel.op,
            replace_in_expr(&rel.lhs, kind, case),
            replace_in_expr(&rel.rhs, kind, case),
        )),
        Cond::And(children) => Cond::and(
            children
                .iter()
                .map(|c| replace_in_cond(c, kind, case))
                .collect(),
        ),
        Cond::Or(children) => Cond::or(
            children
                .iter()
                .map(|c| replace_in_cond(c, kind, case))
                .collect(),
        ),
    }
}
