// ABOUTME: Common-subexpression extraction over a resolved block

use crate::ast::Increment;
use crate::cond::{Atom, Cond, Rel};
use crate::config::Options;
use crate::error::TransformError;
use crate::expr::Expr;
use crate::resolve::{from_condition, ResolvedBlock, ResolvedIf, ResolvedStatement};
use crate::symbol::Symbol;
use std::collections::{BTreeSet, HashMap};

/// A single assignment used for zero-initialization and CSE helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub target: Symbol,
    pub value: Expr,
}

impl Assignment {
    pub fn new(target: impl Into<Symbol>, value: Expr) -> Self {
        Assignment {
            target: target.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CseItem {
    Assignment(Assignment),
    Increment(Increment),
    If(ResolvedIf),
}

/// The terminal block: zero-initializations, helper assignments, then the
/// guarded and bare increments. Assignments always precede any reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CseBlock(pub Vec<CseItem>);

impl CseBlock {
    pub fn iter(&self) -> std::slice::Iter<'_, CseItem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rewrite a resolved block into a CSE block: zero-init every accumulator,
/// extract repeated compound subexpressions into helper assignments, and
/// rebuild every statement from its reduced expressions.
pub fn cse_block(block: &ResolvedBlock, options: &Options) -> Result<CseBlock, TransformError> {
    // Collect expressions in document order: guard relation sides first,
    // then the increment amounts of each statement.
    let mut expressions: Vec<Expr> = Vec::new();
    let mut accumulators: Vec<Symbol> = Vec::new();
    let mut seen: BTreeSet<Symbol> = BTreeSet::new();
    for statement in block.iter() {
        match statement {
            ResolvedStatement::Increment(inc) => {
                expressions.push(inc.amount.clone());
                note_accumulator(&inc.target, &mut accumulators, &mut seen);
            }
            ResolvedStatement::If(group) => {
                for atom in group.guard.atoms() {
                    if let Atom::Rel(rel) = atom {
                        expressions.push(rel.lhs.clone());
                        expressions.push(rel.rhs.clone());
                    }
                }
                for inc in &group.body {
                    expressions.push(inc.amount.clone());
                    note_accumulator(&inc.target, &mut accumulators, &mut seen);
                }
            }
        }
    }

    let mut items: Vec<CseItem> = accumulators
        .into_iter()
        .map(|target| CseItem::Assignment(Assignment::new(target, Expr::int(0))))
        .collect();

    if !options.extract_common_subexpressions {
        for statement in block.iter() {
            items.push(match statement {
                ResolvedStatement::Increment(inc) => CseItem::Increment(inc.clone()),
                ResolvedStatement::If(group) => CseItem::If(group.clone()),
            });
        }
        return Ok(CseBlock(items));
    }

    let mut used_names: BTreeSet<Symbol> = seen;
    for expression in &expressions {
        expression.free_symbols(&mut used_names);
    }
    let (replacements, mut reduced) = extract_common(&expressions, &used_names);
    reduced.reverse(); // consume from the back via pop

    for (helper, value) in replacements {
        items.push(CseItem::Assignment(Assignment::new(helper, value)));
    }

    for statement in block.iter() {
        match statement {
            ResolvedStatement::Increment(inc) => {
                let amount = next_reduced(&mut reduced)?;
                items.push(CseItem::Increment(Increment::new(inc.target.clone(), amount)));
            }
            ResolvedStatement::If(group) => {
                let mut atoms: Vec<Cond> = Vec::new();
                for atom in group.guard.atoms() {
                    match atom {
                        Atom::Rel(rel) => {
                            let lhs = next_reduced(&mut reduced)?;
                            let rhs = next_reduced(&mut reduced)?;
                            atoms.push(Cond::rel(Rel::new(rel.op, lhs, rhs)));
                        }
                        flag => atoms.push(Cond::Atom(flag.clone())),
                    }
                }
                let mut body = Vec::with_capacity(group.body.len());
                for inc in &group.body {
                    let amount = next_reduced(&mut reduced)?;
                    body.push(Increment::new(inc.target.clone(), amount));
                }
                // Degenerate rebuilt guards fold exactly like fresh ones.
                for statement in from_condition(Cond::and(atoms), body, options)?.0 {
                    items.push(match statement {
                        ResolvedStatement::Increment(inc) => CseItem::Increment(inc),
                        ResolvedStatement::If(group) => CseItem::If(group),
                    });
                }
            }
        }
    }
    Ok(CseBlock(items))
}

fn note_accumulator(target: &Symbol, order: &mut Vec<Symbol>, seen: &mut BTreeSet<Symbol>) {
    if seen.insert(target.clone()) {
        order.push(target.clone());
    }
}

fn next_reduced(reduced: &mut Vec<Expr>) -> Result<Expr, TransformError> {
    reduced.pop().ok_or_else(|| {
        TransformError::eval("common-subexpression extraction returned too few expressions")
    })
}

/// Extract compound subexpressions occurring at least twice across the
/// expression list. Returns helper assignments (earlier helpers may appear
/// in later ones) and the input list rewritten over the helpers.
fn extract_common(
    expressions: &[Expr],
    used_names: &BTreeSet<Symbol>,
) -> (Vec<(Symbol, Expr)>, Vec<Expr>) {
    let mut seen: HashMap<Expr, usize> = HashMap::new();
    let mut candidates: Vec<Expr> = Vec::new();
    let mut counter = 0usize;
    for expression in expressions {
        find_repeated(expression, &mut seen, &mut candidates, &mut counter);
    }

    // Inner candidates first so later helper definitions can reference
    // earlier helpers.
    candidates.sort_by_key(|e| (node_count(e), seen.get(e).copied().unwrap_or(usize::MAX)));

    let mut names = HelperNames::new(used_names);
    let mut mapping: HashMap<Expr, Symbol> = HashMap::new();
    let mut replacements: Vec<(Symbol, Expr)> = Vec::new();
    for candidate in candidates {
        let definition = rewrite(&candidate, &mapping, true);
        let name = names.fresh();
        mapping.insert(candidate, name.clone());
        replacements.push((name, definition));
    }

    let reduced = expressions
        .iter()
        .map(|e| rewrite(e, &mapping, false))
        .collect();
    (replacements, reduced)
}

/// Replace mapped subexpressions by their helper symbols, bottom-up. With
/// `skip_root` the root itself is left intact (used for helper bodies).
fn rewrite(expression: &Expr, mapping: &HashMap<Expr, Symbol>, skip_root: bool) -> Expr {
    if !skip_root {
        if let Some(helper) = mapping.get(expression) {
            return Expr::sym(helper.clone());
        }
    }
    match expression {
        Expr::Add(cs) => Expr::add(cs.iter().map(|c| rewrite(c, mapping, false)).collect()),
        Expr::Mul(cs) => Expr::mul(cs.iter().map(|c| rewrite(c, mapping, false)).collect()),
        Expr::Max(cs) => Expr::max_of(cs.iter().map(|c| rewrite(c, mapping, false)).collect()),
        Expr::Min(cs) => Expr::min_of(cs.iter().map(|c| rewrite(c, mapping, false)).collect()),
        _ => expression.clone(),
    }
}

/// Record every compound subexpression occurring at least twice. A repeat
/// stops the descent, so the interior of an extracted subexpression is not
/// extracted again on its behalf.
fn find_repeated(
    expression: &Expr,
    seen: &mut HashMap<Expr, usize>,
    repeated: &mut Vec<Expr>,
    counter: &mut usize,
) {
    if expression.children().is_empty() {
        return;
    }
    if seen.contains_key(expression) {
        if !repeated.contains(expression) {
            repeated.push(expression.clone());
        }
        return;
    }
    seen.insert(expression.clone(), *counter);
    *counter += 1;
    for child in expression.children() {
        find_repeated(child, seen, repeated, counter);
    }
}

fn node_count(expression: &Expr) -> usize {
    1 + expression.children().iter().map(node_count).sum::<usize>()
}

/// Fresh helper names `x0`, `x1`, ... skipping anything the program uses.
struct HelperNames<'a> {
    used: &'a BTreeSet<Symbol>,
    next: usize,
}

impl<'a> HelperNames<'a> {
    fn new(used: &'a BTreeSet<Symbol>) -> Self {
        HelperNames { used, next: 0 }
    }

    fn fresh(&mut self) -> Symbol {
        loop {
            let candidate = Symbol::new(format!("x{}", self.next));
            self.next += 1;
            if !self.used.contains(&candidate) {
                return candidate;
            }
        }
    }
}
