// ABOUTME: Resolves the nested AST into a flat block of guarded increments

use crate::ast::{For, If, Increment, Statement, StatementBlock};
use crate::bounds::reduce_index_range;
use crate::cond::{guard_form, Atom, Cond, Guard, GuardForm, Rel, RelOp};
use crate::config::Options;
use crate::cse::{cse_block, CseBlock};
use crate::error::TransformError;
use crate::expr::Expr;
use crate::parser;
use crate::splitter::ExtremumSplitter;
use crate::sum::closed_sum;
use crate::symbol::Symbol;
use std::collections::BTreeSet;

/// A guarded group of increments. The guard is always a conjunction of
/// atoms; degenerate conditions never construct a `ResolvedIf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIf {
    pub guard: Guard,
    pub body: Vec<Increment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedStatement {
    Increment(Increment),
    If(ResolvedIf),
}

/// A flat sequence of bare and guarded increments: no loops, no nesting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedBlock(pub Vec<ResolvedStatement>);

impl ResolvedBlock {
    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedStatement> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub(crate) struct Context<'a> {
    pub options: &'a Options,
    pub splitter: ExtremumSplitter,
}

/// Run the whole pipeline: resolve, split residual extrema, extract common
/// subexpressions.
pub fn transform(program: &StatementBlock, options: &Options) -> Result<CseBlock, TransformError> {
    let mut ctx = Context {
        options,
        splitter: ExtremumSplitter::new(),
    };
    let mut resolved = resolve_block(program, &mut ctx)?;
    if options.split_residual_extrema {
        resolved = split_residual(resolved, &mut ctx)?;
        resolved = merge_siblings(resolved, options);
    }
    cse_block(&resolved, options)
}

/// Parse and transform in one step.
pub fn transform_source(source: &str, options: &Options) -> Result<CseBlock, TransformError> {
    transform(&parser::parse(source)?, options)
}

/// Resolve a statement block and merge its siblings.
pub(crate) fn resolve_block(
    block: &StatementBlock,
    ctx: &mut Context,
) -> Result<ResolvedBlock, TransformError> {
    let mut resolved = Vec::new();
    for statement in block.iter() {
        match statement {
            Statement::Increment(inc) => {
                let amount = if ctx.options.simplify_increment_expression {
                    inc.amount.expand()
                } else {
                    inc.amount.clone()
                };
                resolved.push(ResolvedStatement::Increment(Increment::new(
                    inc.target.clone(),
                    amount,
                )));
            }
            Statement::If(stmt) => resolved.extend(resolve_if(stmt, ctx)?.0),
            Statement::For(stmt) => resolved.extend(resolve_for(stmt, ctx)?.0),
        }
    }
    Ok(merge_siblings(ResolvedBlock(resolved), ctx.options))
}

/// Fan the condition out into mutually exclusive cases, conjugate nested
/// guarded groups, and pour the body's bare increments into one group per
/// case.
fn resolve_if(stmt: &If, ctx: &mut Context) -> Result<ResolvedBlock, TransformError> {
    let body = resolve_block(&stmt.body, ctx)?;
    let condition = if ctx.options.simplify_condition {
        stmt.condition.simplify()
    } else {
        stmt.condition.clone()
    };
    let cases = condition.exclusive_cases(ctx.options.simplify_dnf)?;

    let mut out = Vec::new();
    for case in &cases {
        let mut increments = Vec::new();
        for statement in body.iter() {
            match statement {
                ResolvedStatement::Increment(inc) => increments.push(inc.clone()),
                ResolvedStatement::If(inner) => {
                    out.extend(conjugate(inner, case, ctx.options)?.0);
                }
            }
        }
        out.extend(from_condition(case.clone(), increments, ctx.options)?.0);
    }
    Ok(ResolvedBlock(out))
}

/// Eliminate the loop: split the body's extrema over the index, reduce the
/// bound set, and replace every increment by its guarded closed-form sum.
fn resolve_for(stmt: &For, ctx: &mut Context) -> Result<ResolvedBlock, TransformError> {
    let body = resolve_block(&stmt.body, ctx)?;
    let targets = [stmt.index.clone()];
    let body = eliminate_extrema(body, &targets, ctx)?;

    let own_atoms: Vec<Atom> = stmt.bounds.iter().cloned().map(Atom::Rel).collect();
    let range = reduce_index_range(&stmt.index, &own_atoms)?;
    if let Some(atom) = range.remaining.first() {
        return Err(TransformError::ForeignInequality {
            index: stmt.index.to_string(),
            inequality: atom.to_string(),
        });
    }

    let mut out = Vec::new();
    for statement in body.0 {
        match statement {
            ResolvedStatement::Increment(inc) => {
                out.extend(summation(&inc, &stmt.index, &range.start, &range.end, &[], ctx)?.0);
            }
            ResolvedStatement::If(inner) => {
                let mut atoms = own_atoms.clone();
                atoms.extend(inner.guard.atoms().iter().cloned());
                let merged = reduce_index_range(&stmt.index, &atoms)?;
                for inc in &inner.body {
                    out.extend(
                        summation(
                            inc,
                            &stmt.index,
                            &merged.start,
                            &merged.end,
                            &merged.remaining,
                            ctx,
                        )?
                        .0,
                    );
                }
            }
        }
    }
    Ok(ResolvedBlock(out))
}

/// `increment` summed over `[start, end)`, guarded by `start < end` and the
/// non-index conditions.
fn summation(
    increment: &Increment,
    index: &Symbol,
    start: &Expr,
    end: &Expr,
    additional: &[Atom],
    ctx: &Context,
) -> Result<ResolvedBlock, TransformError> {
    let total = closed_sum(&increment.amount, index, start, end)?;
    let mut parts = vec![Cond::rel(Rel::new(RelOp::Lt, start.clone(), end.clone()))];
    parts.extend(additional.iter().cloned().map(Cond::Atom));
    from_condition(
        Cond::and(parts),
        vec![Increment::new(increment.target.clone(), total)],
        ctx.options,
    )
}

/// Normalize a condition over a group of increments, handling the
/// degenerate cases: `true` emits the group unguarded, `false` (or an
/// empty group) emits nothing.
pub(crate) fn from_condition(
    cond: Cond,
    body: Vec<Increment>,
    options: &Options,
) -> Result<ResolvedBlock, TransformError> {
    if body.is_empty() {
        return Ok(ResolvedBlock::default());
    }
    let cond = if options.simplify_condition {
        cond.simplify()
    } else {
        cond
    };
    match guard_form(&cond)? {
        GuardForm::Const(true) => Ok(ResolvedBlock(
            body.into_iter().map(ResolvedStatement::Increment).collect(),
        )),
        GuardForm::Const(false) => Ok(ResolvedBlock::default()),
        GuardForm::Guard(guard) => Ok(ResolvedBlock(vec![ResolvedStatement::If(ResolvedIf {
            guard,
            body,
        })])),
    }
}

/// Conjoin an outer condition onto a guarded group, re-normalizing through
/// `from_condition`.
fn conjugate(
    inner: &ResolvedIf,
    outer: &Cond,
    options: &Options,
) -> Result<ResolvedBlock, TransformError> {
    let cond = Cond::and(vec![inner.guard.to_cond(), outer.clone()]);
    from_condition(cond, inner.body.clone(), options)
}

/// Split every statement of a block over the target symbols' extrema.
fn eliminate_extrema(
    block: ResolvedBlock,
    targets: &[Symbol],
    ctx: &mut Context,
) -> Result<ResolvedBlock, TransformError> {
    let mut out = Vec::new();
    for statement in block.0 {
        match statement {
            ResolvedStatement::Increment(inc) => {
                out.extend(eliminate_increment(&inc, targets, &Cond::True, ctx)?.0);
            }
            ResolvedStatement::If(inner) => {
                out.extend(eliminate_resolved_if(&inner, targets, ctx)?.0);
            }
        }
    }
    Ok(ResolvedBlock(out))
}

/// Case-split an increment's amount; each case becomes a guarded increment
/// under its side conditions conjoined with `extra`.
fn eliminate_increment(
    increment: &Increment,
    targets: &[Symbol],
    extra: &Cond,
    ctx: &mut Context,
) -> Result<ResolvedBlock, TransformError> {
    let cases = ctx.splitter.split_expr(&increment.amount, targets);
    let mut out = Vec::new();
    for (rels, amount) in cases {
        let mut parts: Vec<Cond> = rels.into_iter().map(Cond::rel).collect();
        parts.push(extra.clone());
        let cond = Cond::and(parts).simplify();
        out.extend(
            from_condition(
                cond,
                vec![Increment::new(increment.target.clone(), amount)],
                ctx.options,
            )?
            .0,
        );
    }
    Ok(ResolvedBlock(out))
}

/// Case-split a guarded group: first the guard, then each increment under
/// the rewritten guard.
fn eliminate_resolved_if(
    inner: &ResolvedIf,
    targets: &[Symbol],
    ctx: &mut Context,
) -> Result<ResolvedBlock, TransformError> {
    let cases = ctx.splitter.split_cond(&inner.guard.to_cond(), targets);
    let mut out = Vec::new();
    for (rels, rewritten) in cases {
        let mut parts: Vec<Cond> = rels.into_iter().map(Cond::rel).collect();
        parts.push(rewritten);
        let combined = Cond::and(parts);
        for inc in &inner.body {
            out.extend(eliminate_increment(inc, targets, &combined, ctx)?.0);
        }
    }
    Ok(ResolvedBlock(out))
}

/// Split any `max`/`min` still present after every loop is gone, targeting
/// the symbols under the extremum nodes.
fn split_residual(block: ResolvedBlock, ctx: &mut Context) -> Result<ResolvedBlock, TransformError> {
    let mut out = Vec::new();
    for statement in block.0 {
        let targets = residual_targets(&statement);
        if targets.is_empty() {
            out.push(statement);
            continue;
        }
        match statement {
            ResolvedStatement::Increment(inc) => {
                out.extend(eliminate_increment(&inc, &targets, &Cond::True, ctx)?.0);
            }
            ResolvedStatement::If(inner) => {
                out.extend(eliminate_resolved_if(&inner, &targets, ctx)?.0);
            }
        }
    }
    Ok(ResolvedBlock(out))
}

fn residual_targets(statement: &ResolvedStatement) -> Vec<Symbol> {
    let mut symbols = BTreeSet::new();
    match statement {
        ResolvedStatement::Increment(inc) => collect_extremum_symbols(&inc.amount, &mut symbols),
        ResolvedStatement::If(inner) => {
            for atom in inner.guard.atoms() {
                if let Atom::Rel(rel) = atom {
                    collect_extremum_symbols(&rel.lhs, &mut symbols);
                    collect_extremum_symbols(&rel.rhs, &mut symbols);
                }
            }
            for inc in &inner.body {
                collect_extremum_symbols(&inc.amount, &mut symbols);
            }
        }
    }
    symbols.into_iter().collect()
}

fn collect_extremum_symbols(expr: &Expr, out: &mut BTreeSet<Symbol>) {
    if matches!(expr, Expr::Max(_) | Expr::Min(_)) {
        expr.free_symbols(out);
    }
    for child in expr.children() {
        collect_extremum_symbols(child, out);
    }
}

/// Merge sibling statements: bare increments on the same accumulator sum
/// their amounts; guarded groups with definitely-equal guards concatenate.
/// Bare increments are emitted before guarded groups, as resolution orders
/// them.
fn merge_siblings(block: ResolvedBlock, options: &Options) -> ResolvedBlock {
    let mut increments: Vec<Increment> = Vec::new();
    let mut ifs: Vec<ResolvedIf> = Vec::new();
    for statement in block.0 {
        match statement {
            ResolvedStatement::Increment(inc) => increments.push(inc),
            ResolvedStatement::If(inner) => ifs.push(inner),
        }
    }

    if options.conjoin_sibling_ifs {
        let mut kept: Vec<ResolvedIf> = Vec::new();
        for candidate in ifs {
            let existing = kept
                .iter()
                .position(|k| k.guard.definitely_equal(&candidate.guard) == Some(true));
            match existing {
                Some(i) => kept[i].body.extend(candidate.body),
                None => kept.push(candidate),
            }
        }
        ifs = kept;
    }

    if options.merge_sibling_increments {
        increments = merge_increments(increments);
    }

    let mut out: Vec<ResolvedStatement> = increments
        .into_iter()
        .map(ResolvedStatement::Increment)
        .collect();
    for mut group in ifs {
        if options.merge_sibling_increments {
            group.body = merge_increments(group.body);
        }
        out.push(ResolvedStatement::If(group));
    }
    ResolvedBlock(out)
}

fn merge_increments(increments: Vec<Increment>) -> Vec<Increment> {
    let mut merged: Vec<(Symbol, Vec<Expr>)> = Vec::new();
    for inc in increments {
        match merged.iter().position(|(target, _)| *target == inc.target) {
            Some(i) => merged[i].1.push(inc.amount),
            None => merged.push((inc.target, vec![inc.amount])),
        }
    }
    merged
        .into_iter()
        .map(|(target, terms)| Increment::new(target, Expr::add(terms)))
        .collect()
}
