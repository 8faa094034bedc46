// ABOUTME: Shared test helpers - reference interpreter and semantics checks

use loopfold::{
    CseBlock, CseItem, Expr, Options, RelOp, Statement, StatementBlock, Symbol,
};
use std::collections::{BTreeSet, HashMap};

/// Execute a source program directly, loop by loop.
pub fn run_program(block: &StatementBlock, env: &mut HashMap<Symbol, i64>) {
    for statement in block.iter() {
        match statement {
            Statement::Increment(inc) => {
                let amount = inc.amount.eval(env).expect("increment evaluates");
                *env.entry(inc.target.clone()).or_insert(0) += amount;
            }
            Statement::If(stmt) => {
                if stmt.condition.eval(env).expect("condition evaluates") {
                    run_program(&stmt.body, env);
                }
            }
            Statement::For(stmt) => {
                // the parser builds exactly `lo <= index` and `index < hi`
                let index_expr = Expr::Symbol(stmt.index.clone());
                let mut lo = None;
                let mut hi = None;
                for bound in &stmt.bounds {
                    if bound.op == RelOp::Le && bound.rhs == index_expr {
                        lo = Some(bound.lhs.eval(env).expect("lower bound evaluates"));
                    }
                    if bound.op == RelOp::Lt && bound.lhs == index_expr {
                        hi = Some(bound.rhs.eval(env).expect("upper bound evaluates"));
                    }
                }
                let lo = lo.expect("loop has a lower bound");
                let hi = hi.expect("loop has an upper bound");
                for value in lo..hi {
                    env.insert(stmt.index.clone(), value);
                    run_program(&stmt.body, env);
                }
                env.remove(&stmt.index);
            }
        }
    }
}

/// Execute a transformed block sequentially.
pub fn run_cse(block: &CseBlock, env: &mut HashMap<Symbol, i64>) {
    for item in block.iter() {
        match item {
            CseItem::Assignment(assignment) => {
                let value = assignment.value.eval(env).expect("assignment evaluates");
                env.insert(assignment.target.clone(), value);
            }
            CseItem::Increment(increment) => {
                let amount = increment.amount.eval(env).expect("increment evaluates");
                *env.entry(increment.target.clone()).or_insert(0) += amount;
            }
            CseItem::If(group) => {
                if group.guard.eval(env).expect("guard evaluates") {
                    for increment in &group.body {
                        let amount = increment.amount.eval(env).expect("increment evaluates");
                        *env.entry(increment.target.clone()).or_insert(0) += amount;
                    }
                }
            }
        }
    }
}

/// All accumulator symbols of a program.
pub fn accumulators(block: &StatementBlock) -> BTreeSet<Symbol> {
    let mut out = BTreeSet::new();
    collect_accumulators(block, &mut out);
    out
}

fn collect_accumulators(block: &StatementBlock, out: &mut BTreeSet<Symbol>) {
    for statement in block.iter() {
        match statement {
            Statement::Increment(inc) => {
                out.insert(inc.target.clone());
            }
            Statement::If(stmt) => collect_accumulators(&stmt.body, out),
            Statement::For(stmt) => collect_accumulators(&stmt.body, out),
        }
    }
}

/// Semantics preservation over a grid: running the program and its
/// transform under every assignment must agree on all accumulators.
pub fn check_semantics(source: &str, params: &[(&str, std::ops::RangeInclusive<i64>)]) {
    check_semantics_with(source, params, &Options::default());
}

pub fn check_semantics_with(
    source: &str,
    params: &[(&str, std::ops::RangeInclusive<i64>)],
    options: &Options,
) {
    let program = loopfold::parse(source).expect("program parses");
    let folded = loopfold::transform(&program, options).expect("program transforms");
    let outputs = accumulators(&program);

    let values: Vec<Vec<i64>> = params
        .iter()
        .map(|(_, range)| range.clone().collect())
        .collect();
    let mut cursor = vec![0usize; params.len()];
    loop {
        let mut env: HashMap<Symbol, i64> = HashMap::new();
        for (i, (name, _)) in params.iter().enumerate() {
            env.insert(Symbol::new(*name), values[i][cursor[i]]);
        }

        let mut direct = env.clone();
        run_program(&program, &mut direct);
        let mut transformed = env.clone();
        run_cse(&folded, &mut transformed);
        for target in &outputs {
            assert_eq!(
                transformed.get(target).copied().unwrap_or(0),
                direct.get(target).copied().unwrap_or(0),
                "accumulator '{}' diverges under {:?}",
                target,
                env
            );
        }

        // advance the cartesian-product cursor
        let mut carry = true;
        for i in 0..cursor.len() {
            if !carry {
                break;
            }
            cursor[i] += 1;
            if cursor[i] < values[i].len() {
                carry = false;
            } else {
                cursor[i] = 0;
            }
        }
        if carry {
            break;
        }
    }
}
