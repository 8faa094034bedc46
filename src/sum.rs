// ABOUTME: Closed-form polynomial summation over a loop index

use crate::error::TransformError;
use crate::expr::{multiply_monomials, with_cleared_denominators, Expr};
use crate::rat::Rat;
use crate::symbol::Symbol;

/// Closed form of `sum(amount for index in [start, end))`.
///
/// The summand must be polynomial in the index: the index may appear only
/// as a bare factor of its monomials. Coefficients may be arbitrary
/// index-free expressions. The result has its denominators cleared so a
/// single trailing division remains, exact under integer semantics.
pub fn closed_sum(
    amount: &Expr,
    index: &Symbol,
    start: &Expr,
    end: &Expr,
) -> Result<Expr, TransformError> {
    // Group the summand by index degree: amount = sum_k coeff_k * index^k.
    let mut by_degree: Vec<Vec<(Rat, Vec<Expr>)>> = Vec::new();
    for (coeff, factors) in amount.combined_monomials() {
        let mut degree = 0usize;
        let mut rest = Vec::new();
        for factor in factors {
            if factor == Expr::Symbol(index.clone()) {
                degree += 1;
            } else if factor.contains(index) {
                return Err(TransformError::UnsupportedSummand {
                    index: index.to_string(),
                    expression: amount.to_string(),
                });
            } else {
                rest.push(factor);
            }
        }
        while by_degree.len() <= degree {
            by_degree.push(Vec::new());
        }
        by_degree[degree].push((coeff, rest));
    }

    // Power tables of the inclusive endpoints hi = end - 1 and lo - 1.
    let hi = Expr::add2(end.clone(), Expr::int(-1)).combined_monomials();
    let lo_prev = Expr::add2(start.clone(), Expr::int(-1)).combined_monomials();
    let top_degree = by_degree.len();
    let mut hi_pows: Vec<Vec<(Rat, Vec<Expr>)>> = vec![vec![(Rat::ONE, Vec::new())]];
    let mut lo_pows: Vec<Vec<(Rat, Vec<Expr>)>> = vec![vec![(Rat::ONE, Vec::new())]];
    for j in 1..=top_degree {
        let next_hi = multiply_monomials(&hi_pows[j - 1], &hi);
        hi_pows.push(next_hi);
        let next_lo = multiply_monomials(&lo_pows[j - 1], &lo_prev);
        lo_pows.push(next_lo);
    }

    // sum_{i=lo}^{hi} i^k = S_k(hi) - S_k(lo - 1), a polynomial identity
    // valid for all integer bounds.
    let mut total: Vec<(Rat, Vec<Expr>)> = Vec::new();
    for (degree, coeff_monomials) in by_degree.iter().enumerate() {
        if coeff_monomials.is_empty() {
            continue;
        }
        let poly = faulhaber(degree);
        let mut span: Vec<(Rat, Vec<Expr>)> = Vec::new();
        for (power, f_coeff) in poly.iter().enumerate() {
            if f_coeff.is_zero() {
                continue;
            }
            for (c, fs) in &hi_pows[power] {
                span.push((c.mul(*f_coeff), fs.clone()));
            }
            for (c, fs) in &lo_pows[power] {
                span.push((c.mul(*f_coeff).neg(), fs.clone()));
            }
        }
        total.extend(multiply_monomials(coeff_monomials, &span));
    }

    Ok(with_cleared_denominators(
        Expr::from_monomials(total).combined_monomials(),
    ))
}

/// Coefficients of `S_k(n) = sum_{j=1}^{n} j^k` as a polynomial in `n`:
/// `S_k(n) = 1/(k+1) * sum_{j=0}^{k} C(k+1, j) B_j n^(k+1-j)` with the
/// Bernoulli convention `B_1 = +1/2`. Index in the returned vector is the
/// power of `n`.
fn faulhaber(k: usize) -> Vec<Rat> {
    let bernoulli = bernoulli_numbers(k);
    let mut out = vec![Rat::ZERO; k + 2];
    let scale = Rat::new(1, (k + 1) as i64);
    for (j, b) in bernoulli.iter().enumerate() {
        if b.is_zero() {
            continue;
        }
        out[k + 1 - j] = binomial(k + 1, j).mul(*b).mul(scale);
    }
    out
}

/// Bernoulli numbers `B_0..=B_n` with `B_1 = +1/2`.
fn bernoulli_numbers(n: usize) -> Vec<Rat> {
    let mut out: Vec<Rat> = Vec::with_capacity(n + 1);
    for m in 0..=n {
        if m == 0 {
            out.push(Rat::ONE);
            continue;
        }
        // B_m = -1/(m+1) * sum_{j<m} C(m+1, j) B_j (minus convention)
        let mut acc = Rat::ZERO;
        for (j, b) in out.iter().enumerate() {
            acc = acc.add(binomial(m + 1, j).mul(*b));
        }
        out.push(acc.div(Rat::int(-((m + 1) as i64))));
    }
    if n >= 1 {
        out[1] = Rat::new(1, 2);
    }
    out
}

fn binomial(n: usize, k: usize) -> Rat {
    let mut value = 1i128;
    for i in 0..k {
        value = value * (n - i) as i128 / (i + 1) as i128;
    }
    Rat::int(value as i64)
}
