// ABOUTME: Canonical integer-symbolic expression algebra used across the pipeline

use crate::error::TransformError;
use crate::rat::{lcm, Rat};
use crate::symbol::Symbol;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// An immutable symbolic expression over integers, symbols, `+`, `*`,
/// `max` and `min`.
///
/// Expressions are canonical on construction: sums and products are
/// flattened n-ary nodes with folded numeric parts and combined like terms,
/// children are kept in a deterministic structural order, and `max`/`min`
/// arguments are deduplicated. Structural equality therefore doubles as the
/// engine's definite-equality decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expr {
    Integer(i64),
    /// Reduced rational with denominator > 1; only produced by summation
    /// coefficients, never by user input
    Rational(i64, i64),
    Symbol(Symbol),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Max(Vec<Expr>),
    Min(Vec<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Integer(n)
    }

    pub fn rat(r: Rat) -> Expr {
        if r.is_integer() {
            Expr::Integer(r.num())
        } else {
            Expr::Rational(r.num(), r.den())
        }
    }

    pub fn sym(name: impl Into<Symbol>) -> Expr {
        Expr::Symbol(name.into())
    }

    /// Canonical n-ary sum: flattens, folds numerics, combines like terms.
    pub fn add(terms: Vec<Expr>) -> Expr {
        let mut acc = MonomialAcc::new();
        for term in terms {
            acc.add_expr(term);
        }
        acc.build()
    }

    pub fn add2(a: Expr, b: Expr) -> Expr {
        Expr::add(vec![a, b])
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::add(vec![a, b.neg()])
    }

    pub fn neg(&self) -> Expr {
        Expr::mul(vec![Expr::int(-1), self.clone()])
    }

    /// Canonical n-ary product: flattens, folds the numeric coefficient,
    /// short-circuits on zero.
    pub fn mul(factors: Vec<Expr>) -> Expr {
        let mut coeff = Rat::ONE;
        let mut rest = Vec::new();
        if !collect_factors(factors, &mut coeff, &mut rest) {
            return Expr::int(0);
        }
        build_term(coeff, rest)
    }

    pub fn max_of(args: Vec<Expr>) -> Expr {
        Expr::extremum(args, true)
    }

    pub fn min_of(args: Vec<Expr>) -> Expr {
        Expr::extremum(args, false)
    }

    fn extremum(args: Vec<Expr>, is_max: bool) -> Expr {
        let mut out: Vec<Expr> = Vec::new();
        let mut numeric: Option<Rat> = None;
        let mut stack = args;
        stack.reverse();
        while let Some(arg) = stack.pop() {
            match arg {
                Expr::Max(inner) if is_max => stack.extend(inner.into_iter().rev()),
                Expr::Min(inner) if !is_max => stack.extend(inner.into_iter().rev()),
                Expr::Integer(n) => {
                    numeric = Some(fold_extremum(numeric, Rat::int(n), is_max));
                }
                Expr::Rational(n, d) => {
                    numeric = Some(fold_extremum(numeric, Rat::new(n, d), is_max));
                }
                other => out.push(other),
            }
        }
        if let Some(r) = numeric {
            out.push(Expr::rat(r));
        }
        out.sort();
        out.dedup();
        match out.len() {
            0 => Expr::int(0),
            1 => out.into_iter().next().unwrap_or(Expr::Integer(0)),
            _ => {
                if is_max {
                    Expr::Max(out)
                } else {
                    Expr::Min(out)
                }
            }
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Expr::Integer(_) | Expr::Rational(_, _))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_rat(&self) -> Option<Rat> {
        match self {
            Expr::Integer(n) => Some(Rat::int(*n)),
            Expr::Rational(n, d) => Some(Rat::new(*n, *d)),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Add(cs) | Expr::Mul(cs) | Expr::Max(cs) | Expr::Min(cs) => cs,
            _ => &[],
        }
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        match self {
            Expr::Symbol(s) => s == symbol,
            _ => self.children().iter().any(|c| c.contains(symbol)),
        }
    }

    pub fn contains_any(&self, symbols: &[Symbol]) -> bool {
        symbols.iter().any(|s| self.contains(s))
    }

    pub fn free_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Symbol(s) => {
                out.insert(s.clone());
            }
            _ => {
                for c in self.children() {
                    c.free_symbols(out);
                }
            }
        }
    }

    /// Replace symbols by expressions, rebuilding through the canonical
    /// constructors.
    pub fn subs(&self, map: &HashMap<Symbol, Expr>) -> Expr {
        match self {
            Expr::Symbol(s) => match map.get(s) {
                Some(replacement) => replacement.clone(),
                None => self.clone(),
            },
            Expr::Integer(_) | Expr::Rational(_, _) => self.clone(),
            Expr::Add(cs) => Expr::add(cs.iter().map(|c| c.subs(map)).collect()),
            Expr::Mul(cs) => Expr::mul(cs.iter().map(|c| c.subs(map)).collect()),
            Expr::Max(cs) => Expr::max_of(cs.iter().map(|c| c.subs(map)).collect()),
            Expr::Min(cs) => Expr::min_of(cs.iter().map(|c| c.subs(map)).collect()),
        }
    }

    /// Distribute products over sums, yielding the fully expanded form.
    /// `max`/`min` nodes stay opaque.
    pub fn expand(&self) -> Expr {
        Expr::from_monomials(self.monomials())
    }

    /// Expanded monomial view: a list of `(coefficient, factors)` pairs
    /// where every factor is a symbol or an opaque `max`/`min` node.
    pub(crate) fn monomials(&self) -> Vec<(Rat, Vec<Expr>)> {
        match self {
            Expr::Integer(n) => vec![(Rat::int(*n), Vec::new())],
            Expr::Rational(n, d) => vec![(Rat::new(*n, *d), Vec::new())],
            Expr::Symbol(_) | Expr::Max(_) | Expr::Min(_) => {
                vec![(Rat::ONE, vec![self.clone()])]
            }
            Expr::Add(cs) => cs.iter().flat_map(|c| c.monomials()).collect(),
            Expr::Mul(cs) => {
                let mut product: Vec<(Rat, Vec<Expr>)> = vec![(Rat::ONE, Vec::new())];
                for c in cs {
                    product = multiply_monomials(&product, &c.monomials());
                }
                product
            }
        }
    }

    /// Rebuild an expression from monomials, combining like terms.
    pub(crate) fn from_monomials(monomials: Vec<(Rat, Vec<Expr>)>) -> Expr {
        let mut acc = MonomialAcc::new();
        for (coeff, factors) in monomials {
            acc.push(coeff, factors);
        }
        acc.build()
    }

    /// Expanded monomials with like terms combined.
    pub(crate) fn combined_monomials(&self) -> Vec<(Rat, Vec<Expr>)> {
        let mut acc = MonomialAcc::new();
        for (coeff, factors) in self.monomials() {
            acc.push(coeff, factors);
        }
        acc.into_terms()
    }

    /// Evaluate to an integer under the given assignment.
    pub fn eval(&self, env: &HashMap<Symbol, i64>) -> Result<i64, TransformError> {
        let (num, den) = self.eval_rat(env)?;
        if num % den != 0 {
            return Err(TransformError::eval(format!(
                "'{}' is not an integer under the given assignment",
                self
            )));
        }
        i64::try_from(num / den)
            .map_err(|_| TransformError::eval(format!("'{}' overflows 64-bit integers", self)))
    }

    fn eval_rat(&self, env: &HashMap<Symbol, i64>) -> Result<(i128, i128), TransformError> {
        match self {
            Expr::Integer(n) => Ok((*n as i128, 1)),
            Expr::Rational(n, d) => Ok((*n as i128, *d as i128)),
            Expr::Symbol(s) => env
                .get(s)
                .map(|v| (*v as i128, 1))
                .ok_or_else(|| TransformError::eval(format!("unbound symbol '{}'", s))),
            Expr::Add(cs) => {
                let mut acc = (0i128, 1i128);
                for c in cs {
                    let (n, d) = c.eval_rat(env)?;
                    acc = reduce_pair(acc.0 * d + n * acc.1, acc.1 * d);
                }
                Ok(acc)
            }
            Expr::Mul(cs) => {
                let mut acc = (1i128, 1i128);
                for c in cs {
                    let (n, d) = c.eval_rat(env)?;
                    acc = reduce_pair(acc.0 * n, acc.1 * d);
                }
                Ok(acc)
            }
            Expr::Max(cs) | Expr::Min(cs) => {
                let is_max = matches!(self, Expr::Max(_));
                let mut best: Option<(i128, i128)> = None;
                for c in cs {
                    let v = c.eval_rat(env)?;
                    best = Some(match best {
                        None => v,
                        Some(b) => {
                            let keep_new = if is_max {
                                v.0 * b.1 > b.0 * v.1
                            } else {
                                v.0 * b.1 < b.0 * v.1
                            };
                            if keep_new {
                                v
                            } else {
                                b
                            }
                        }
                    });
                }
                best.ok_or_else(|| TransformError::eval("empty max/min".to_string()))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::emit::python_expr(self))
    }
}

fn fold_extremum(current: Option<Rat>, candidate: Rat, is_max: bool) -> Rat {
    match current {
        None => candidate,
        Some(r) => {
            if (is_max && candidate > r) || (!is_max && candidate < r) {
                candidate
            } else {
                r
            }
        }
    }
}

fn reduce_pair(num: i128, den: i128) -> (i128, i128) {
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let mut a = num.unsigned_abs();
    let mut b = den.unsigned_abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    if a == 0 {
        return (0, 1);
    }
    (num / a as i128, den / a as i128)
}

/// Split an expression into numeric coefficient and non-numeric factors
/// without distributing.
fn coeff_split(e: Expr) -> (Rat, Vec<Expr>) {
    match e {
        Expr::Integer(n) => (Rat::int(n), Vec::new()),
        Expr::Rational(n, d) => (Rat::new(n, d), Vec::new()),
        Expr::Mul(cs) => {
            let mut coeff = Rat::ONE;
            let mut factors = Vec::new();
            for c in cs {
                match c {
                    Expr::Integer(n) => coeff = coeff.mul(Rat::int(n)),
                    Expr::Rational(n, d) => coeff = coeff.mul(Rat::new(n, d)),
                    other => factors.push(other),
                }
            }
            (coeff, factors)
        }
        other => (Rat::ONE, vec![other]),
    }
}

/// Flatten nested products into (coefficient, factors); false means the
/// product is identically zero.
fn collect_factors(factors: Vec<Expr>, coeff: &mut Rat, rest: &mut Vec<Expr>) -> bool {
    for f in factors {
        match f {
            Expr::Mul(inner) => {
                if !collect_factors(inner, coeff, rest) {
                    return false;
                }
            }
            Expr::Integer(n) => {
                if n == 0 {
                    return false;
                }
                *coeff = coeff.mul(Rat::int(n));
            }
            Expr::Rational(n, d) => *coeff = coeff.mul(Rat::new(n, d)),
            other => rest.push(other),
        }
    }
    true
}

fn build_term(coeff: Rat, mut factors: Vec<Expr>) -> Expr {
    if coeff.is_zero() {
        return Expr::int(0);
    }
    if factors.is_empty() {
        return Expr::rat(coeff);
    }
    if coeff.is_one() && factors.len() == 1 {
        return factors.remove(0);
    }
    let mut children = factors;
    if !coeff.is_one() {
        children.push(Expr::rat(coeff));
    }
    children.sort();
    if children.len() == 1 {
        return children.remove(0);
    }
    Expr::Mul(children)
}

/// Accumulates like terms keyed by their sorted factor list.
struct MonomialAcc {
    order: Vec<Vec<Expr>>,
    coeffs: HashMap<Vec<Expr>, Rat>,
}

impl MonomialAcc {
    fn new() -> Self {
        MonomialAcc {
            order: Vec::new(),
            coeffs: HashMap::new(),
        }
    }

    fn add_expr(&mut self, e: Expr) {
        match e {
            Expr::Add(cs) => {
                for c in cs {
                    self.add_expr(c);
                }
            }
            other => {
                let (coeff, factors) = coeff_split(other);
                self.push(coeff, factors);
            }
        }
    }

    fn push(&mut self, coeff: Rat, mut factors: Vec<Expr>) {
        factors.sort();
        match self.coeffs.entry(factors) {
            Entry::Occupied(mut slot) => {
                let sum = slot.get().add(coeff);
                *slot.get_mut() = sum;
            }
            Entry::Vacant(slot) => {
                self.order.push(slot.key().clone());
                slot.insert(coeff);
            }
        }
    }

    fn into_terms(self) -> Vec<(Rat, Vec<Expr>)> {
        let coeffs = self.coeffs;
        self.order
            .into_iter()
            .filter_map(|factors| {
                let coeff = coeffs.get(&factors).copied()?;
                if coeff.is_zero() {
                    None
                } else {
                    Some((coeff, factors))
                }
            })
            .collect()
    }

    fn build(self) -> Expr {
        let mut terms: Vec<Expr> = self
            .into_terms()
            .into_iter()
            .map(|(coeff, factors)| build_term(coeff, factors))
            .collect();
        match terms.len() {
            0 => Expr::int(0),
            1 => terms.remove(0),
            _ => {
                terms.sort();
                Expr::Add(terms)
            }
        }
    }
}

pub(crate) fn multiply_monomials(
    a: &[(Rat, Vec<Expr>)],
    b: &[(Rat, Vec<Expr>)],
) -> Vec<(Rat, Vec<Expr>)> {
    let mut out = Vec::with_capacity(a.len() * b.len());
    for (ca, fa) in a {
        for (cb, fb) in b {
            let mut factors = fa.clone();
            factors.extend(fb.iter().cloned());
            out.push((ca.mul(*cb), factors));
        }
    }
    out
}

/// Clear denominators: returns the expression scaled so that every
/// coefficient is an integer, wrapped as `(1/D) * numerator` when the
/// common denominator `D` exceeds one.
pub(crate) fn with_cleared_denominators(terms: Vec<(Rat, Vec<Expr>)>) -> Expr {
    let mut denom = 1i64;
    for (coeff, _) in &terms {
        denom = lcm(denom, coeff.den());
    }
    if denom <= 1 {
        return Expr::from_monomials(terms);
    }
    let scaled: Vec<(Rat, Vec<Expr>)> = terms
        .into_iter()
        .map(|(coeff, factors)| (coeff.scale(denom), factors))
        .collect();
    let numerator = Expr::from_monomials(scaled);
    Expr::mul(vec![Expr::rat(Rat::new(1, denom)), numerator])
}
