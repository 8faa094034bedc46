// ABOUTME: Boolean conditions, guards, DNF conversion and disjoint case fan-out

use crate::error::TransformError;
use crate::expr::Expr;
use crate::symbol::Symbol;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ============================================================================
// Relations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl RelOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
            RelOp::Eq => "==",
        }
    }
}

/// A comparison of two expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rel {
    pub op: RelOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

/// Canonical one-sided form of a relation: `diff ⋈ 0` with `⋈` one of
/// `<`, `<=`, `==`. `>`/`>=` flip the difference; equalities are oriented
/// so that `a == b` and `b == a` share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum NormOp {
    Lt0,
    Le0,
    Eq0,
}

impl Rel {
    pub fn new(op: RelOp, lhs: Expr, rhs: Expr) -> Self {
        Rel { op, lhs, rhs }
    }

    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        Rel::new(RelOp::Lt, lhs, rhs)
    }

    pub fn le(lhs: Expr, rhs: Expr) -> Self {
        Rel::new(RelOp::Le, lhs, rhs)
    }

    pub fn mentions(&self, symbol: &Symbol) -> bool {
        self.lhs.contains(symbol) || self.rhs.contains(symbol)
    }

    pub(crate) fn norm(&self) -> (Expr, NormOp) {
        let diff = Expr::sub(self.lhs.clone(), self.rhs.clone()).expand();
        match self.op {
            RelOp::Lt => (diff, NormOp::Lt0),
            RelOp::Le => (diff, NormOp::Le0),
            RelOp::Gt => (diff.neg().expand(), NormOp::Lt0),
            RelOp::Ge => (diff.neg().expand(), NormOp::Le0),
            RelOp::Eq => {
                let neg = diff.neg().expand();
                (diff.min(neg), NormOp::Eq0)
            }
        }
    }

    /// Decide the relation when both sides are numerically comparable.
    pub fn truth(&self) -> Option<bool> {
        let (diff, op) = self.norm();
        let value = diff.as_rat()?;
        Some(match op {
            NormOp::Lt0 => value.is_negative(),
            NormOp::Le0 => value.is_negative() || value.is_zero(),
            NormOp::Eq0 => value.is_zero(),
        })
    }

    /// Logical negation. Stays within the atom vocabulary: a negated
    /// equality becomes the disjunction of the two strict orders.
    pub fn negated(&self) -> Cond {
        match self.op {
            RelOp::Lt => Cond::rel(Rel::new(RelOp::Ge, self.lhs.clone(), self.rhs.clone())),
            RelOp::Le => Cond::rel(Rel::new(RelOp::Gt, self.lhs.clone(), self.rhs.clone())),
            RelOp::Gt => Cond::rel(Rel::new(RelOp::Le, self.lhs.clone(), self.rhs.clone())),
            RelOp::Ge => Cond::rel(Rel::new(RelOp::Lt, self.lhs.clone(), self.rhs.clone())),
            RelOp::Eq => Cond::or(vec![
                Cond::rel(Rel::lt(self.lhs.clone(), self.rhs.clone())),
                Cond::rel(Rel::lt(self.rhs.clone(), self.lhs.clone())),
            ]),
        }
    }

    pub fn subs(&self, map: &HashMap<Symbol, Expr>) -> Rel {
        Rel::new(self.op, self.lhs.subs(map), self.rhs.subs(map))
    }

    pub fn eval(&self, env: &HashMap<Symbol, i64>) -> Result<bool, TransformError> {
        let lhs = self.lhs.eval(env)?;
        let rhs = self.rhs.eval(env)?;
        Ok(match self.op {
            RelOp::Lt => lhs < rhs,
            RelOp::Le => lhs <= rhs,
            RelOp::Gt => lhs > rhs,
            RelOp::Ge => lhs >= rhs,
            RelOp::Eq => lhs == rhs,
        })
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.symbol(), self.rhs)
    }
}

// ============================================================================
// Atoms and guards
// ============================================================================

/// The vocabulary a resolved guard is built from: a relation or a (possibly
/// negated) bare boolean symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom {
    Rel(Rel),
    Flag { name: Symbol, negated: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum NormAtom {
    Rel(Expr, NormOp),
    Flag(Symbol, bool),
}

impl Atom {
    pub fn mentions(&self, symbol: &Symbol) -> bool {
        match self {
            Atom::Rel(rel) => rel.mentions(symbol),
            Atom::Flag { name, .. } => name == symbol,
        }
    }

    pub fn negated(&self) -> Cond {
        match self {
            Atom::Rel(rel) => rel.negated(),
            Atom::Flag { name, negated } => Cond::flag(name.clone(), !*negated),
        }
    }

    pub fn truth(&self) -> Option<bool> {
        match self {
            Atom::Rel(rel) => rel.truth(),
            Atom::Flag { .. } => None,
        }
    }

    pub(crate) fn norm(&self) -> NormAtom {
        match self {
            Atom::Rel(rel) => {
                let (diff, op) = rel.norm();
                NormAtom::Rel(diff, op)
            }
            Atom::Flag { name, negated } => NormAtom::Flag(name.clone(), *negated),
        }
    }

    pub fn eval(&self, env: &HashMap<Symbol, i64>) -> Result<bool, TransformError> {
        match self {
            Atom::Rel(rel) => rel.eval(env),
            Atom::Flag { name, negated } => {
                let value = env
                    .get(name)
                    .ok_or_else(|| TransformError::eval(format!("unbound flag '{}'", name)))?;
                Ok((*value != 0) != *negated)
            }
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Rel(rel) => write!(f, "{}", rel),
            Atom::Flag { name, negated } => {
                if *negated {
                    write!(f, "not {}", name)
                } else {
                    write!(f, "{}", name)
                }
            }
        }
    }
}

/// A non-degenerate conjunction of atoms: the only condition shape a
/// `ResolvedIf` may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guard(Vec<Atom>);

impl Guard {
    pub fn atoms(&self) -> &[Atom] {
        &self.0
    }

    pub fn to_cond(&self) -> Cond {
        Cond::and(self.0.iter().cloned().map(Cond::Atom).collect())
    }

    pub fn mentions(&self, symbol: &Symbol) -> bool {
        self.0.iter().any(|a| a.mentions(symbol))
    }

    pub(crate) fn norm_set(&self) -> BTreeSet<NormAtom> {
        self.0.iter().map(Atom::norm).collect()
    }

    /// Three-valued equality: `Some(true)` when the guards are definitely
    /// equal, `None` when the engine cannot decide. Callers treat `None`
    /// as not-equal.
    pub fn definitely_equal(&self, other: &Guard) -> Option<bool> {
        if self.norm_set() == other.norm_set() {
            Some(true)
        } else {
            None
        }
    }

    pub fn eval(&self, env: &HashMap<Symbol, i64>) -> Result<bool, TransformError> {
        for atom in &self.0 {
            if !atom.eval(env)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::emit::python_cond(&self.to_cond()))
    }
}

/// Result of normalizing a condition into guard shape.
pub enum GuardForm {
    Const(bool),
    Guard(Guard),
}

/// Classify a condition as a guard, a boolean constant, or neither.
pub fn guard_form(cond: &Cond) -> Result<GuardForm, TransformError> {
    match cond {
        Cond::True => Ok(GuardForm::Const(true)),
        Cond::False => Ok(GuardForm::Const(false)),
        Cond::Atom(atom) => Ok(GuardForm::Guard(Guard(vec![atom.clone()]))),
        Cond::And(children) => {
            let mut atoms = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    Cond::Atom(atom) => atoms.push(atom.clone()),
                    _ => {
                        return Err(TransformError::UnresolvedGuard {
                            condition: crate::emit::python_cond(cond),
                        })
                    }
                }
            }
            Ok(GuardForm::Guard(Guard(atoms)))
        }
        Cond::Or(_) => Err(TransformError::UnresolvedGuard {
            condition: crate::emit::python_cond(cond),
        }),
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// A boolean combination of atoms. Negation is pushed onto atoms at
/// construction time, so `And`/`Or` are the only connectives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cond {
    True,
    False,
    Atom(Atom),
    And(Vec<Cond>),
    Or(Vec<Cond>),
}

impl Cond {
    pub fn bool(value: bool) -> Cond {
        if value {
            Cond::True
        } else {
            Cond::False
        }
    }

    /// Atom constructor that folds ground relations to constants.
    pub fn rel(rel: Rel) -> Cond {
        match rel.truth() {
            Some(value) => Cond::bool(value),
            None => Cond::Atom(Atom::Rel(rel)),
        }
    }

    pub fn flag(name: Symbol, negated: bool) -> Cond {
        Cond::Atom(Atom::Flag { name, negated })
    }

    /// Canonical conjunction: flattens, folds constants and ground atoms,
    /// removes duplicates.
    pub fn and(children: Vec<Cond>) -> Cond {
        let mut out: Vec<Cond> = Vec::new();
        let mut seen: BTreeSet<NormAtom> = BTreeSet::new();
        if !Self::collect_and(children, &mut out, &mut seen) {
            return Cond::False;
        }
        match out.len() {
            0 => Cond::True,
            1 => out.remove(0),
            _ => Cond::And(out),
        }
    }

    fn collect_and(children: Vec<Cond>, out: &mut Vec<Cond>, seen: &mut BTreeSet<NormAtom>) -> bool {
        for child in children {
            match child {
                Cond::True => {}
                Cond::False => return false,
                Cond::And(inner) => {
                    if !Self::collect_and(inner, out, seen) {
                        return false;
                    }
                }
                Cond::Atom(atom) => match atom.truth() {
                    Some(false) => return false,
                    Some(true) => {}
                    None => {
                        if seen.insert(atom.norm()) {
                            out.push(Cond::Atom(atom));
                        }
                    }
                },
                other => out.push(other),
            }
        }
        true
    }

    /// Canonical disjunction.
    pub fn or(children: Vec<Cond>) -> Cond {
        let mut out: Vec<Cond> = Vec::new();
        let mut seen: BTreeSet<NormAtom> = BTreeSet::new();
        if !Self::collect_or(children, &mut out, &mut seen) {
            return Cond::True;
        }
        match out.len() {
            0 => Cond::False,
            1 => out.remove(0),
            _ => Cond::Or(out),
        }
    }

    fn collect_or(children: Vec<Cond>, out: &mut Vec<Cond>, seen: &mut BTreeSet<NormAtom>) -> bool {
        for child in children {
            match child {
                Cond::False => {}
                Cond::True => return false,
                Cond::Or(inner) => {
                    if !Self::collect_or(inner, out, seen) {
                        return false;
                    }
                }
                Cond::Atom(atom) => match atom.truth() {
                    Some(true) => return false,
                    Some(false) => {}
                    None => {
                        if seen.insert(atom.norm()) {
                            out.push(Cond::Atom(atom));
                        }
                    }
                },
                other => out.push(other),
            }
        }
        true
    }

    /// Logical negation (De Morgan; negation lands on atoms).
    pub fn negated(&self) -> Cond {
        match self {
            Cond::True => Cond::False,
            Cond::False => Cond::True,
            Cond::Atom(atom) => atom.negated(),
            Cond::And(children) => Cond::or(children.iter().map(Cond::negated).collect()),
            Cond::Or(children) => Cond::and(children.iter().map(Cond::negated).collect()),
        }
    }

    pub fn mentions(&self, symbol: &Symbol) -> bool {
        match self {
            Cond::True | Cond::False => false,
            Cond::Atom(atom) => atom.mentions(symbol),
            Cond::And(children) | Cond::Or(children) => {
                children.iter().any(|c| c.mentions(symbol))
            }
        }
    }

    pub fn subs(&self, map: &HashMap<Symbol, Expr>) -> Cond {
        match self {
            Cond::True | Cond::False => self.clone(),
            Cond::Atom(Atom::Rel(rel)) => Cond::rel(rel.subs(map)),
            Cond::Atom(Atom::Flag { name, negated }) => match map.get(name) {
                Some(Expr::Integer(n)) => Cond::bool((*n != 0) != *negated),
                _ => self.clone(),
            },
            Cond::And(children) => Cond::and(children.iter().map(|c| c.subs(map)).collect()),
            Cond::Or(children) => Cond::or(children.iter().map(|c| c.subs(map)).collect()),
        }
    }

    /// Prune conjunctions: drop subsumed non-strict atoms, detect pairwise
    /// contradictions between linear atoms, collapse to constants where
    /// possible.
    pub fn simplify(&self) -> Cond {
        match self {
            Cond::True | Cond::False => self.clone(),
            Cond::Atom(atom) => match atom.truth() {
                Some(value) => Cond::bool(value),
                None => self.clone(),
            },
            Cond::Or(children) => Cond::or(children.iter().map(Cond::simplify).collect()),
            Cond::And(children) => {
                let simplified: Vec<Cond> = children.iter().map(Cond::simplify).collect();
                match Cond::and(simplified) {
                    Cond::And(parts) => simplify_conjunction(parts),
                    other => other,
                }
            }
        }
    }

    /// Disjunctive normal form. Assumes negation already sits on atoms.
    pub fn to_dnf(&self) -> Cond {
        match self {
            Cond::True | Cond::False | Cond::Atom(_) => self.clone(),
            Cond::Or(children) => Cond::or(children.iter().map(Cond::to_dnf).collect()),
            Cond::And(children) => {
                let mut conjunctions: Vec<Vec<Cond>> = vec![Vec::new()];
                for child in children {
                    match child.to_dnf() {
                        Cond::Or(disjuncts) => {
                            let mut next = Vec::with_capacity(conjunctions.len() * disjuncts.len());
                            for conj in &conjunctions {
                                for d in &disjuncts {
                                    let mut extended = conj.clone();
                                    extended.push(d.clone());
                                    next.push(extended);
                                }
                            }
                            conjunctions = next;
                        }
                        other => {
                            for conj in &mut conjunctions {
                                conj.push(other.clone());
                            }
                        }
                    }
                }
                Cond::or(conjunctions.into_iter().map(Cond::and).collect())
            }
        }
    }

    /// Split a condition into mutually exclusive conjunction cases covering
    /// exactly the same truth set. Atomic and conjunctive conditions pass
    /// through unchanged; a disjunction fans out via the disjoint-products
    /// construction.
    pub fn exclusive_cases(&self, simplify_dnf: bool) -> Result<Vec<Cond>, TransformError> {
        let dnf = match self {
            Cond::True | Cond::False | Cond::Atom(_) => return Ok(vec![self.clone()]),
            other => {
                let dnf = other.to_dnf();
                if simplify_dnf {
                    dnf.simplify()
                } else {
                    dnf
                }
            }
        };
        let disjuncts = match dnf {
            Cond::Or(disjuncts) => disjuncts,
            other => return Ok(vec![other]),
        };

        // Remainders are conjunctions known to exclude every disjunct seen
        // so far; each new disjunct is intersected with all of them.
        let mut remainders: Vec<Vec<Cond>> = vec![Vec::new()];
        let mut cases = Vec::new();
        for disjunct in disjuncts {
            let literals = conjunction_atoms(&disjunct)?;
            for remainder in &remainders {
                let mut parts = remainder.clone();
                parts.extend(literals.iter().cloned().map(Cond::Atom));
                let case = Cond::and(parts).simplify();
                if case != Cond::False {
                    cases.push(case);
                }
            }
            let mut next: Vec<Vec<Cond>> = Vec::new();
            for remainder in remainders {
                let mut prefix = remainder;
                for literal in &literals {
                    match literal.negated() {
                        Cond::Atom(neg) => {
                            push_remainder(&mut next, &prefix, Cond::Atom(neg));
                        }
                        Cond::Or(alternatives) => {
                            for alt in alternatives {
                                push_remainder(&mut next, &prefix, alt);
                            }
                        }
                        Cond::False => {}
                        Cond::True => {
                            push_remainder(&mut next, &prefix, Cond::True);
                        }
                        Cond::And(_) => unreachable!("atom negation is never a conjunction"),
                    }
                    prefix.push(Cond::Atom(literal.clone()));
                }
            }
            remainders = next;
            if remainders.is_empty() {
                break;
            }
        }
        Ok(cases)
    }

    pub fn eval(&self, env: &HashMap<Symbol, i64>) -> Result<bool, TransformError> {
        match self {
            Cond::True => Ok(true),
            Cond::False => Ok(false),
            Cond::Atom(atom) => atom.eval(env),
            Cond::And(children) => {
                for c in children {
                    if !c.eval(env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Cond::Or(children) => {
                for c in children {
                    if c.eval(env)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::emit::python_cond(self))
    }
}

fn push_remainder(next: &mut Vec<Vec<Cond>>, prefix: &[Cond], extra: Cond) {
    let mut remainder = prefix.to_vec();
    if extra != Cond::True {
        remainder.push(extra);
    }
    if Cond::and(remainder.clone()).simplify() != Cond::False {
        next.push(remainder);
    }
}

/// Flatten a conjunction into its atoms; `True` yields the empty list.
fn conjunction_atoms(cond: &Cond) -> Result<Vec<Atom>, TransformError> {
    match cond {
        Cond::True => Ok(Vec::new()),
        Cond::Atom(atom) => Ok(vec![atom.clone()]),
        Cond::And(children) => {
            let mut atoms = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    Cond::Atom(atom) => atoms.push(atom.clone()),
                    _ => {
                        return Err(TransformError::UnresolvedGuard {
                            condition: crate::emit::python_cond(cond),
                        })
                    }
                }
            }
            Ok(atoms)
        }
        _ => Err(TransformError::UnresolvedGuard {
            condition: crate::emit::python_cond(cond),
        }),
    }
}

/// Pairwise pruning over the atoms of a conjunction. `parts` holds the
/// already-flattened, deduplicated children of a `Cond::And`.
fn simplify_conjunction(parts: Vec<Cond>) -> Cond {
    let mut atoms: Vec<(Cond, NormAtom)> = Vec::new();
    let mut others: Vec<Cond> = Vec::new();
    for part in parts {
        match &part {
            Cond::Atom(atom) => {
                let norm = atom.norm();
                atoms.push((part, norm));
            }
            _ => others.push(part),
        }
    }

    let norms: Vec<NormAtom> = atoms.iter().map(|(_, n)| n.clone()).collect();
    for (_, norm) in &atoms {
        if contradicts(norm, &norms) {
            return Cond::False;
        }
    }

    let mut kept: Vec<Cond> = Vec::new();
    for (cond, norm) in &atoms {
        if let NormAtom::Rel(diff, NormOp::Le0) = norm {
            // `d <= 0` is subsumed by a strict `d < 0` companion.
            let strict = NormAtom::Rel(diff.clone(), NormOp::Lt0);
            if norms.contains(&strict) {
                continue;
            }
        }
        kept.push(cond.clone());
    }
    kept.extend(others);
    Cond::and(kept)
}

fn contradicts(atom: &NormAtom, all: &[NormAtom]) -> bool {
    let (diff, op) = match atom {
        NormAtom::Rel(diff, op) => (diff, op),
        NormAtom::Flag(name, negated) => {
            return all.contains(&NormAtom::Flag(name.clone(), !*negated));
        }
    };
    let neg = diff.neg().expand();
    match op {
        // d < 0 contradicts -d < 0, -d <= 0, d == 0 and -d == 0
        NormOp::Lt0 => {
            all.contains(&NormAtom::Rel(neg.clone(), NormOp::Lt0))
                || all.contains(&NormAtom::Rel(neg.clone(), NormOp::Le0))
                || all.contains(&NormAtom::Rel(diff.clone().min(neg.clone()), NormOp::Eq0))
        }
        // d <= 0 contradicts -d < 0 (covered from the other side as well)
        NormOp::Le0 => all.contains(&NormAtom::Rel(neg, NormOp::Lt0)),
        // d == 0 contradicts either strict order on d
        NormOp::Eq0 => {
            all.contains(&NormAtom::Rel(diff.clone(), NormOp::Lt0))
                || all.contains(&NormAtom::Rel(neg, NormOp::Lt0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> Expr {
        Expr::sym(name)
    }

    fn lt(a: Expr, b: Expr) -> Cond {
        Cond::rel(Rel::lt(a, b))
    }

    #[test]
    fn test_ground_relations_fold() {
        assert_eq!(lt(Expr::int(0), Expr::int(3)), Cond::True);
        assert_eq!(lt(Expr::int(3), Expr::int(0)), Cond::False);
        assert_eq!(lt(s("x"), s("x")), Cond::False);
        assert_eq!(
            Cond::rel(Rel::le(s("x"), s("x"))),
            Cond::True
        );
    }

    #[test]
    fn test_and_flattens_and_dedupes() {
        let a = lt(s("a"), s("b"));
        let inner = Cond::and(vec![a.clone(), lt(s("c"), s("d"))]);
        let outer = Cond::and(vec![inner, a.clone()]);
        match outer {
            Cond::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_and_short_circuits_on_false() {
        assert_eq!(Cond::and(vec![Cond::False, lt(s("a"), s("b"))]), Cond::False);
        assert_eq!(Cond::and(vec![Cond::True]), Cond::True);
    }

    #[test]
    fn test_negation_of_equality_is_disjunction() {
        let rel = Rel::new(RelOp::Eq, s("a"), s("b"));
        match rel.negated() {
            Cond::Or(children) => assert_eq!(children.len(), 2),
            other => panic!("expected disjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_simplify_detects_contradiction() {
        // c + 1 < a  and  a <= c + 1  cannot both hold
        let c1 = Expr::add2(s("c"), Expr::int(1));
        let cond = Cond::and(vec![
            lt(c1.clone(), s("a")),
            Cond::rel(Rel::le(s("a"), c1)),
        ]);
        assert_eq!(cond.simplify(), Cond::False);
    }

    #[test]
    fn test_simplify_drops_subsumed_atom() {
        let strict = lt(s("a"), s("b"));
        let loose = Cond::rel(Rel::le(s("a"), s("b")));
        let cond = Cond::and(vec![strict.clone(), loose]);
        assert_eq!(cond.simplify(), strict);
    }

    #[test]
    fn test_dnf_distributes() {
        // (p or q) and r => (p and r) or (q and r)
        let p = Cond::flag(Symbol::new("p"), false);
        let q = Cond::flag(Symbol::new("q"), false);
        let r = Cond::flag(Symbol::new("r"), false);
        let cond = Cond::and(vec![Cond::or(vec![p, q]), r]);
        match cond.to_dnf() {
            Cond::Or(disjuncts) => {
                assert_eq!(disjuncts.len(), 2);
                for d in disjuncts {
                    assert!(matches!(d, Cond::And(_)));
                }
            }
            other => panic!("expected disjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_exclusive_cases_atom_passthrough() {
        let cond = lt(s("a"), s("b"));
        let cases = cond.exclusive_cases(true).unwrap();
        assert_eq!(cases, vec![cond]);
    }

    /// The fan-out of a disjunction must partition its truth set: on every
    /// assignment exactly as many cases hold as the disjunction itself.
    #[test]
    fn test_exclusive_cases_partition() {
        let cond = Cond::or(vec![
            lt(s("a"), s("b")),
            lt(s("b"), s("c")),
        ]);
        let cases = cond.exclusive_cases(true).unwrap();
        assert!(cases.len() >= 2);

        let mut env = HashMap::new();
        for a in -2..=2 {
            for b in -2..=2 {
                for c in -2..=2 {
                    env.insert(Symbol::new("a"), a);
                    env.insert(Symbol::new("b"), b);
                    env.insert(Symbol::new("c"), c);
                    let want = cond.eval(&env).unwrap();
                    let holding = cases
                        .iter()
                        .filter(|case| case.eval(&env).unwrap())
                        .count();
                    assert_eq!(holding, usize::from(want), "a={} b={} c={}", a, b, c);
                }
            }
        }
    }

    /// Conjunction disjuncts fan out disjointly too.
    #[test]
    fn test_exclusive_cases_with_conjunction_disjunct() {
        let conj = Cond::and(vec![lt(s("a"), s("b")), lt(s("c"), s("d"))]);
        let cond = Cond::or(vec![conj, lt(s("e"), s("a"))]);
        let cases = cond.exclusive_cases(true).unwrap();

        let names = ["a", "b", "c", "d", "e"];
        let mut env = HashMap::new();
        for assignment in 0..(1 << names.len()) {
            for (i, name) in names.iter().enumerate() {
                env.insert(Symbol::new(*name), ((assignment >> i) & 1) as i64);
            }
            let want = cond.eval(&env).unwrap();
            let holding = cases.iter().filter(|c| c.eval(&env).unwrap()).count();
            assert_eq!(holding, usize::from(want));
        }
    }

    #[test]
    fn test_guard_form() {
        let cond = Cond::and(vec![lt(s("a"), s("b")), Cond::flag(Symbol::new("p"), false)]);
        match guard_form(&cond).unwrap() {
            GuardForm::Guard(guard) => assert_eq!(guard.atoms().len(), 2),
            GuardForm::Const(_) => panic!("expected guard"),
        }
        assert!(matches!(guard_form(&Cond::True).unwrap(), GuardForm::Const(true)));
        let disj = Cond::or(vec![lt(s("a"), s("b")), lt(s("c"), s("d"))]);
        assert!(guard_form(&disj).is_err());
    }

    #[test]
    fn test_guard_equality_is_order_insensitive() {
        let a = lt(s("a"), s("b"));
        let b = Cond::flag(Symbol::new("p"), false);
        let g1 = match guard_form(&Cond::and(vec![a.clone(), b.clone()])).unwrap() {
            GuardForm::Guard(g) => g,
            _ => unreachable!(),
        };
        let g2 = match guard_form(&Cond::and(vec![b, a])).unwrap() {
            GuardForm::Guard(g) => g,
            _ => unreachable!(),
        };
        assert_eq!(g1.definitely_equal(&g2), Some(true));
    }

    #[test]
    fn test_subs_folds_integer_flag() {
        let mut map = HashMap::new();
        map.insert(Symbol::new("p"), Expr::int(1));
        let cond = Cond::flag(Symbol::new("p"), true);
        assert_eq!(cond.subs(&map), Cond::False);
    }
}
