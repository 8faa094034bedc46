// ABOUTME: Surface printers dumping a CSE block as Python- or C-style source

use crate::cond::{Atom, Cond};
use crate::cse::{CseBlock, CseItem};
use crate::expr::Expr;
use crate::rat::Rat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Python,
    C,
}

/// Styling knobs for the brace-style surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CStyle {
    /// Type prefixed to every assignment
    pub integer_type: String,
    /// Brace even single-statement bodies
    pub force_braces: bool,
    /// Opening brace on the `if` line instead of the next line
    pub brace_on_same_line: bool,
}

impl Default for CStyle {
    fn default() -> Self {
        CStyle {
            integer_type: "long long".to_string(),
            force_braces: false,
            brace_on_same_line: false,
        }
    }
}

/// Dump the block in the dynamic-typing-style surface.
pub fn dump_python(block: &CseBlock) -> String {
    let mut out = String::new();
    for item in block.iter() {
        match item {
            CseItem::Assignment(assignment) => {
                out.push_str(&format!(
                    "{} = {}\n",
                    assignment.target,
                    expr_string(&assignment.value, Surface::Python)
                ));
            }
            CseItem::Increment(increment) => {
                out.push_str(&format!(
                    "{} += {}\n",
                    increment.target,
                    expr_string(&increment.amount, Surface::Python)
                ));
            }
            CseItem::If(group) => {
                out.push_str(&format!(
                    "if {}:\n",
                    cond_string(&group.guard.to_cond(), Surface::Python)
                ));
                for increment in &group.body {
                    out.push_str(&format!(
                        "    {} += {}\n",
                        increment.target,
                        expr_string(&increment.amount, Surface::Python)
                    ));
                }
            }
        }
    }
    out
}

/// Dump the block in the brace-style surface.
pub fn dump_c(block: &CseBlock, style: &CStyle) -> String {
    let mut out = String::new();
    for item in block.iter() {
        match item {
            CseItem::Assignment(assignment) => {
                out.push_str(&format!(
                    "{} {} = {};\n",
                    style.integer_type,
                    assignment.target,
                    expr_string(&assignment.value, Surface::C)
                ));
            }
            CseItem::Increment(increment) => {
                out.push_str(&format!(
                    "{} += {};\n",
                    increment.target,
                    expr_string(&increment.amount, Surface::C)
                ));
            }
            CseItem::If(group) => {
                out.push_str(&format!(
                    "if ({})",
                    cond_string(&group.guard.to_cond(), Surface::C)
                ));
                let braces = group.body.len() != 1 || style.force_braces;
                if braces {
                    out.push_str(if style.brace_on_same_line { " " } else { "\n" });
                    out.push('{');
                }
                out.push('\n');
                for increment in &group.body {
                    out.push_str(&format!(
                        "    {} += {};\n",
                        increment.target,
                        expr_string(&increment.amount, Surface::C)
                    ));
                }
                if braces {
                    out.push_str("}\n");
                }
            }
        }
    }
    out
}

pub(crate) fn python_expr(expr: &Expr) -> String {
    expr_string(expr, Surface::Python)
}

pub(crate) fn python_cond(cond: &Cond) -> String {
    cond_string(cond, Surface::Python)
}

// ============================================================================
// Expression printing
// ============================================================================

// Precedence levels: addition 1, multiplication 2, atoms 3.
fn expr_string(expr: &Expr, surface: Surface) -> String {
    fmt_expr(expr, surface, 0)
}

fn fmt_expr(expr: &Expr, surface: Surface, parent_prec: u8) -> String {
    match expr {
        Expr::Integer(n) => {
            if *n < 0 && parent_prec > 1 {
                format!("({})", n)
            } else {
                n.to_string()
            }
        }
        Expr::Rational(n, d) => {
            let text = format!("{}/{}", n, d);
            if parent_prec > 1 {
                format!("({})", text)
            } else {
                text
            }
        }
        Expr::Symbol(s) => s.to_string(),
        Expr::Add(terms) => {
            let text = fmt_sum(terms, surface);
            if parent_prec > 1 {
                format!("({})", text)
            } else {
                text
            }
        }
        Expr::Mul(_) => {
            let text = fmt_product(expr, surface);
            if parent_prec > 2 {
                format!("({})", text)
            } else {
                text
            }
        }
        Expr::Max(args) => fmt_extremum(args, surface, true),
        Expr::Min(args) => fmt_extremum(args, surface, false),
    }
}

/// Print a sum with subtraction for negative terms: symbolic terms first,
/// the folded numeric term last.
fn fmt_sum(terms: &[Expr], surface: Surface) -> String {
    let (numeric, symbolic): (Vec<&Expr>, Vec<&Expr>) =
        terms.iter().partition(|t| t.is_numeric());
    let (negative, positive): (Vec<&Expr>, Vec<&Expr>) =
        symbolic.into_iter().partition(|t| is_negative_term(t));

    let mut out = String::new();
    for term in positive
        .into_iter()
        .chain(negative)
        .chain(numeric)
    {
        let negative = is_negative_term(term);
        let rendered = if negative {
            fmt_expr(&term.neg(), surface, 2)
        } else {
            fmt_expr(term, surface, 2)
        };
        if out.is_empty() {
            if negative {
                out.push('-');
            }
            out.push_str(&rendered);
        } else {
            out.push_str(if negative { " - " } else { " + " });
            out.push_str(&rendered);
        }
    }
    out
}

fn is_negative_term(term: &Expr) -> bool {
    match term {
        Expr::Integer(n) => *n < 0,
        Expr::Rational(n, _) => *n < 0,
        Expr::Mul(factors) => factors
            .iter()
            .find_map(|f| f.as_rat())
            .map(|r| r.is_negative())
            .unwrap_or(false),
        _ => false,
    }
}

/// Print a product as `coefficient*factors/denominator`; the trailing exact
/// division is how cleared-denominator sums reach the output.
fn fmt_product(expr: &Expr, surface: Surface) -> String {
    let mut coeff = Rat::ONE;
    let mut factors: Vec<&Expr> = Vec::new();
    for child in expr.children() {
        match child.as_rat() {
            Some(r) => coeff = coeff.mul(r),
            None => factors.push(child),
        }
    }

    let mut out = String::new();
    if coeff.num() == -1 && !factors.is_empty() {
        out.push('-');
    } else if coeff.num() != 1 || factors.is_empty() {
        out.push_str(&coeff.num().to_string());
        if !factors.is_empty() {
            out.push('*');
        }
    }
    let rendered: Vec<String> = factors
        .iter()
        .map(|f| fmt_expr(f, surface, 2))
        .collect();
    out.push_str(&rendered.join("*"));
    if coeff.den() != 1 {
        out.push_str(&format!("/{}", coeff.den()));
    }
    out
}

fn fmt_extremum(args: &[Expr], surface: Surface, is_max: bool) -> String {
    let rendered: Vec<String> = args.iter().map(|a| fmt_expr(a, surface, 0)).collect();
    match surface {
        Surface::Python => {
            format!("{}({})", if is_max { "max" } else { "min" }, rendered.join(", "))
        }
        Surface::C => {
            // std::max is binary; fold longer argument lists right to left
            let name = if is_max { "std::max" } else { "std::min" };
            let mut iter = rendered.into_iter().rev();
            let mut acc = iter.next().unwrap_or_default();
            for arg in iter {
                acc = format!("{}({}, {})", name, arg, acc);
            }
            acc
        }
    }
}

// ============================================================================
// Condition printing
// ============================================================================

fn cond_string(cond: &Cond, surface: Surface) -> String {
    fmt_cond(cond, surface, false)
}

fn fmt_cond(cond: &Cond, surface: Surface, parenthesize_or: bool) -> String {
    match cond {
        Cond::True => match surface {
            Surface::Python => "True".to_string(),
            Surface::C => "true".to_string(),
        },
        Cond::False => match surface {
            Surface::Python => "False".to_string(),
            Surface::C => "false".to_string(),
        },
        Cond::Atom(atom) => fmt_atom(atom, surface),
        Cond::And(children) => {
            let joiner = match surface {
                Surface::Python => " and ",
                Surface::C => " && ",
            };
            children
                .iter()
                .map(|c| fmt_cond(c, surface, true))
                .collect::<Vec<_>>()
                .join(joiner)
        }
        Cond::Or(children) => {
            let joiner = match surface {
                Surface::Python => " or ",
                Surface::C => " || ",
            };
            let text = children
                .iter()
                .map(|c| fmt_cond(c, surface, false))
                .collect::<Vec<_>>()
                .join(joiner);
            if parenthesize_or {
                format!("({})", text)
            } else {
                text
            }
        }
    }
}

fn fmt_atom(atom: &Atom, surface: Surface) -> String {
    match atom {
        Atom::Rel(rel) => format!(
            "{} {} {}",
            fmt_expr(&rel.lhs, surface, 0),
            rel.op.symbol(),
            fmt_expr(&rel.rhs, surface, 0)
        ),
        Atom::Flag { name, negated } => match (surface, *negated) {
            (_, false) => name.to_string(),
            (Surface::Python, true) => format!("not {}", name),
            (Surface::C, true) => format!("!{}", name),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Increment;
    use crate::cond::{guard_form, GuardForm, Rel};
    use crate::cse::Assignment;
    use crate::resolve::ResolvedIf;
    use crate::symbol::Symbol;

    fn s(name: &str) -> Expr {
        Expr::sym(name)
    }

    fn guard(cond: Cond) -> crate::cond::Guard {
        match guard_form(&cond).unwrap() {
            GuardForm::Guard(g) => g,
            GuardForm::Const(_) => panic!("expected a guard"),
        }
    }

    #[test]
    fn test_expr_strings() {
        assert_eq!(python_expr(&Expr::int(-3)), "-3");
        assert_eq!(python_expr(&Expr::add2(s("a"), Expr::int(1))), "a + 1");
        assert_eq!(python_expr(&Expr::sub(s("b"), s("a"))), "b - a");
        assert_eq!(
            python_expr(&Expr::mul(vec![Expr::int(2), s("x")])),
            "2*x"
        );
        assert_eq!(python_expr(&s("x").neg()), "-x");
        assert_eq!(
            python_expr(&Expr::mul(vec![
                Expr::int(5),
                Expr::add2(s("x"), Expr::int(1)),
            ])),
            "5*(x + 1)"
        );
        assert_eq!(
            python_expr(&Expr::max_of(vec![s("a"), Expr::add2(s("c"), Expr::int(1))])),
            "max(a, c + 1)"
        );
    }

    #[test]
    fn test_division_rendering() {
        // (n*n - n) / 2
        let e = Expr::mul(vec![
            Expr::rat(Rat::new(1, 2)),
            Expr::add(vec![
                Expr::mul(vec![s("n"), s("n")]),
                Expr::mul(vec![Expr::int(-1), s("n")]),
            ]),
        ]);
        assert_eq!(python_expr(&e), "(n*n - n)/2");
    }

    #[test]
    fn test_c_extremum_rendering() {
        let e = Expr::max_of(vec![s("a"), s("b"), s("c")]);
        assert_eq!(
            expr_string(&e, Surface::C),
            "std::max(a, std::max(b, c))"
        );
    }

    #[test]
    fn test_cond_strings() {
        let cond = Cond::and(vec![
            Cond::rel(Rel::lt(Expr::int(0), s("n"))),
            Cond::flag(Symbol::new("p"), true),
        ]);
        assert_eq!(cond_string(&cond, Surface::Python), "0 < n and not p");
        assert_eq!(cond_string(&cond, Surface::C), "0 < n && !p");
    }

    fn sample_block() -> CseBlock {
        CseBlock(vec![
            CseItem::Assignment(Assignment::new("r", Expr::int(0))),
            CseItem::If(ResolvedIf {
                guard: guard(Cond::rel(Rel::lt(Expr::int(0), s("n")))),
                body: vec![Increment::new("r", s("n"))],
            }),
        ])
    }

    #[test]
    fn test_dump_python() {
        assert_eq!(
            dump_python(&sample_block()),
            "r = 0\nif 0 < n:\n    r += n\n"
        );
    }

    #[test]
    fn test_dump_c_single_statement_unbraced() {
        assert_eq!(
            dump_c(&sample_block(), &CStyle::default()),
            "long long r = 0;\nif (0 < n)\n    r += n;\n"
        );
    }

    #[test]
    fn test_dump_c_forced_braces() {
        let style = CStyle {
            force_braces: true,
            ..CStyle::default()
        };
        assert_eq!(
            dump_c(&sample_block(), &style),
            "long long r = 0;\nif (0 < n)\n{\n    r += n;\n}\n"
        );
    }

    #[test]
    fn test_dump_c_brace_on_same_line() {
        let style = CStyle {
            force_braces: true,
            brace_on_same_line: true,
            ..CStyle::default()
        };
        assert_eq!(
            dump_c(&sample_block(), &style),
            "long long r = 0;\nif (0 < n) {\n    r += n;\n}\n"
        );
    }

    #[test]
    fn test_dump_c_integer_type() {
        let style = CStyle {
            integer_type: "int64_t".to_string(),
            ..CStyle::default()
        };
        assert!(dump_c(&sample_block(), &style).starts_with("int64_t r = 0;"));
    }
}
