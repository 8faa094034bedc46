// ABOUTME: Parser for the imperative input language using nom combinators

use crate::ast::{For, If, Increment, Statement, StatementBlock};
use crate::cond::{Cond, Rel, RelOp};
use crate::error::TransformError;
use crate::expr::Expr;
use crate::symbol::Symbol;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map_res, recognize, verify},
    multi::separated_list1,
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Entry point and statement layout
// ============================================================================

/// Parse a program in the indentation-based surface syntax:
///
/// ```text
/// id = expr            # single-assignment constant
/// id += expr           # accumulator update
/// for id in range(lo, hi):
/// if cond:  /  else:
/// pass
/// ```
///
/// Constants are substituted into every expression at parse time; the three
/// symbol roles (summation index, constant, result) are enforced here with
/// source line numbers.
pub fn parse(source: &str) -> Result<StatementBlock, TransformError> {
    let lines = layout(source)?;
    if lines.is_empty() {
        return Ok(StatementBlock::default());
    }
    if lines[0].indent != 0 {
        return Err(TransformError::parse(lines[0].number, "unexpected indent"));
    }
    let mut pos = 0;
    let mut scope = Scope::default();
    parse_block(&lines, &mut pos, 0, &mut scope)
}

struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

/// Strip comments and blank lines, measure indentation.
fn layout(source: &str) -> Result<Vec<Line<'_>>, TransformError> {
    let mut out = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let content = match raw.find('#') {
            Some(i) => &raw[..i],
            None => raw,
        };
        let content = content.trim_end();
        if content.trim_start().is_empty() {
            continue;
        }
        let mut indent = 0;
        for c in content.chars() {
            match c {
                ' ' => indent += 1,
                '\t' => {
                    return Err(TransformError::parse(
                        number,
                        "tab indentation is not supported",
                    ))
                }
                _ => break,
            }
        }
        out.push(Line {
            number,
            indent,
            text: &content[indent..],
        });
    }
    Ok(out)
}

/// Symbol roles visible at one nesting level. Child blocks work on a copy,
/// so definitions do not leak back out.
#[derive(Clone, Default)]
struct Scope {
    indices: HashSet<Symbol>,
    results: HashSet<Symbol>,
    constants: HashMap<Symbol, Expr>,
}

fn parse_block(
    lines: &[Line],
    pos: &mut usize,
    indent: usize,
    scope: &mut Scope,
) -> Result<StatementBlock, TransformError> {
    let mut block = StatementBlock::default();
    while *pos < lines.len() {
        let line = &lines[*pos];
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(TransformError::parse(line.number, "unexpected indent"));
        }

        if keyword_line(line.text, "pass") {
            *pos += 1;
        } else if starts_keyword(line.text, "for") {
            parse_for_statement(lines, pos, indent, scope, &mut block)?;
        } else if starts_keyword(line.text, "if") {
            parse_if_statement(lines, pos, indent, scope, &mut block)?;
        } else if starts_keyword(line.text, "else") {
            return Err(TransformError::parse(
                line.number,
                "'else' without a matching 'if'",
            ));
        } else {
            parse_assignment_statement(line, scope, &mut block)?;
            *pos += 1;
        }
    }
    Ok(block)
}

fn parse_for_statement(
    lines: &[Line],
    pos: &mut usize,
    indent: usize,
    scope: &mut Scope,
    block: &mut StatementBlock,
) -> Result<(), TransformError> {
    let line = &lines[*pos];
    let (name, args) = finish(line, stmt_for(line.text))?;
    if args.len() != 2 {
        return Err(TransformError::parse(
            line.number,
            "range() must have exactly two arguments",
        ));
    }
    let index = Symbol::new(name);
    check_fresh_binding(scope, line.number, &index)?;

    let mut args = args;
    let hi = args.pop().unwrap_or(Expr::int(0)).subs(&scope.constants);
    let lo = args.pop().unwrap_or(Expr::int(0)).subs(&scope.constants);
    scope.indices.insert(index.clone());

    *pos += 1;
    let body = parse_child_block(lines, pos, indent, line.number, scope)?;
    block.push(Statement::For(For::counting(index, lo, hi, body)?));
    Ok(())
}

fn parse_if_statement(
    lines: &[Line],
    pos: &mut usize,
    indent: usize,
    scope: &mut Scope,
    block: &mut StatementBlock,
) -> Result<(), TransformError> {
    let line = &lines[*pos];
    let condition = finish(line, stmt_if(line.text))?.subs(&scope.constants);
    *pos += 1;
    let body = parse_child_block(lines, pos, indent, line.number, scope)?;
    let stmt = If::new(condition, body);

    // an `else:` at the same level re-attaches as the negated condition
    if *pos < lines.len()
        && lines[*pos].indent == indent
        && keyword_line(lines[*pos].text, "else:")
    {
        let else_line = lines[*pos].number;
        *pos += 1;
        let else_body = parse_child_block(lines, pos, indent, else_line, scope)?;
        let negated = stmt.negated(else_body);
        block.push(Statement::If(stmt));
        block.push(Statement::If(negated));
    } else {
        block.push(Statement::If(stmt));
    }
    Ok(())
}

fn parse_assignment_statement(
    line: &Line,
    scope: &mut Scope,
    block: &mut StatementBlock,
) -> Result<(), TransformError> {
    let (name, is_increment, value) = finish(line, stmt_assign(line.text))?;
    let target = Symbol::new(name);
    let value = value.subs(&scope.constants);

    if scope.indices.contains(&target) {
        return Err(TransformError::AssignToIndex {
            line: line.number,
            name: target.to_string(),
        });
    }
    if is_increment {
        if scope.constants.contains_key(&target) {
            return Err(TransformError::IncrementConstant {
                line: line.number,
                name: target.to_string(),
            });
        }
        scope.results.insert(target.clone());
        block.push(Statement::Increment(Increment::new(target, value)));
    } else {
        if scope.constants.contains_key(&target) {
            return Err(TransformError::ReassignConstant {
                line: line.number,
                name: target.to_string(),
            });
        }
        if scope.results.contains(&target) {
            return Err(TransformError::ReassignResult {
                line: line.number,
                name: target.to_string(),
            });
        }
        scope.constants.insert(target, value);
    }
    Ok(())
}

fn parse_child_block(
    lines: &[Line],
    pos: &mut usize,
    parent_indent: usize,
    header_line: usize,
    scope: &Scope,
) -> Result<StatementBlock, TransformError> {
    if *pos >= lines.len() || lines[*pos].indent <= parent_indent {
        return Err(TransformError::parse(
            header_line,
            "expected an indented block",
        ));
    }
    let child_indent = lines[*pos].indent;
    let mut child_scope = scope.clone();
    parse_block(lines, pos, child_indent, &mut child_scope)
}

fn check_fresh_binding(
    scope: &Scope,
    line: usize,
    name: &Symbol,
) -> Result<(), TransformError> {
    if scope.indices.contains(name) {
        return Err(TransformError::AssignToIndex {
            line,
            name: name.to_string(),
        });
    }
    if scope.constants.contains_key(name) {
        return Err(TransformError::ReassignConstant {
            line,
            name: name.to_string(),
        });
    }
    if scope.results.contains(name) {
        return Err(TransformError::ReassignResult {
            line,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Run a statement parser over a line and require it to consume everything.
fn finish<T>(line: &Line, result: IResult<&str, T>) -> Result<T, TransformError> {
    match result {
        Ok((rest, value)) => {
            if rest.trim().is_empty() {
                Ok(value)
            } else {
                Err(TransformError::parse(
                    line.number,
                    format!("unexpected trailing input: '{}'", rest.trim()),
                ))
            }
        }
        Err(_) => Err(TransformError::parse(
            line.number,
            format!("cannot parse statement: '{}'", line.text),
        )),
    }
}

fn keyword_line(text: &str, keyword: &str) -> bool {
    let body = keyword.strip_suffix(':');
    match body {
        Some(word) => {
            if let Some(rest) = strip_keyword(text, word) {
                let rest = rest.trim_start();
                return rest == ":";
            }
            false
        }
        None => text.trim() == keyword,
    }
}

fn starts_keyword(text: &str, keyword: &str) -> bool {
    strip_keyword(text, keyword).is_some()
}

/// Strip a leading keyword ending at a word boundary.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => None,
        _ => Some(rest),
    }
}

// ============================================================================
// Statement parsers
// ============================================================================

fn stmt_for(input: &str) -> IResult<&str, (String, Vec<Expr>)> {
    let (input, _) = tag("for")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag("in")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag("range")(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, args) = separated_list1(
        delimited(multispace0, char(','), multispace0),
        parse_arith,
    )
    .parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(':')(input)?;
    Ok((input, (name.to_string(), args)))
}

fn stmt_if(input: &str) -> IResult<&str, Cond> {
    let (input, _) = tag("if")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, condition) = parse_cond(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(':')(input)?;
    Ok((input, condition))
}

fn stmt_assign(input: &str) -> IResult<&str, (String, bool, Expr)> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, op) = alt((tag("+="), tag("="))).parse(input)?;
    if op == "=" && input.starts_with('=') {
        // `==` is a comparison, not an assignment
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    let (input, value) = parse_arith(input)?;
    Ok((input, (name.to_string(), op == "+=", value)))
}

// ============================================================================
// Expression parsers
// ============================================================================

fn identifier(input: &str) -> IResult<&str, &str> {
    verify(
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
        |name: &str| {
            !matches!(
                name,
                "and" | "or" | "not" | "True" | "False" | "if" | "else" | "for" | "in"
                    | "pass" | "range" | "max" | "min"
            )
        },
    )
    .parse(input)
}

fn parse_arith(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    let (mut input, first) = parse_term(input)?;
    let mut acc = first;
    loop {
        let (rest, _) = multispace0::<_, nom::error::Error<&str>>(input)?;
        if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('+')(rest) {
            let (rest, term) = parse_term(rest)?;
            acc = Expr::add2(acc, term);
            input = rest;
        } else if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('-')(rest) {
            let (rest, term) = parse_term(rest)?;
            acc = Expr::sub(acc, term);
            input = rest;
        } else {
            break;
        }
    }
    Ok((input, acc))
}

fn parse_term(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    let (mut input, first) = parse_factor(input)?;
    let mut factors = vec![first];
    loop {
        let (rest, _) = multispace0::<_, nom::error::Error<&str>>(input)?;
        match char::<_, nom::error::Error<&str>>('*')(rest) {
            Ok((rest, _)) => {
                let (rest, factor) = parse_factor(rest)?;
                factors.push(factor);
                input = rest;
            }
            Err(_) => break,
        }
    }
    Ok((input, Expr::mul(factors)))
}

fn parse_factor(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('-')(input) {
        let (rest, inner) = parse_factor(rest)?;
        return Ok((rest, inner.neg()));
    }
    alt((parse_int, parse_call, parse_paren, parse_symbol_atom)).parse(input)
}

fn parse_int(input: &str) -> IResult<&str, Expr> {
    map_res(digit1, |digits: &str| digits.parse::<i64>().map(Expr::int)).parse(input)
}

fn parse_call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = alt((tag("max"), tag("min"))).parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, args) = separated_list1(
        delimited(multispace0, char(','), multispace0),
        parse_arith,
    )
    .parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    let built = if name == "max" {
        Expr::max_of(args)
    } else {
        Expr::min_of(args)
    };
    Ok((input, built))
}

fn parse_paren(input: &str) -> IResult<&str, Expr> {
    let (input, _) = char('(')(input)?;
    let (input, inner) = parse_arith(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, inner))
}

fn parse_symbol_atom(input: &str) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;
    Ok((input, Expr::sym(name)))
}

// ============================================================================
// Condition parsers
// ============================================================================

fn parse_cond(input: &str) -> IResult<&str, Cond> {
    let (mut input, first) = parse_and_cond(input)?;
    let mut parts = vec![first];
    loop {
        match keyword_after_space(input, "or") {
            Some(rest) => {
                let (rest, part) = parse_and_cond(rest)?;
                parts.push(part);
                input = rest;
            }
            None => break,
        }
    }
    Ok((input, Cond::or(parts)))
}

fn parse_and_cond(input: &str) -> IResult<&str, Cond> {
    let (mut input, first) = parse_not_cond(input)?;
    let mut parts = vec![first];
    loop {
        match keyword_after_space(input, "and") {
            Some(rest) => {
                let (rest, part) = parse_not_cond(rest)?;
                parts.push(part);
                input = rest;
            }
            None => break,
        }
    }
    Ok((input, Cond::and(parts)))
}

fn parse_not_cond(input: &str) -> IResult<&str, Cond> {
    let (input, _) = multispace0(input)?;
    if let Some(rest) = strip_keyword(input, "not") {
        let (rest, inner) = parse_not_cond(rest)?;
        return Ok((rest, inner.negated()));
    }
    parse_cond_atom(input)
}

fn parse_cond_atom(input: &str) -> IResult<&str, Cond> {
    let (input, _) = multispace0(input)?;
    if let Some(rest) = strip_keyword(input, "True") {
        return Ok((rest, Cond::True));
    }
    if let Some(rest) = strip_keyword(input, "False") {
        return Ok((rest, Cond::False));
    }
    if let Ok(parsed) = parse_comparison(input) {
        return Ok(parsed);
    }
    if let Ok(parsed) = parse_paren_cond(input) {
        return Ok(parsed);
    }
    let (input, name) = identifier(input)?;
    Ok((input, Cond::flag(Symbol::new(name), false)))
}

fn parse_comparison(input: &str) -> IResult<&str, Cond> {
    let (input, lhs) = parse_arith(input)?;
    let (input, _) = multispace0(input)?;
    let (input, op) = alt((
        tag("<="),
        tag(">="),
        tag("=="),
        tag("!="),
        tag("<"),
        tag(">"),
    ))
    .parse(input)?;
    let (input, rhs) = parse_arith(input)?;
    let condition = match op {
        "<" => Cond::rel(Rel::new(RelOp::Lt, lhs, rhs)),
        "<=" => Cond::rel(Rel::new(RelOp::Le, lhs, rhs)),
        ">" => Cond::rel(Rel::new(RelOp::Gt, lhs, rhs)),
        ">=" => Cond::rel(Rel::new(RelOp::Ge, lhs, rhs)),
        "==" => Cond::rel(Rel::new(RelOp::Eq, lhs, rhs)),
        // `a != b` lowers to the two strict orders, the same closure used
        // for negated equalities
        _ => Cond::or(vec![
            Cond::rel(Rel::lt(lhs.clone(), rhs.clone())),
            Cond::rel(Rel::lt(rhs, lhs)),
        ]),
    };
    Ok((input, condition))
}

fn parse_paren_cond(input: &str) -> IResult<&str, Cond> {
    let (input, _) = char('(')(input)?;
    let (input, inner) = parse_cond(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, inner))
}

/// Match a keyword preceded by optional whitespace and ending at a word
/// boundary; used for the `and`/`or` infix operators.
fn keyword_after_space<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    strip_keyword(input.trim_start(), keyword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cond::Atom;

    fn s(name: &str) -> Expr {
        Expr::sym(name)
    }

    #[test]
    fn test_parse_increment() {
        let block = parse("r += x + 1\n").unwrap();
        assert_eq!(block.len(), 1);
        match &block.0[0] {
            Statement::Increment(inc) => {
                assert_eq!(inc.target, Symbol::new("r"));
                assert_eq!(inc.amount, Expr::add2(s("x"), Expr::int(1)));
            }
            other => panic!("expected increment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_constant_substitution() {
        let block = parse("k = 7\nr += k + 1\n").unwrap();
        assert_eq!(block.len(), 1);
        match &block.0[0] {
            Statement::Increment(inc) => assert_eq!(inc.amount, Expr::int(8)),
            other => panic!("expected increment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chained_constants() {
        let block = parse("a = 2\nb = a * 3\nr += b\n").unwrap();
        match &block.0[0] {
            Statement::Increment(inc) => assert_eq!(inc.amount, Expr::int(6)),
            other => panic!("expected increment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_for_loop() {
        let block = parse("for i in range(0, n):\n    r += 1\n").unwrap();
        assert_eq!(block.len(), 1);
        match &block.0[0] {
            Statement::For(stmt) => {
                assert_eq!(stmt.index, Symbol::new("i"));
                assert_eq!(stmt.bounds.len(), 2);
                assert_eq!(stmt.body.len(), 1);
            }
            other => panic!("expected loop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let source = "if p:\n    r += 1\nelse:\n    r += 2\n";
        let block = parse(source).unwrap();
        assert_eq!(block.len(), 2);
        match (&block.0[0], &block.0[1]) {
            (Statement::If(then_stmt), Statement::If(else_stmt)) => {
                assert_eq!(then_stmt.condition, Cond::flag(Symbol::new("p"), false));
                assert_eq!(else_stmt.condition, Cond::flag(Symbol::new("p"), true));
            }
            other => panic!("expected if/else pair, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_boolean_operators() {
        let block = parse("if a < b and not p or c < d:\n    r += 1\n").unwrap();
        match &block.0[0] {
            Statement::If(stmt) => assert!(matches!(stmt.condition, Cond::Or(_))),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_comparison_operators() {
        for (source, op) in [
            ("if a < b:", RelOp::Lt),
            ("if a <= b:", RelOp::Le),
            ("if a > b:", RelOp::Gt),
            ("if a >= b:", RelOp::Ge),
            ("if a == b:", RelOp::Eq),
        ] {
            let program = format!("{}\n    r += 1\n", source);
            let block = parse(&program).unwrap();
            match &block.0[0] {
                Statement::If(stmt) => match &stmt.condition {
                    Cond::Atom(Atom::Rel(rel)) => assert_eq!(rel.op, op),
                    other => panic!("expected relation for {}, got {:?}", source, other),
                },
                other => panic!("expected if, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_not_equal_lowers_to_disjunction() {
        let block = parse("if a != b:\n    r += 1\n").unwrap();
        match &block.0[0] {
            Statement::If(stmt) => assert!(matches!(stmt.condition, Cond::Or(_))),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_max_min_calls() {
        let block = parse("r += max(a, b + 1) + min(c, 2)\n").unwrap();
        match &block.0[0] {
            Statement::Increment(inc) => {
                assert!(inc.amount.children().iter().any(|c| matches!(c, Expr::Max(_))));
                assert!(inc.amount.children().iter().any(|c| matches!(c, Expr::Min(_))));
            }
            other => panic!("expected increment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_comments_and_blank_lines() {
        let source = "# header\n\nr += 1  # trailing\n\n";
        let block = parse(source).unwrap();
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn test_parse_pass() {
        let block = parse("if p:\n    pass\nr += 1\n").unwrap();
        assert_eq!(block.len(), 2);
        match &block.0[0] {
            Statement::If(stmt) => assert!(stmt.body.is_empty()),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_blocks() {
        let source = "for i in range(0, n):\n    if c < i:\n        r += i\n    r += 1\n";
        let block = parse(source).unwrap();
        match &block.0[0] {
            Statement::For(stmt) => {
                assert_eq!(stmt.body.len(), 2);
                assert!(matches!(stmt.body.0[0], Statement::If(_)));
                assert!(matches!(stmt.body.0[1], Statement::Increment(_)));
            }
            other => panic!("expected loop, got {:?}", other),
        }
    }

    // ===== role errors =====

    #[test]
    fn test_assign_to_index_rejected() {
        let source = "for i in range(0, n):\n    i += 1\n";
        assert!(matches!(
            parse(source),
            Err(TransformError::AssignToIndex { line: 2, .. })
        ));
    }

    #[test]
    fn test_reassign_constant_rejected() {
        let source = "k = 1\nk = 2\n";
        assert!(matches!(
            parse(source),
            Err(TransformError::ReassignConstant { line: 2, .. })
        ));
    }

    #[test]
    fn test_increment_constant_rejected() {
        let source = "k = 1\nk += 2\n";
        assert!(matches!(
            parse(source),
            Err(TransformError::IncrementConstant { line: 2, .. })
        ));
    }

    #[test]
    fn test_result_as_constant_rejected() {
        let source = "r += 1\nr = 2\n";
        assert!(matches!(
            parse(source),
            Err(TransformError::ReassignResult { line: 2, .. })
        ));
    }

    #[test]
    fn test_index_reuse_in_sibling_loops_rejected() {
        let source = "for i in range(0, n):\n    r += 1\nfor i in range(0, n):\n    r += 1\n";
        assert!(matches!(
            parse(source),
            Err(TransformError::AssignToIndex { line: 3, .. })
        ));
    }

    // ===== shape errors =====

    #[test]
    fn test_range_arity_enforced() {
        let source = "for i in range(0, n, 2):\n    r += 1\n";
        match parse(source) {
            Err(TransformError::Parse { line: 1, message }) => {
                assert!(message.contains("two arguments"));
            }
            other => panic!("expected range arity error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_body_rejected() {
        assert!(matches!(
            parse("if p:\n"),
            Err(TransformError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_dangling_else_rejected() {
        assert!(matches!(
            parse("else:\n    r += 1\n"),
            Err(TransformError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_statement_rejected() {
        assert!(matches!(
            parse("r *= 2\n"),
            Err(TransformError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(matches!(
            parse("r += 1 1\n"),
            Err(TransformError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_tab_indentation_rejected() {
        assert!(matches!(
            parse("if p:\n\tr += 1\n"),
            Err(TransformError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_constant_folds_in_condition() {
        let block = parse("p = 1\nif p:\n    r += 1\n").unwrap();
        match &block.0[0] {
            Statement::If(stmt) => assert_eq!(stmt.condition, Cond::True),
            other => panic!("expected if, got {:?}", other),
        }
    }
}
