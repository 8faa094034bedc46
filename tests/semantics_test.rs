// ABOUTME: Semantics-preservation grids comparing programs with their transforms

mod common;

use common::{check_semantics, check_semantics_with};
use loopfold::Options;

#[test]
fn test_single_loop_constant() {
    check_semantics("for i in range(0, n):\n    r += 1\n", &[("n", -3..=6)]);
}

#[test]
fn test_single_loop_polynomial() {
    check_semantics(
        "for i in range(a, b):\n    r += i*i + 3*i + 2\n",
        &[("a", -3..=3), ("b", -3..=3)],
    );
}

#[test]
fn test_loop_with_guard() {
    check_semantics(
        "for i in range(a, b):\n    if c < i:\n        r += i\n",
        &[("a", -3..=3), ("b", -3..=3), ("c", -3..=3)],
    );
}

#[test]
fn test_loop_with_else_branch() {
    check_semantics(
        "for i in range(0, n):\n    if c < i:\n        r += i\n    else:\n        r2 += 1\n",
        &[("n", -2..=5), ("c", -2..=5)],
    );
}

#[test]
fn test_extremum_upper_bound() {
    check_semantics(
        "for i in range(0, max(m, n)):\n    r += i\n",
        &[("m", -3..=4), ("n", -3..=4)],
    );
}

#[test]
fn test_extremum_lower_bound() {
    check_semantics(
        "for i in range(min(a, b), 4):\n    r += 1\n",
        &[("a", -3..=5), ("b", -3..=5)],
    );
}

#[test]
fn test_extremum_in_increment() {
    check_semantics(
        "for i in range(0, n):\n    r += max(i, c)\n",
        &[("n", -1..=4), ("c", -3..=4)],
    );
}

#[test]
fn test_top_level_extremum_increment() {
    check_semantics("r += max(a, b + 1)\n", &[("a", -3..=3), ("b", -3..=3)]);
}

#[test]
fn test_nested_loops() {
    check_semantics(
        "for i in range(0, n):\n    for j in range(0, i):\n        r += j\n",
        &[("n", -2..=5)],
    );
}

#[test]
fn test_nested_loop_with_outer_index_bound() {
    check_semantics(
        "for i in range(0, n):\n    for j in range(i, n):\n        r += i + j\n",
        &[("n", -1..=5)],
    );
}

#[test]
fn test_nested_loop_with_extremum_bound() {
    check_semantics(
        "for x in range(a, b):\n    for z in range(q, max(4, x)):\n        r += 5\n",
        &[("a", -2..=2), ("b", -2..=3), ("q", -2..=3)],
    );
}

#[test]
fn test_boolean_flags() {
    check_semantics(
        "for i in range(0, n):\n    if p:\n        r += i\n    else:\n        r += 1\n",
        &[("n", -2..=4), ("p", 0..=1)],
    );
}

#[test]
fn test_disjunctive_condition() {
    check_semantics(
        "if a < b or b < c:\n    r += 1\n",
        &[("a", -2..=2), ("b", -2..=2), ("c", -2..=2)],
    );
}

#[test]
fn test_conjunctive_disjunct() {
    check_semantics(
        "if a < b and c < d or e < a:\n    r += 1\n",
        &[
            ("a", -1..=1),
            ("b", -1..=1),
            ("c", -1..=1),
            ("d", -1..=1),
            ("e", -1..=1),
        ],
    );
}

#[test]
fn test_not_equal_condition() {
    check_semantics(
        "for i in range(0, n):\n    if i != c:\n        r += 1\n",
        &[("n", -1..=5), ("c", -2..=5)],
    );
}

#[test]
fn test_equality_condition() {
    check_semantics(
        "for i in range(0, n):\n    if i == c:\n        r += i*i\n",
        &[("n", -1..=5), ("c", -2..=5)],
    );
}

#[test]
fn test_constants_substitute() {
    check_semantics(
        "k = 7\nfor i in range(0, n):\n    r += max(k, i)\n",
        &[("n", -1..=9)],
    );
}

#[test]
fn test_sibling_guarded_groups() {
    check_semantics(
        "for x in range(a, b):\n    if c < x:\n        r += 2\n    if c < x:\n        r += x\n    r += x * 2\n",
        &[("a", -2..=2), ("b", -2..=3), ("c", -2..=2)],
    );
}

#[test]
fn test_sample_program() {
    check_semantics(
        loopfold::config::SAMPLE_PROGRAM,
        &[("a", -2..=2), ("b", -2..=3), ("c", -2..=2), ("p", 0..=1)],
    );
}

#[test]
fn test_option_variants_preserve_semantics() {
    let sources = [
        "for i in range(a, b):\n    if c < i:\n        r += i\n",
        "for i in range(0, max(a, b)):\n    r += 1\n",
        "if a < b or b < c:\n    r += 1\nr += a\n",
    ];
    let variants = [
        Options {
            merge_sibling_increments: false,
            ..Options::default()
        },
        Options {
            conjoin_sibling_ifs: false,
            ..Options::default()
        },
        Options {
            extract_common_subexpressions: false,
            ..Options::default()
        },
        Options {
            split_residual_extrema: false,
            ..Options::default()
        },
        Options {
            simplify_increment_expression: true,
            simplify_condition: true,
            ..Options::default()
        },
        Options {
            simplify_dnf: false,
            ..Options::default()
        },
    ];
    for source in &sources {
        for options in &variants {
            check_semantics_with(
                source,
                &[("a", -2..=2), ("b", -2..=2), ("c", -2..=2)],
                options,
            );
        }
    }
}
