// ABOUTME: Transform options and constants for the loop eliminator

use serde::{Deserialize, Serialize};

pub const VERSION: &str = "1.0.0";

/// Demo program shown by the CLI when no input file is given.
pub const SAMPLE_PROGRAM: &str = r#"for x in range(a + 1, b + 1):
    if c < x:
        r += 2
    if c < x:
        r += x + 1
        r2 += 2 + x
        if p:
            k = 7
            r += max(k, x + 1)
    else:
        r2 += x * 10
    r += x * 2
"#;

/// Feature switches threaded through the transform entry point.
///
/// The defaults give the fully simplified pipeline; every switch can be
/// loaded from JSON via the CLI's `--options` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Eagerly expand increment expressions before resolution
    pub simplify_increment_expression: bool,
    /// Run the full condition simplifier on every constructed condition
    pub simplify_condition: bool,
    /// Simplify the DNF of an `if` condition before fanning out cases
    pub simplify_dnf: bool,
    /// Merge sibling increments targeting the same accumulator
    pub merge_sibling_increments: bool,
    /// Concatenate sibling guarded groups with definitely-equal guards
    pub conjoin_sibling_ifs: bool,
    /// Case-split `max`/`min` left over once every loop is eliminated
    pub split_residual_extrema: bool,
    /// Run common-subexpression extraction over the final block
    pub extract_common_subexpressions: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            simplify_increment_expression: false,
            simplify_condition: false,
            simplify_dnf: true,
            merge_sibling_increments: true,
            conjoin_sibling_ifs: true,
            split_residual_extrema: true,
            extract_common_subexpressions: true,
        }
    }
}
