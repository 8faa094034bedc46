// ABOUTME: Error types for structural failures in the transformation pipeline

use thiserror::Error;

/// All pipeline errors are structural: the input violates a documented
/// precondition and the current transform is abandoned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Unparseable source text
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Assignment or loop target collides with an active summation index
    #[error("line {line}: cannot assign to summation index '{name}'")]
    AssignToIndex { line: usize, name: String },

    /// A single-assignment constant is assigned a second time
    #[error("line {line}: cannot reassign constant '{name}'")]
    ReassignConstant { line: usize, name: String },

    /// An accumulator is reused as a constant or loop index
    #[error("line {line}: cannot reassign result '{name}'")]
    ReassignResult { line: usize, name: String },

    /// A constant appears on the left of `+=`
    #[error("line {line}: cannot increment constant '{name}'")]
    IncrementConstant { line: usize, name: String },

    /// A condition survived resolution in a shape that is not a conjunction
    /// of atoms
    #[error("condition cannot be used as a guard: {condition}")]
    UnresolvedGuard { condition: String },

    /// A `for` statement carries an inequality independent of its index
    #[error("loop inequality does not mention index '{index}': {inequality}")]
    ForeignInequality { index: String, inequality: String },

    /// The loop index occurs squared, under max/min, or multiplied by
    /// another symbol where a linear occurrence is required
    #[error("index '{index}' occurs non-linearly in '{expression}'")]
    NonLinearIndex { index: String, expression: String },

    /// The loop index carries a coefficient other than 1 or -1
    #[error("index '{index}' has coefficient {coefficient} in '{inequality}'")]
    NonUnitCoefficient {
        index: String,
        coefficient: String,
        inequality: String,
    },

    /// The reduced inequality set leaves the loop domain half-open
    #[error("inequalities leave index '{index}' without {side} bound")]
    UnboundedRange { index: String, side: &'static str },

    /// A summand still mentions the index inside an opaque subexpression
    #[error("cannot sum '{expression}' over '{index}'")]
    UnsupportedSummand { index: String, expression: String },

    /// Integer evaluation failed (unbound symbol, inexact division)
    #[error("cannot evaluate: {message}")]
    Eval { message: String },
}

impl TransformError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        TransformError::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn eval(message: impl Into<String>) -> Self {
        TransformError::Eval {
            message: message.into(),
        }
    }
}
