//! Expression domain — normalization and safe evaluation.
//!
//! The only part of calc-snip with real invariants. Everything here is pure:
//! no I/O, no shared state, no allocation that outlives a call.
//!
//!   - normalize.rs — raw recognizer text → CanonicalExpression
//!   - parser.rs    — CanonicalExpression → ArithmeticNode tree
//!   - eval.rs      — tree walk through a fixed operator dispatch table
//!
//! External code should only use the items re-exported here.

mod ast;
mod eval;
mod normalize;
mod parser;

pub use ast::ArithmeticNode;
pub use eval::{evaluate, EvalError, BINARY_DISPATCH, UNARY_DISPATCH};
pub use normalize::{
    normalize, CanonicalExpression, NormalizationProfile, HANDWRITING, TESSERACT, VISION_LLM,
    WHITELIST,
};
pub use parser::{parse, BINARY_OPERATORS, UNARY_OPERATORS};

/// Outcome of one evaluation: the numeric result or a classified failure.
pub type EvaluationOutcome = Result<f64, EvalError>;

/// Parse and evaluate an expression.
///
/// Total over its input: any string, including the empty string or text
/// that never went through [`normalize`], yields `Ok` or a typed `Err`.
pub fn solve(expression: &str) -> EvaluationOutcome {
    let tree = parse(expression)?;
    let value = evaluate(&tree)?;
    log::debug!("[EXPR] {:?} = {}", expression, value);
    Ok(value)
}

/// Render a result the way the report shows it: integral values drop the
/// fractional part, everything else keeps full precision.
pub fn format_result(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Text typed back into the focused application: the result truncated
/// toward zero.
pub fn injection_text(value: f64) -> String {
    format!("{}", value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_respects_precedence() {
        assert_eq!(solve("2+3*4"), Ok(14.0));
        assert_eq!(solve("(2+3)*4"), Ok(20.0));
    }

    #[test]
    fn solve_reports_division_by_zero() {
        assert_eq!(solve("10/0"), Err(EvalError::DivisionByZero));
        assert_eq!(solve("10/2"), Ok(5.0));
    }

    #[test]
    fn format_drops_integral_fraction() {
        assert_eq!(format_result(5.0), "5");
        assert_eq!(format_result(-2.0), "-2");
        assert_eq!(format_result(2.5), "2.5");
    }

    #[test]
    fn injection_truncates_toward_zero() {
        assert_eq!(injection_text(7.9), "7");
        assert_eq!(injection_text(-7.9), "-7");
        assert_eq!(injection_text(0.25), "0");
    }
}
