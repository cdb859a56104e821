//! Tree-walking evaluator.
//!
//! The dispatch tables below are the complete set of arithmetic this crate
//! will ever perform. The evaluator looks every operator up again rather
//! than trusting that the parser only produced legal symbols.

use super::ast::ArithmeticNode;

/// Evaluation failure, classified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("unsupported operator: '{0}'")]
    UnsupportedOperator(char),
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("syntax error: {0}")]
    SyntaxError(String),
}

impl EvalError {
    /// Stable name of the failure kind, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::DivisionByZero => "DivisionByZero",
            EvalError::UnsupportedOperator(_) => "UnsupportedOperator",
            EvalError::UnsupportedExpression(_) => "UnsupportedExpression",
            EvalError::SyntaxError(_) => "SyntaxError",
        }
    }
}

pub const BINARY_DISPATCH: &[(char, fn(f64, f64) -> f64)] = &[
    ('+', |a: f64, b: f64| a + b),
    ('-', |a: f64, b: f64| a - b),
    ('*', |a: f64, b: f64| a * b),
    ('/', |a: f64, b: f64| a / b),
];

pub const UNARY_DISPATCH: &[(char, fn(f64) -> f64)] = &[('+', |a: f64| a), ('-', |a: f64| -a)];

fn binary_fn(op: char) -> Option<fn(f64, f64) -> f64> {
    BINARY_DISPATCH
        .iter()
        .find(|(symbol, _)| *symbol == op)
        .map(|(_, f)| *f)
}

fn unary_fn(op: char) -> Option<fn(f64) -> f64> {
    UNARY_DISPATCH
        .iter()
        .find(|(symbol, _)| *symbol == op)
        .map(|(_, f)| *f)
}

/// Results outside the `f64` range are not numbers the user can be given.
fn finite(value: f64, op: char) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::UnsupportedExpression(format!(
            "result of '{}' out of range: {}",
            op, value
        )))
    }
}

/// Reduce a tree to a single value.
///
/// Number literals must be finite: a digit run too long for `f64` parses to
/// infinity, and that literal is rejected as an unsupported expression
/// instead of silently propagating.
pub fn evaluate(node: &ArithmeticNode) -> Result<f64, EvalError> {
    match node {
        ArithmeticNode::Number(value) => {
            if value.is_finite() {
                Ok(*value)
            } else {
                Err(EvalError::UnsupportedExpression(format!(
                    "number literal out of range: {}",
                    value
                )))
            }
        }
        ArithmeticNode::BinaryOp { op, left, right } => {
            let apply = binary_fn(*op).ok_or(EvalError::UnsupportedOperator(*op))?;
            let l = evaluate(left)?;
            let r = evaluate(right)?;
            if *op == '/' && r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            finite(apply(l, r), *op)
        }
        ArithmeticNode::UnaryOp { op, operand } => {
            let apply = unary_fn(*op).ok_or(EvalError::UnsupportedOperator(*op))?;
            let value = evaluate(operand)?;
            finite(apply(value), *op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::{BINARY_OPERATORS, UNARY_OPERATORS};
    use ArithmeticNode::Number;

    #[test]
    fn every_parser_operator_has_a_dispatch_entry() {
        for op in BINARY_OPERATORS {
            assert!(binary_fn(op).is_some(), "binary '{}' missing", op);
        }
        for op in UNARY_OPERATORS {
            assert!(unary_fn(op).is_some(), "unary '{}' missing", op);
        }
    }

    #[test]
    fn dispatch_tables_have_no_extra_symbols() {
        for (symbol, _) in BINARY_DISPATCH {
            assert!(BINARY_OPERATORS.contains(symbol));
        }
        for (symbol, _) in UNARY_DISPATCH {
            assert!(UNARY_OPERATORS.contains(symbol));
        }
    }

    #[test]
    fn unknown_binary_symbol_is_rejected() {
        let node = ArithmeticNode::binary('^', Number(2.0), Number(3.0));
        assert_eq!(evaluate(&node), Err(EvalError::UnsupportedOperator('^')));
    }

    #[test]
    fn unknown_unary_symbol_is_rejected() {
        let node = ArithmeticNode::unary('!', Number(3.0));
        assert_eq!(evaluate(&node), Err(EvalError::UnsupportedOperator('!')));
    }

    #[test]
    fn division_by_negative_zero_is_caught() {
        let node = ArithmeticNode::binary(
            '/',
            Number(1.0),
            ArithmeticNode::unary('-', Number(0.0)),
        );
        assert_eq!(evaluate(&node), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn zero_divided_by_something_is_fine() {
        let node = ArithmeticNode::binary('/', Number(0.0), Number(4.0));
        assert_eq!(evaluate(&node), Ok(0.0));
    }

    #[test]
    fn non_finite_literal_is_unsupported() {
        let node = ArithmeticNode::binary('+', Number(1.0), Number(f64::INFINITY));
        assert!(matches!(
            evaluate(&node),
            Err(EvalError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn overflowing_result_is_unsupported() {
        let node = ArithmeticNode::binary('*', Number(1e300), Number(1e300));
        assert!(matches!(
            evaluate(&node),
            Err(EvalError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn largest_finite_result_is_kept() {
        let node = ArithmeticNode::unary('-', Number(f64::MAX));
        assert_eq!(evaluate(&node), Ok(-f64::MAX));
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(EvalError::DivisionByZero.kind(), "DivisionByZero");
        assert_eq!(EvalError::SyntaxError(String::new()).kind(), "SyntaxError");
    }
}
