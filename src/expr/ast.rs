/// Arithmetic syntax tree.
///
/// Operators are kept as their source symbol so the evaluator can check
/// them against its own dispatch table instead of trusting the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ArithmeticNode {
    Number(f64),
    BinaryOp {
        op: char,
        left: Box<ArithmeticNode>,
        right: Box<ArithmeticNode>,
    },
    UnaryOp {
        op: char,
        operand: Box<ArithmeticNode>,
    },
}

impl ArithmeticNode {
    pub fn binary(op: char, left: ArithmeticNode, right: ArithmeticNode) -> Self {
        ArithmeticNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: char, operand: ArithmeticNode) -> Self {
        ArithmeticNode::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }
}
