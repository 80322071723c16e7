//! Operator vocabulary shared by the AST, the type-level operators and the
//! value-level operators.

pub mod string_literal;

use std::fmt;

/// Operators of a sum chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SumOp {
    Add,
    Subtract,
}

/// Operators of a product chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProductOp {
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShiftOp {
    Left,
    /// Arithmetic (sign-extending) right shift.
    Right,
    /// Logical (zero-filling) right shift.
    UnsignedRight,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RelationalOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl RelationalOp {
    /// True for the operators that need an ordering, not just equality.
    pub fn is_ordering(self) -> bool {
        !matches!(self, RelationalOp::Equal | RelationalOp::NotEqual)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
    BitwiseNot,
}

/// The arithmetic operations the lattice-aware operators implement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl From<SumOp> for ArithmeticOp {
    fn from(op: SumOp) -> Self {
        match op {
            SumOp::Add => ArithmeticOp::Add,
            SumOp::Subtract => ArithmeticOp::Subtract,
        }
    }
}

impl From<ProductOp> for ArithmeticOp {
    fn from(op: ProductOp) -> Self {
        match op {
            ProductOp::Multiply => ArithmeticOp::Multiply,
            ProductOp::Divide => ArithmeticOp::Divide,
            ProductOp::Modulo => ArithmeticOp::Modulo,
        }
    }
}

impl ArithmeticOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::Modulo => "modulo",
        }
    }
}

impl fmt::Display for SumOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SumOp::Add => "+",
            SumOp::Subtract => "-",
        })
    }
}

impl fmt::Display for ProductOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProductOp::Multiply => "*",
            ProductOp::Divide => "/",
            ProductOp::Modulo => "%",
        })
    }
}

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShiftOp::Left => "<<",
            ShiftOp::Right => ">>",
            ShiftOp::UnsignedRight => ">>>",
        })
    }
}

impl fmt::Display for BitwiseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BitwiseOp::And => "&",
            BitwiseOp::Or => "|",
            BitwiseOp::Xor => "#",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        })
    }
}

impl fmt::Display for RelationalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationalOp::Equal => "==",
            RelationalOp::NotEqual => "!=",
            RelationalOp::Less => "<",
            RelationalOp::LessOrEqual => "<=",
            RelationalOp::Greater => ">",
            RelationalOp::GreaterOrEqual => ">=",
        })
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
        })
    }
}
