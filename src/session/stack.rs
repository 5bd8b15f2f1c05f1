//! Operand stack
//!
//! Per-connection LIFO stack of string values with integer arithmetic.

use crate::error::{Result, TallyError};
use crate::protocol::ArithOp;

/// Operand stack owned by a single session
#[derive(Debug, Default, Clone)]
pub struct OperandStack {
    values: Vec<String>,
}

impl OperandStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a value
    pub fn push(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    /// Remove and return the top value
    pub fn pop(&mut self) -> Result<String> {
        self.values.pop().ok_or(TallyError::StackEmpty)
    }

    /// Peek at the top value
    pub fn top(&self) -> Result<&str> {
        self.values
            .last()
            .map(String::as_str)
            .ok_or(TallyError::StackEmpty)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values from bottom to top
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Pop two integers, apply `op`, push the result
    ///
    /// The entry below the top is the left-hand operand, so `a b SUB`
    /// computes `a - b`. The stack is untouched when there are fewer than two
    /// entries or either one is not an integer. Once both parse, both are
    /// consumed even if the operation itself fails (division by zero,
    /// overflow).
    pub fn apply(&mut self, op: ArithOp) -> Result<()> {
        let depth = self.values.len();
        if depth < 2 {
            return Err(TallyError::InsufficientOperands);
        }

        let right = parse_operand(&self.values[depth - 1])?;
        let left = parse_operand(&self.values[depth - 2])?;
        self.values.truncate(depth - 2);

        let result = match op {
            ArithOp::Add => left.checked_add(right),
            ArithOp::Sub => left.checked_sub(right),
            ArithOp::Mul => left.checked_mul(right),
            ArithOp::Div => {
                if right == 0 {
                    return Err(TallyError::DivisionByZero);
                }
                left.checked_div(right)
            }
        }
        .ok_or(TallyError::Overflow)?;

        self.values.push(result.to_string());
        Ok(())
    }
}

/// Parse a decimal integer operand
fn parse_operand(value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|_| TallyError::NotANumber)
}
