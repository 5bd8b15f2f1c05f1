//! Operand Stack Tests

use tallykv::protocol::ArithOp;
use tallykv::session::OperandStack;
use tallykv::TallyError;

fn stack_of(values: &[&str]) -> OperandStack {
    let mut stack = OperandStack::new();
    for value in values {
        stack.push(*value);
    }
    stack
}

#[test]
fn test_push_top_pop() {
    let mut stack = OperandStack::new();
    assert!(stack.is_empty());

    stack.push("a");
    stack.push("b");
    assert_eq!(stack.len(), 2);
    assert_eq!(stack.top().unwrap(), "b");

    assert_eq!(stack.pop().unwrap(), "b");
    assert_eq!(stack.pop().unwrap(), "a");
    assert!(matches!(stack.pop(), Err(TallyError::StackEmpty)));
    assert!(matches!(stack.top(), Err(TallyError::StackEmpty)));
}

#[test]
fn test_arithmetic_operand_order() {
    let mut stack = stack_of(&["10", "3"]);
    stack.apply(ArithOp::Sub).unwrap();
    assert_eq!(stack.values(), ["7"]);

    let mut stack = stack_of(&["10", "3"]);
    stack.apply(ArithOp::Div).unwrap();
    assert_eq!(stack.values(), ["3"]);

    let mut stack = stack_of(&["10", "3"]);
    stack.apply(ArithOp::Add).unwrap();
    assert_eq!(stack.values(), ["13"]);

    let mut stack = stack_of(&["-4", "3"]);
    stack.apply(ArithOp::Mul).unwrap();
    assert_eq!(stack.values(), ["-12"]);
}

#[test]
fn test_division_truncates_toward_zero() {
    let mut stack = stack_of(&["-7", "2"]);
    stack.apply(ArithOp::Div).unwrap();
    assert_eq!(stack.top().unwrap(), "-3");
}

#[test]
fn test_arithmetic_only_touches_top_two() {
    let mut stack = stack_of(&["keep", "1", "2"]);
    stack.apply(ArithOp::Add).unwrap();
    assert_eq!(stack.values(), ["keep", "3"]);
}

#[test]
fn test_insufficient_operands_leaves_stack() {
    let mut stack = stack_of(&["5"]);
    assert!(matches!(
        stack.apply(ArithOp::Add),
        Err(TallyError::InsufficientOperands)
    ));
    assert_eq!(stack.values(), ["5"]);
}

#[test]
fn test_not_a_number_leaves_stack() {
    let mut stack = stack_of(&["5", "abc"]);
    assert!(matches!(stack.apply(ArithOp::Add), Err(TallyError::NotANumber)));
    assert_eq!(stack.values(), ["5", "abc"]);

    let mut stack = stack_of(&["12abc", "5"]);
    assert!(matches!(stack.apply(ArithOp::Mul), Err(TallyError::NotANumber)));
    assert_eq!(stack.len(), 2);
}

#[test]
fn test_division_by_zero_consumes_operands() {
    let mut stack = stack_of(&["10", "0"]);
    assert!(matches!(
        stack.apply(ArithOp::Div),
        Err(TallyError::DivisionByZero)
    ));
    assert!(stack.is_empty());
}

#[test]
fn test_overflow_reported() {
    let max = i64::MAX.to_string();
    let mut stack = stack_of(&[max.as_str(), "1"]);
    assert!(matches!(stack.apply(ArithOp::Add), Err(TallyError::Overflow)));
    assert!(stack.is_empty());

    let min = i64::MIN.to_string();
    let mut stack = stack_of(&[min.as_str(), "-1"]);
    assert!(matches!(stack.apply(ArithOp::Div), Err(TallyError::Overflow)));
}
