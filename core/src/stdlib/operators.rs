//! Pure operators

use super::condition;
use crate::block::{BlockRegistry, ProtoBlock, Shape};
use crate::engine::{Args, Flow};
use crate::errors::DefinitionError;
use crate::value::{Value, ValueKind};
use std::cmp::Ordering;

fn binary<F>(
    registry: &mut BlockRegistry,
    opcode: &str,
    (left, right): (&'static str, &'static str),
    shape: Shape,
    returns: ValueKind,
    op: F,
) -> Result<(), DefinitionError>
where
    F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
{
    registry.register(
        ProtoBlock::builder(opcode)
            .input(left, shape.clone())
            .input(right, shape)
            .returns([returns])
            .pure()
            .eager(move |_, args: &Args| Ok(Flow::Return(op(args.value(left), args.value(right)))))
            .build()?,
    )?;
    Ok(())
}

fn unary<F>(
    registry: &mut BlockRegistry,
    opcode: &str,
    name: &'static str,
    shape: Shape,
    returns: ValueKind,
    op: F,
) -> Result<(), DefinitionError>
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    registry.register(
        ProtoBlock::builder(opcode)
            .input(name, shape)
            .returns([returns])
            .pure()
            .eager(move |_, args: &Args| Ok(Flow::Return(op(args.value(name)))))
            .build()?,
    )?;
    Ok(())
}

/// Floored modulo: the result takes the sign of the divisor
pub fn modulo(n: f64, m: f64) -> f64 {
    n - m * (n / m).floor()
}

/// Round half up
pub fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    use ValueKind::{Boolean, Number};
    let num = || Shape::slot(Number);
    const NUMS: (&str, &str) = ("NUM1", "NUM2");
    const OPERANDS: (&str, &str) = ("OPERAND1", "OPERAND2");

    binary(registry, "operator_add", NUMS, num(), Number, |a, b| {
        Value::Num(a.to_number() + b.to_number())
    })?;
    binary(registry, "operator_subtract", NUMS, num(), Number, |a, b| {
        Value::Num(a.to_number() - b.to_number())
    })?;
    binary(registry, "operator_multiply", NUMS, num(), Number, |a, b| {
        Value::Num(a.to_number() * b.to_number())
    })?;
    binary(registry, "operator_divide", NUMS, num(), Number, |a, b| {
        Value::Num(a.to_number() / b.to_number())
    })?;
    binary(registry, "operator_mod", NUMS, num(), Number, |a, b| {
        Value::Num(modulo(a.to_number(), b.to_number()))
    })?;

    binary(registry, "operator_lt", OPERANDS, Shape::any(), Boolean, |a, b| {
        Value::Bool(a.compare(b) == Ordering::Less)
    })?;
    binary(registry, "operator_gt", OPERANDS, Shape::any(), Boolean, |a, b| {
        Value::Bool(a.compare(b) == Ordering::Greater)
    })?;
    binary(registry, "operator_equals", OPERANDS, Shape::any(), Boolean, |a, b| {
        Value::Bool(a.loose_eq(b))
    })?;

    // Both sides are always evaluated
    binary(registry, "operator_and", OPERANDS, condition(), Boolean, |a, b| {
        Value::Bool(a.to_bool() && b.to_bool())
    })?;
    binary(registry, "operator_or", OPERANDS, condition(), Boolean, |a, b| {
        Value::Bool(a.to_bool() || b.to_bool())
    })?;
    unary(registry, "operator_not", "OPERAND", condition(), Boolean, |a| {
        Value::Bool(!a.to_bool())
    })?;

    binary(registry, "operator_join", ("STRING1", "STRING2"), Shape::any(), ValueKind::String, |a, b| {
        Value::Str(format!("{}{}", a, b))
    })?;
    unary(registry, "operator_length", "STRING", Shape::any(), Number, |a| {
        Value::Num(a.to_string().chars().count() as f64)
    })?;
    unary(registry, "operator_round", "NUM", num(), Number, |a| {
        Value::Num(round_half_up(a.to_number()))
    })?;

    Ok(())
}
