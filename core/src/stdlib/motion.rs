//! Motion blocks

use crate::block::{BlockRegistry, ProtoBlock, Shape};
use crate::engine::{Args, Context, Flow};
use crate::errors::{DefinitionError, ExecError};
use crate::scene::Target;
use crate::value::{Value, ValueKind};

/// Register a command that mutates the running target, then redraws if the
/// target is visible
fn command<F>(
    registry: &mut BlockRegistry,
    opcode: &str,
    inputs: &[&str],
    apply: F,
) -> Result<(), DefinitionError>
where
    F: Fn(&mut Target, &Args) + Send + Sync + 'static,
{
    let builder = inputs.iter().fold(ProtoBlock::builder(opcode), |b, name| {
        b.input(*name, Shape::slot(ValueKind::Number))
    });
    registry.register(
        builder
            .eager(move |cx: &mut Context<'_>, args: &Args| -> Result<Flow, ExecError> {
                apply(cx.target_mut(), args);
                if cx.target().visible {
                    cx.request_redraw();
                }
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;
    Ok(())
}

fn reporter<F>(registry: &mut BlockRegistry, opcode: &str, read: F) -> Result<(), DefinitionError>
where
    F: Fn(&Target) -> f64 + Send + Sync + 'static,
{
    registry.register(
        ProtoBlock::builder(opcode)
            .returns([ValueKind::Number])
            .eager(move |cx, _| Ok(Flow::Return(Value::Num(read(cx.target())))))
            .build()?,
    )?;
    Ok(())
}

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    command(registry, "motion_movesteps", &["STEPS"], |t, args| {
        let steps = args.number("STEPS");
        let radians = (90.0 - t.direction()).to_radians();
        t.x += steps * radians.cos();
        t.y += steps * radians.sin();
    })?;
    command(registry, "motion_gotoxy", &["X", "Y"], |t, args| {
        t.x = args.number("X");
        t.y = args.number("Y");
    })?;
    command(registry, "motion_changexby", &["DX"], |t, args| {
        t.x += args.number("DX");
    })?;
    command(registry, "motion_changeyby", &["DY"], |t, args| {
        t.y += args.number("DY");
    })?;
    command(registry, "motion_setx", &["X"], |t, args| {
        t.x = args.number("X");
    })?;
    command(registry, "motion_sety", &["Y"], |t, args| {
        t.y = args.number("Y");
    })?;
    command(registry, "motion_turnright", &["DEGREES"], |t, args| {
        t.set_direction(t.direction() + args.number("DEGREES"));
    })?;
    command(registry, "motion_turnleft", &["DEGREES"], |t, args| {
        t.set_direction(t.direction() - args.number("DEGREES"));
    })?;
    command(registry, "motion_pointindirection", &["DIRECTION"], |t, args| {
        t.set_direction(args.number("DIRECTION"));
    })?;

    reporter(registry, "motion_xposition", |t| t.x)?;
    reporter(registry, "motion_yposition", |t| t.y)?;
    reporter(registry, "motion_direction", |t| t.direction())?;

    Ok(())
}
