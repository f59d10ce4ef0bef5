//! Looks blocks

use crate::block::{BlockRegistry, ProtoBlock, Shape};
use crate::engine::{Context, Flow};
use crate::errors::{DefinitionError, ExecError};
use crate::value::{Value, ValueKind};

fn redraw_if_visible(cx: &mut Context<'_>) {
    if cx.target().visible {
        cx.request_redraw();
    }
}

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    registry.register(
        ProtoBlock::builder("looks_show")
            .eager(|cx, _| {
                cx.target_mut().visible = true;
                cx.request_redraw();
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("looks_hide")
            .eager(|cx, _| {
                cx.target_mut().visible = false;
                cx.request_redraw();
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    // Names win over numbers; numeric text falls back to a costume number
    registry.register(
        ProtoBlock::builder("looks_switchcostumeto")
            .input("COSTUME", Shape::any())
            .eager(|cx, args| {
                let costume = args.value("COSTUME");
                let target = cx.target_mut();
                match costume {
                    Value::Num(n) => target.set_costume_number(*n),
                    other => {
                        let name = other.to_string();
                        if !target.set_costume_name(&name) {
                            match name.as_str() {
                                "next costume" => target.next_costume(),
                                "previous costume" => {
                                    let count = target.costumes.len() as f64;
                                    target.set_costume_number(target.costume as f64 + count);
                                }
                                _ if other.is_numeric() => target.set_costume_number(other.to_number()),
                                _ => {}
                            }
                        }
                    }
                }
                redraw_if_visible(cx);
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("looks_nextcostume")
            .eager(|cx, _| {
                cx.target_mut().next_costume();
                redraw_if_visible(cx);
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("looks_costumenumbername")
            .input("NUMBER_NAME", Shape::field())
            .returns([ValueKind::Number, ValueKind::String])
            .eager(|cx, args| {
                let target = cx.target();
                match args.string("NUMBER_NAME").as_str() {
                    "number" => Ok(Flow::Return(Value::Num(target.costume as f64 + 1.0))),
                    "name" => Ok(Flow::Return(Value::from(target.costume_name().unwrap_or("")))),
                    other => Err(ExecError::block(
                        "looks_costumenumbername",
                        format!("unknown option `{}`", other),
                    )),
                }
            })
            .build()?,
    )?;

    Ok(())
}
