//! Sensing blocks

use crate::block::{BlockRegistry, ProtoBlock};
use crate::engine::Flow;
use crate::errors::DefinitionError;
use crate::value::{Value, ValueKind};

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    registry.register(
        ProtoBlock::builder("sensing_timer")
            .returns([ValueKind::Number])
            .eager(|cx, _| Ok(Flow::Return(Value::Num(cx.timer_seconds()))))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("sensing_resettimer")
            .eager(|cx, _| {
                cx.reset_timer();
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    Ok(())
}
