//! Event hats and broadcasts

use crate::block::hat::events;
use crate::block::{BlockRegistry, Hat, ProtoBlock, Shape};
use crate::engine::{pending, Flow};
use crate::errors::DefinitionError;
use crate::value::{Value, ValueKind};

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    registry.register(
        ProtoBlock::builder("event_whenflagclicked")
            .hat(Hat::event(events::FLAG).restarting(true))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("event_whenbroadcastreceived")
            .input("BROADCAST_OPTION", Shape::field())
            .hat(
                Hat::event(events::BROADCAST)
                    .restarting(true)
                    .keyed_by("BROADCAST_OPTION"),
            )
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("event_whenkeypressed")
            .input("KEY_OPTION", Shape::field())
            .hat(Hat::event(events::KEY).keyed_by("KEY_OPTION"))
            .build()?,
    )?;

    // Only the project timer is wired up; other menu options never fire
    registry.register(
        ProtoBlock::builder("event_whengreaterthan")
            .input("WHENGREATERTHANMENU", Shape::field())
            .input("VALUE", Shape::slot(ValueKind::Number))
            .returns([ValueKind::Boolean])
            .hat(Hat::edge())
            .eager(|cx, args| {
                let reading = match args.string("WHENGREATERTHANMENU").to_ascii_uppercase().as_str() {
                    "TIMER" => cx.timer_seconds(),
                    _ => 0.0,
                };
                Ok(Flow::Return(Value::Bool(reading > args.number("VALUE"))))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("event_broadcast")
            .input("BROADCAST_INPUT", Shape::slot(ValueKind::String))
            .eager(|cx, args| {
                cx.broadcast(&args.string("BROADCAST_INPUT"), None);
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("event_broadcastandwait")
            .input("BROADCAST_INPUT", Shape::slot(ValueKind::String))
            .eager(|cx, args| {
                let (resolver, done) = pending();
                cx.broadcast(&args.string("BROADCAST_INPUT"), Some(resolver));
                Ok(cx.await_value(done))
            })
            .build()?,
    )?;

    Ok(())
}
