//! Variables and lists

use crate::block::{BlockRegistry, ProtoBlock, Shape};
use crate::engine::Flow;
use crate::errors::DefinitionError;
use crate::value::{Value, ValueKind};

/// Resolve a 1-based list index. `last` selects the final item.
fn list_index(index: &Value, len: usize) -> Option<usize> {
    if let Value::Str(s) = index {
        if s.eq_ignore_ascii_case("last") {
            return len.checked_sub(1);
        }
    }
    let n = index.to_number().floor();
    if n < 1.0 || n > len as f64 {
        return None;
    }
    Some(n as usize - 1)
}

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    registry.register(
        ProtoBlock::builder("data_variable")
            .input("VARIABLE", Shape::field())
            .returns([ValueKind::String, ValueKind::Number, ValueKind::Boolean])
            .eager(|cx, args| Ok(Flow::Return(cx.variable(&args.string("VARIABLE"))?)))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("data_setvariableto")
            .input("VARIABLE", Shape::field())
            .input("VALUE", Shape::any())
            .eager(|cx, args| {
                cx.set_variable(&args.string("VARIABLE"), args.value("VALUE").clone())?;
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("data_changevariableby")
            .input("VARIABLE", Shape::field())
            .input("VALUE", Shape::slot(ValueKind::Number))
            .eager(|cx, args| {
                let name = args.string("VARIABLE");
                let current = cx.variable(&name)?.to_number();
                cx.set_variable(&name, Value::Num(current + args.number("VALUE")))?;
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("data_addtolist")
            .input("LIST", Shape::field())
            .input("ITEM", Shape::any())
            .eager(|cx, args| {
                cx.list_mut(&args.string("LIST"))?
                    .push(args.value("ITEM").clone());
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("data_itemoflist")
            .input("LIST", Shape::field())
            .input("INDEX", Shape::slot(ValueKind::Number))
            .returns([ValueKind::String, ValueKind::Number, ValueKind::Boolean])
            .eager(|cx, args| {
                let list = cx.list(&args.string("LIST"))?;
                let item = list_index(args.value("INDEX"), list.len())
                    .and_then(|i| list.get(i).cloned())
                    .unwrap_or_else(|| Value::from(""));
                Ok(Flow::Return(item))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("data_lengthoflist")
            .input("LIST", Shape::field())
            .returns([ValueKind::Number])
            .eager(|cx, args| {
                let len = cx.list(&args.string("LIST"))?.len();
                Ok(Flow::Return(Value::Num(len as f64)))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("data_deletealloflist")
            .input("LIST", Shape::field())
            .eager(|cx, args| {
                cx.list_mut(&args.string("LIST"))?.clear();
                Ok(Flow::Return(Value::Null))
            })
            .build()?,
    )?;

    Ok(())
}
