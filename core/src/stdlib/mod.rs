//! Standard block library
//!
//! Built-in blocks organized by category. Each category registers its
//! prototypes through [`register_builtins`].

pub mod control;
pub mod data;
pub mod events;
pub mod looks;
pub mod motion;
pub mod operators;
pub mod procedures;
pub mod sensing;

use crate::block::{Block, BlockRegistry, Input, Shape};
use crate::errors::DefinitionError;
use crate::value::{Value, ValueKind};
use std::time::Duration;

/// Register every built-in block
pub fn register_builtins(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    control::register(registry)?;
    events::register(registry)?;
    operators::register(registry)?;
    data::register(registry)?;
    motion::register(registry)?;
    looks::register(registry)?;
    sensing::register(registry)?;
    procedures::register(registry)?;
    Ok(())
}

/* ===================== Shared helpers ===================== */

/// A named input of `block`, or a null literal when absent
pub(crate) fn input<'b>(block: &'b Block, name: &str) -> &'b Input {
    const NULL: &Input = &Input::Literal(Value::Null);
    block.input(name).unwrap_or(NULL)
}

/// Boolean slot; an empty slot reads as false
pub(crate) fn condition() -> Shape {
    Shape::union([Shape::slot(ValueKind::Boolean), Shape::null()])
}

/// Seconds as a timer duration. Negative and non-finite waits are clamped.
pub(crate) fn seconds(secs: f64) -> Duration {
    const MAX_WAIT: f64 = 60.0 * 60.0 * 24.0 * 365.0;
    if secs.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.clamp(0.0, MAX_WAIT))
}
