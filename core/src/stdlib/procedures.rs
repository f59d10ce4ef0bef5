//! Custom block calls and argument reporters

use super::input;
use crate::block::{Block, BlockRegistry, Input, Procedure, ProtoBlock, Shape};
use crate::engine::{Context, Flow, Routine};
use crate::errors::{DefinitionError, ExecError};
use crate::value::{Value, ValueKind};
use indexmap::IndexMap;
use std::sync::Arc;

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    registry.register(
        ProtoBlock::builder("argument_reporter_string_number")
            .input("VALUE", Shape::field())
            .returns([ValueKind::String, ValueKind::Number])
            .eager(|cx, args| {
                let value = cx
                    .argument(&args.string("VALUE"))
                    .cloned()
                    .unwrap_or(Value::Num(0.0));
                Ok(Flow::Return(value))
            })
            .build()?,
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CallPhase {
    /// Evaluating arguments in the caller's frame
    Args,
    /// About to enter; may yield once on recursive re-entry
    Guard,
    Enter,
    /// Body finished; leave the call
    Exit,
}

/// One call of a custom block
pub struct CallRoutine {
    block: Arc<Block>,
    procedure: Arc<Procedure>,
    phase: CallPhase,
    next: usize,
    waiting_on: Option<String>,
    args: IndexMap<String, Value>,
}

impl CallRoutine {
    pub fn new(block: Arc<Block>, procedure: Arc<Procedure>) -> Self {
        Self {
            block,
            procedure,
            phase: CallPhase::Args,
            next: 0,
            waiting_on: None,
            args: IndexMap::new(),
        }
    }
}

impl Routine for CallRoutine {
    fn resume(&mut self, cx: &mut Context<'_>, mut resumed: Option<Value>) -> Result<Flow, ExecError> {
        loop {
            match self.phase {
                CallPhase::Args => {
                    if let Some(name) = self.waiting_on.take() {
                        self.args.insert(name, resumed.take().unwrap_or_default());
                    }
                    while let Some(param) = self.procedure.params().get(self.next) {
                        self.next += 1;
                        match input(&self.block, param) {
                            Input::Literal(v) => {
                                self.args.insert(param.clone(), v.clone());
                            }
                            other => {
                                self.waiting_on = Some(param.clone());
                                return Ok(cx.evaluate(other));
                            }
                        }
                    }
                    self.phase = CallPhase::Guard;
                }

                CallPhase::Guard => {
                    self.phase = CallPhase::Enter;
                    if !self.procedure.is_warp() && cx.calls().contains(self.procedure.id()) {
                        return Ok(cx.yield_thread());
                    }
                }

                CallPhase::Enter => {
                    let body = self
                        .procedure
                        .body()
                        .cloned()
                        .ok_or_else(|| ExecError::MissingBody(self.procedure.signature().to_string()))?;
                    cx.enter_call(
                        self.procedure.id().clone(),
                        std::mem::take(&mut self.args),
                        self.procedure.is_warp(),
                    );
                    self.phase = CallPhase::Exit;
                    return Ok(cx.evaluate(&Input::Stack(body)));
                }

                CallPhase::Exit => {
                    cx.exit_call();
                    return Ok(Flow::Return(Value::Null));
                }
            }
        }
    }
}
