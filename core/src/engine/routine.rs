//! Resumable block bodies
//!
//! Every running block is a [`Routine`]: a small state machine that is resumed
//! with at most one value and answers with a [`Flow`] telling the driver what
//! to do next. The driver keeps routines on an explicit frame stack, so deep
//! nesting never grows the host call stack.

use super::awaitable::Awaitable;
use super::context::Context;
use crate::block::{Block, EagerFn, Input, Stack};
use crate::errors::ExecError;
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/* ===================== Flow ===================== */

/// What a routine asks of the driver after one resume
pub enum Flow {
    /// The routine finished with a value; pop it and hand the value to the
    /// routine below.
    Return(Value),
    /// Evaluate this input, then resume the routine with its value.
    /// Literals come straight back without suspending.
    Evaluate(Input),
    /// Cede the rest of this slice. Suppressed while in warp mode.
    Yield,
    /// Park the thread until the awaitable settles, then resume with its value.
    Await(Awaitable),
    /// Stop the whole script.
    Exit,
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Return(v) => write!(f, "Return({:?})", v),
            Flow::Evaluate(input) => write!(f, "Evaluate({:?})", input),
            Flow::Yield => f.write_str("Yield"),
            Flow::Await(_) => f.write_str("Await"),
            Flow::Exit => f.write_str("Exit"),
        }
    }
}

/// A resumable block body
pub trait Routine {
    /// Advance the body. `resumed` carries the value of whatever the previous
    /// [`Flow`] asked for (`None` on first entry and after a yield).
    fn resume(&mut self, cx: &mut Context<'_>, resumed: Option<Value>) -> Result<Flow, ExecError>;
}

/* ===================== Args ===================== */

/// Evaluated inputs handed to an eager body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: IndexMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// The raw value of an input (null when absent)
    pub fn value(&self, name: &str) -> &Value {
        const NULL: &Value = &Value::Null;
        self.values.get(name).unwrap_or(NULL)
    }

    pub fn number(&self, name: &str) -> f64 {
        self.value(name).to_number()
    }

    pub fn string(&self, name: &str) -> String {
        self.value(name).to_string()
    }

    pub fn bool(&self, name: &str) -> bool {
        self.value(name).to_bool()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/* ===================== Eager bodies ===================== */

#[derive(Debug, Clone, Copy, PartialEq)]
enum EagerPhase {
    /// Evaluating inputs in declaration order
    Collect,
    /// Inputs ready; run the body
    Body,
    /// The body asked for something; return whatever comes back
    Finish,
}

/// Evaluates a block's non-stack inputs in order, then runs its body once
pub(crate) struct EagerRoutine {
    block: Arc<Block>,
    body: EagerFn,
    phase: EagerPhase,
    next: usize,
    waiting_on: Option<String>,
    args: Args,
}

impl EagerRoutine {
    pub(crate) fn new(block: Arc<Block>, body: EagerFn) -> Self {
        Self {
            block,
            body,
            phase: EagerPhase::Collect,
            next: 0,
            waiting_on: None,
            args: Args::new(),
        }
    }
}

impl Routine for EagerRoutine {
    fn resume(&mut self, cx: &mut Context<'_>, resumed: Option<Value>) -> Result<Flow, ExecError> {
        loop {
            match self.phase {
                EagerPhase::Collect => {
                    if let Some(name) = self.waiting_on.take() {
                        self.args.insert(name, resumed.clone().unwrap_or_default());
                    }

                    while let Some((name, input)) = self.block.inputs().get_index(self.next) {
                        self.next += 1;
                        match input {
                            Input::Literal(v) => self.args.insert(name.clone(), v.clone()),
                            // Stacks are left to the body
                            Input::Stack(_) => self.args.insert(name.clone(), Value::Null),
                            Input::Block(_) => {
                                self.waiting_on = Some(name.clone());
                                return Ok(Flow::Evaluate(input.clone()));
                            }
                        }
                    }

                    self.phase = EagerPhase::Body;
                }

                EagerPhase::Body => {
                    self.phase = EagerPhase::Finish;
                    return (self.body)(cx, &self.args);
                }

                EagerPhase::Finish => {
                    return Ok(Flow::Return(resumed.unwrap_or_default()));
                }
            }
        }
    }
}

/* ===================== Stacks ===================== */

/// Runs a stack of blocks in sequence, returning the last one's value
pub(crate) struct StackRoutine {
    blocks: Stack,
    next: usize,
}

impl StackRoutine {
    pub(crate) fn new(blocks: Stack) -> Self {
        Self { blocks, next: 0 }
    }
}

impl Routine for StackRoutine {
    fn resume(&mut self, _cx: &mut Context<'_>, resumed: Option<Value>) -> Result<Flow, ExecError> {
        match self.blocks.get(self.next) {
            Some(block) => {
                self.next += 1;
                Ok(Flow::Evaluate(Input::Block(block.clone())))
            }
            None => Ok(Flow::Return(resumed.unwrap_or_default())),
        }
    }
}
