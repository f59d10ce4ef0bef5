//! Core execution loop
//!
//! [`drive`] runs the routines on a thread's frame stack until the stack is
//! empty or something suspends. Nested evaluation pushes a frame instead of
//! recursing, so the host stack stays flat no matter how deep the program
//! nests or recurses.

use super::awaitable::Awaitable;
use super::context::Context;
use super::routine::{Flow, Routine, StackRoutine};
use crate::block::{Input, Stack};
use crate::errors::ExecError;
use crate::value::Value;

/// How a call to [`drive`] ended
#[derive(Debug)]
pub(crate) enum Slice {
    /// The stack is empty; this is the final value
    Finished(Value),
    /// A voluntary yield outside warp mode
    Yielded,
    /// The top routine is waiting on this
    Awaiting(Awaitable),
    /// The script asked to stop
    Exited,
}

/// The explicit frame stack of one resumable computation
#[derive(Default)]
pub(crate) struct FrameStack {
    frames: Vec<Box<dyn Routine>>,
    /// Value handed to the top frame on its next resume
    resumed: Option<Value>,
}

impl FrameStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A computation that runs `blocks` in order
    pub(crate) fn for_stack(blocks: Stack) -> Self {
        let mut stack = Self::new();
        stack.frames.push(Box::new(StackRoutine::new(blocks)));
        stack
    }

    /// Deliver the value the top frame was waiting for
    pub(crate) fn resume_with(&mut self, value: Value) {
        self.resumed = Some(value);
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.frames.clear();
        self.resumed = None;
    }
}

/// Run until the computation finishes or suspends.
///
/// Yields are swallowed while the context is in warp mode.
pub(crate) fn drive(stack: &mut FrameStack, cx: &mut Context<'_>) -> Result<Slice, ExecError> {
    loop {
        let Some(top) = stack.frames.last_mut() else {
            return Ok(Slice::Finished(stack.resumed.take().unwrap_or_default()));
        };

        let resumed = stack.resumed.take();
        match top.resume(cx, resumed)? {
            Flow::Return(value) => {
                stack.frames.pop();
                if stack.frames.is_empty() {
                    return Ok(Slice::Finished(value));
                }
                stack.resumed = Some(value);
            }

            Flow::Evaluate(input) => match input {
                // Literals never suspend
                Input::Literal(value) => stack.resumed = Some(value),
                Input::Block(block) => {
                    let routine = block.start(cx)?;
                    stack.frames.push(routine);
                }
                Input::Stack(blocks) if blocks.is_empty() => stack.resumed = Some(Value::Null),
                Input::Stack(blocks) => stack.frames.push(Box::new(StackRoutine::new(blocks))),
            },

            Flow::Yield => {
                if cx.warp_depth() > 0 {
                    continue;
                }
                return Ok(Slice::Yielded);
            }

            Flow::Await(awaitable) => return Ok(Slice::Awaiting(awaitable)),

            Flow::Exit => {
                stack.clear();
                return Ok(Slice::Exited);
            }
        }
    }
}

/// Evaluate `input` without suspending. Backs
/// [`Context::evaluate_fast`](super::context::Context::evaluate_fast).
pub(crate) fn run_to_completion(input: &Input, cx: &mut Context<'_>) -> Result<Value, ExecError> {
    let (opcode, mut stack) = match input {
        Input::Literal(value) => return Ok(value.clone()),
        Input::Block(block) => {
            let mut stack = FrameStack::new();
            stack.frames.push(block.start(cx)?);
            (block.opcode().to_string(), stack)
        }
        Input::Stack(blocks) => match blocks.first() {
            None => return Ok(Value::Null),
            Some(first) => (first.opcode().to_string(), FrameStack::for_stack(blocks.clone())),
        },
    };

    let reason = match drive(&mut stack, cx)? {
        Slice::Finished(value) => return Ok(value),
        Slice::Yielded => "yielded during a non-suspending evaluation",
        Slice::Awaiting(_) => "awaited during a non-suspending evaluation",
        Slice::Exited => "stopped its script during a non-suspending evaluation",
    };
    Err(ExecError::ProtocolViolation {
        opcode,
        reason: reason.to_string(),
    })
}
