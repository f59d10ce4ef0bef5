//! Control blocks
//!
//! Loops are hand-written routines so they can yield at every body boundary.

use super::{condition, input, seconds};
use crate::block::{Block, BlockRegistry, ProtoBlock, Shape};
use crate::engine::{Context, Flow, Routine};
use crate::errors::{DefinitionError, ExecError};
use crate::value::{Value, ValueKind};
use std::sync::Arc;

pub fn register(registry: &mut BlockRegistry) -> Result<(), DefinitionError> {
    registry.register(
        ProtoBlock::builder("control_wait")
            .input("DURATION", Shape::slot(ValueKind::Number))
            .eager(|cx, args| {
                let wait = cx.delay(seconds(args.number("DURATION")));
                Ok(cx.await_value(wait))
            })
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("control_repeat")
            .input("TIMES", Shape::slot(ValueKind::Number))
            .input("SUBSTACK", Shape::substack())
            .routine(|block, _| Ok(Box::new(Repeat::new(block.clone()))))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("control_forever")
            .input("SUBSTACK", Shape::substack())
            .routine(|block, _| Ok(Box::new(Forever::new(block.clone()))))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("control_if")
            .input("CONDITION", condition())
            .input("SUBSTACK", Shape::substack())
            .routine(|block, _| Ok(Box::new(Branch::new(block.clone(), false))))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("control_if_else")
            .input("CONDITION", condition())
            .input("SUBSTACK", Shape::substack())
            .input("SUBSTACK2", Shape::substack())
            .routine(|block, _| Ok(Box::new(Branch::new(block.clone(), true))))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("control_wait_until")
            .input("CONDITION", condition())
            .routine(|block, _| Ok(Box::new(Until::new(block.clone(), false))))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("control_repeat_until")
            .input("CONDITION", condition())
            .input("SUBSTACK", Shape::substack())
            .routine(|block, _| Ok(Box::new(Until::new(block.clone(), true))))
            .build()?,
    )?;

    registry.register(
        ProtoBlock::builder("control_stop")
            .input("STOP_OPTION", Shape::field())
            .eager(|cx, args| match args.string("STOP_OPTION").as_str() {
                "all" => {
                    cx.stop_all();
                    Ok(Flow::Exit)
                }
                "this script" => Ok(Flow::Exit),
                "other scripts in sprite" | "other scripts in stage" => {
                    cx.stop_other_scripts();
                    Ok(Flow::Return(Value::Null))
                }
                other => Err(ExecError::block(
                    "control_stop",
                    format!("unknown stop option `{}`", other),
                )),
            })
            .build()?,
    )?;

    Ok(())
}

/* ===================== repeat ===================== */

#[derive(Debug, Clone, Copy, PartialEq)]
enum RepeatPhase {
    Start,
    Count,
    Body,
    Yield,
}

struct Repeat {
    block: Arc<Block>,
    phase: RepeatPhase,
    remaining: i64,
}

impl Repeat {
    fn new(block: Arc<Block>) -> Self {
        Self {
            block,
            phase: RepeatPhase::Start,
            remaining: 0,
        }
    }
}

impl Routine for Repeat {
    fn resume(&mut self, cx: &mut Context<'_>, resumed: Option<Value>) -> Result<Flow, ExecError> {
        loop {
            match self.phase {
                RepeatPhase::Start => {
                    self.phase = RepeatPhase::Count;
                    return Ok(cx.evaluate(input(&self.block, "TIMES")));
                }
                RepeatPhase::Count => {
                    let times = resumed.as_ref().map(Value::to_number).unwrap_or(0.0);
                    self.remaining = times.round() as i64;
                    self.phase = RepeatPhase::Body;
                }
                RepeatPhase::Body => {
                    if self.remaining <= 0 {
                        return Ok(Flow::Return(Value::Null));
                    }
                    self.remaining -= 1;
                    self.phase = RepeatPhase::Yield;
                    return Ok(cx.evaluate(input(&self.block, "SUBSTACK")));
                }
                RepeatPhase::Yield => {
                    self.phase = RepeatPhase::Body;
                    return Ok(cx.yield_thread());
                }
            }
        }
    }
}

/* ===================== forever ===================== */

struct Forever {
    block: Arc<Block>,
    in_body: bool,
}

impl Forever {
    fn new(block: Arc<Block>) -> Self {
        Self {
            block,
            in_body: false,
        }
    }
}

impl Routine for Forever {
    fn resume(&mut self, cx: &mut Context<'_>, _resumed: Option<Value>) -> Result<Flow, ExecError> {
        self.in_body = !self.in_body;
        if self.in_body {
            Ok(cx.evaluate(input(&self.block, "SUBSTACK")))
        } else {
            Ok(cx.yield_thread())
        }
    }
}

/* ===================== if / if else ===================== */

struct Branch {
    block: Arc<Block>,
    has_else: bool,
    tested: bool,
    entered: bool,
}

impl Branch {
    fn new(block: Arc<Block>, has_else: bool) -> Self {
        Self {
            block,
            has_else,
            tested: false,
            entered: false,
        }
    }
}

impl Routine for Branch {
    fn resume(&mut self, cx: &mut Context<'_>, resumed: Option<Value>) -> Result<Flow, ExecError> {
        if !self.tested {
            self.tested = true;
            return Ok(cx.evaluate(input(&self.block, "CONDITION")));
        }
        if self.entered {
            return Ok(Flow::Return(Value::Null));
        }
        self.entered = true;

        let holds = resumed.as_ref().is_some_and(Value::to_bool);
        match (holds, self.has_else) {
            (true, _) => Ok(cx.evaluate(input(&self.block, "SUBSTACK"))),
            (false, true) => Ok(cx.evaluate(input(&self.block, "SUBSTACK2"))),
            (false, false) => Ok(Flow::Return(Value::Null)),
        }
    }
}

/* ===================== wait until / repeat until ===================== */

#[derive(Debug, Clone, Copy, PartialEq)]
enum UntilPhase {
    Test,
    Check,
    Body,
}

/// Re-tests its condition once per slice. With a body, runs it between tests.
struct Until {
    block: Arc<Block>,
    has_body: bool,
    phase: UntilPhase,
}

impl Until {
    fn new(block: Arc<Block>, has_body: bool) -> Self {
        Self {
            block,
            has_body,
            phase: UntilPhase::Test,
        }
    }
}

impl Routine for Until {
    fn resume(&mut self, cx: &mut Context<'_>, resumed: Option<Value>) -> Result<Flow, ExecError> {
        match self.phase {
            UntilPhase::Test => {
                self.phase = UntilPhase::Check;
                Ok(cx.evaluate(input(&self.block, "CONDITION")))
            }
            UntilPhase::Check => {
                if resumed.as_ref().is_some_and(Value::to_bool) {
                    return Ok(Flow::Return(Value::Null));
                }
                if self.has_body {
                    self.phase = UntilPhase::Body;
                    Ok(cx.evaluate(input(&self.block, "SUBSTACK")))
                } else {
                    self.phase = UntilPhase::Test;
                    Ok(cx.yield_thread())
                }
            }
            UntilPhase::Body => {
                self.phase = UntilPhase::Test;
                Ok(cx.yield_thread())
            }
        }
    }
}
