//! Per-thread custom block call stack

use crate::block::BlockId;
use crate::value::Value;
use indexmap::IndexMap;

/// One active custom block call
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub procedure: BlockId,
    pub args: IndexMap<String, Value>,
    pub warp: bool,
}

/// Active custom block calls for one thread, innermost last
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    warp_depth: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `procedure` is already being executed by this thread
    pub fn contains(&self, procedure: &BlockId) -> bool {
        self.frames.iter().any(|f| &f.procedure == procedure)
    }

    pub fn push(&mut self, frame: CallFrame) {
        if frame.warp {
            self.warp_depth += 1;
        }
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        let frame = self.frames.pop()?;
        if frame.warp {
            self.warp_depth -= 1;
        }
        Some(frame)
    }

    pub fn top(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of enclosing warp calls. Yields are suppressed while non-zero.
    pub fn warp_depth(&self) -> usize {
        self.warp_depth
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.warp_depth = 0;
    }
}
