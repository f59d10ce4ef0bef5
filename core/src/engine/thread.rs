//! Threads
//!
//! A thread is one independently scheduled run of a script. It owns the frame
//! stack of its computation, its custom block call stack and, while parked,
//! the awaitable it is waiting on.

use super::awaitable::{Awaitable, AwaitableStatus};
use super::calls::CallStack;
use super::context::{Context, Services};
use super::exec_loop::{self, FrameStack, Slice};
use crate::errors::ExecError;
use crate::scene::{Scene, Script, TargetId};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Parked,
    Done,
}

/// What a parked thread is waiting on, tagged with the generation that
/// started the wait
struct Pending {
    generation: u64,
    awaitable: Awaitable,
}

pub struct Thread {
    id: ThreadId,
    script: Arc<Script>,
    target: TargetId,
    status: Status,
    generation: u64,
    payload: Option<Value>,
    stack: FrameStack,
    calls: CallStack,
    pending: Option<Pending>,
    result: Option<Value>,
}

impl Thread {
    pub(crate) fn new(
        id: ThreadId,
        script: Arc<Script>,
        target: TargetId,
        payload: Option<Value>,
    ) -> Self {
        let stack = FrameStack::for_stack(script.body());
        Self {
            id,
            script,
            target,
            status: Status::Running,
            generation: 0,
            payload,
            stack,
            calls: CallStack::new(),
            pending: None,
            result: None,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn script(&self) -> &Arc<Script> {
        &self.script
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn warp_depth(&self) -> usize {
        self.calls.warp_depth()
    }

    /// Number of live routine frames
    pub fn frame_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Value the script finished with, once done
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }

    /// Advance one scheduling slice.
    ///
    /// Only running threads move; parked and done threads are left as they
    /// are. A failing block marks the thread done before the error is
    /// returned.
    pub fn step(&mut self, scene: &mut Scene, services: &mut Services) -> Result<Status, ExecError> {
        if self.status != Status::Running {
            return Ok(self.status);
        }
        if scene.target(self.target).is_none() {
            self.finish(None);
            return Err(ExecError::UnknownTarget(self.target.0));
        }

        let mut cx = Context::new(
            scene,
            services,
            self.target,
            &mut self.calls,
            self.payload.as_ref(),
            Some(self.id),
        );

        let slice = match exec_loop::drive(&mut self.stack, &mut cx) {
            Ok(slice) => slice,
            Err(e) => {
                self.finish(None);
                return Err(e);
            }
        };

        match slice {
            Slice::Finished(value) => self.finish(Some(value)),
            Slice::Exited => self.finish(None),
            Slice::Yielded => {}
            Slice::Awaiting(awaitable) => {
                debug!(thread = %self.id, generation = self.generation, "thread parked");
                self.status = Status::Parked;
                self.pending = Some(Pending {
                    generation: self.generation,
                    awaitable,
                });
                // Already-settled awaitables resume without losing a round
                self.poll_pending();
            }
        }
        Ok(self.status)
    }

    /// Check the awaitable of a parked thread and resume it if settled.
    /// Returns true when the thread went back to running.
    pub fn poll_pending(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        match pending.awaitable.poll() {
            AwaitableStatus::Pending | AwaitableStatus::Abandoned => false,
            AwaitableStatus::Settled(value) => {
                let generation = pending.generation;
                self.pending = None;
                self.resolve(generation, value)
            }
        }
    }

    /// Deliver a settled value. Only applied when `generation` matches and the
    /// thread is still parked; anything else is a stale settlement.
    pub fn resolve(&mut self, generation: u64, value: Value) -> bool {
        if generation != self.generation || self.status != Status::Parked {
            warn!(
                thread = %self.id,
                generation,
                current = self.generation,
                status = ?self.status,
                "discarding stale settlement"
            );
            return false;
        }
        debug!(thread = %self.id, generation, "thread resumed");
        self.pending = None;
        self.stack.resume_with(value);
        self.status = Status::Running;
        true
    }

    /// Start over from the top of the script. In-flight state is dropped and
    /// any outstanding wait becomes stale.
    pub fn restart(&mut self, payload: Option<Value>) {
        self.generation += 1;
        debug!(thread = %self.id, generation = self.generation, "thread restarted");
        self.payload = payload;
        self.stack = FrameStack::for_stack(self.script.body());
        self.calls.clear();
        self.pending = None;
        self.result = None;
        self.status = Status::Running;
    }

    /// Force the thread to done
    pub fn retire(&mut self) {
        if self.status != Status::Done {
            debug!(thread = %self.id, status = ?self.status, "thread retired");
        }
        self.finish(None);
    }

    fn finish(&mut self, result: Option<Value>) {
        self.status = Status::Done;
        self.result = result;
        self.stack.clear();
        self.calls.clear();
        self.pending = None;
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("script", &self.script.top_id())
            .field("target", &self.target)
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("warp_depth", &self.calls.warp_depth())
            .finish_non_exhaustive()
    }
}
