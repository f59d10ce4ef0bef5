//! Execution context
//!
//! The capability object handed to every block body. It is rebuilt for each
//! thread turn and carries no state across frames. Through it a body can ask
//! for sub-evaluations, suspend, reach the scene, and record side effects for
//! the scheduler.

use super::awaitable::{Awaitable, Resolver};
use super::calls::{CallFrame, CallStack};
use super::exec_loop;
use super::outbox::Outbox;
use super::routine::Flow;
use super::thread::ThreadId;
use super::timers::Timers;
use crate::block::{BlockId, Input, Trigger};
use crate::errors::ExecError;
use crate::scene::{Scene, Target, TargetId};
use crate::value::Value;
use indexmap::IndexMap;
use std::time::Duration;

/// Interpreter-owned services a running block may use
#[derive(Debug)]
pub struct Services {
    pub timers: Timers,
    pub outbox: Outbox,
    pub redraw_requested: bool,
}

impl Services {
    pub fn new(timers: Timers) -> Self {
        Self {
            timers,
            outbox: Outbox::new(),
            redraw_requested: false,
        }
    }
}

pub struct Context<'a> {
    scene: &'a mut Scene,
    services: &'a mut Services,
    target: TargetId,
    calls: &'a mut CallStack,
    payload: Option<&'a Value>,
    thread: Option<ThreadId>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        scene: &'a mut Scene,
        services: &'a mut Services,
        target: TargetId,
        calls: &'a mut CallStack,
        payload: Option<&'a Value>,
        thread: Option<ThreadId>,
    ) -> Self {
        Self {
            scene,
            services,
            target,
            calls,
            payload,
            thread,
        }
    }

    /* ===================== Evaluation protocol ===================== */

    /// Ask the driver to evaluate `input` and resume with its value
    pub fn evaluate(&self, input: &Input) -> Flow {
        Flow::Evaluate(input.clone())
    }

    /// Evaluate `input` right now. Reaching any suspension point is a
    /// protocol violation.
    pub fn evaluate_fast(&mut self, input: &Input) -> Result<Value, ExecError> {
        exec_loop::run_to_completion(input, self)
    }

    /// Park until `awaitable` settles
    pub fn await_value(&self, awaitable: Awaitable) -> Flow {
        Flow::Await(awaitable)
    }

    /// Cede the rest of this slice
    pub fn yield_thread(&self) -> Flow {
        Flow::Yield
    }

    /// The payload of the trigger that started this thread
    pub fn payload(&self) -> Option<&Value> {
        self.payload
    }

    pub fn thread_id(&self) -> Option<ThreadId> {
        self.thread
    }

    /* ===================== Scene ===================== */

    pub fn target_id(&self) -> TargetId {
        self.target
    }

    pub fn target(&self) -> &Target {
        &self.scene[self.target]
    }

    pub fn target_mut(&mut self) -> &mut Target {
        &mut self.scene[self.target]
    }

    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }

    /// Read a variable, falling back from the sprite to the stage
    pub fn variable(&self, name: &str) -> Result<Value, ExecError> {
        self.scene
            .variable(self.target, name)
            .cloned()
            .ok_or_else(|| ExecError::UnknownVariable(name.to_string()))
    }

    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<(), ExecError> {
        let slot = self
            .scene
            .variable_mut(self.target, name)
            .ok_or_else(|| ExecError::UnknownVariable(name.to_string()))?;
        *slot = value;
        Ok(())
    }

    pub fn list(&self, name: &str) -> Result<&Vec<Value>, ExecError> {
        self.scene
            .list(self.target, name)
            .ok_or_else(|| ExecError::UnknownList(name.to_string()))
    }

    pub fn list_mut(&mut self, name: &str) -> Result<&mut Vec<Value>, ExecError> {
        self.scene
            .list_mut(self.target, name)
            .ok_or_else(|| ExecError::UnknownList(name.to_string()))
    }

    /* ===================== Custom block calls ===================== */

    pub fn calls(&self) -> &CallStack {
        &*self.calls
    }

    pub fn warp_depth(&self) -> usize {
        self.calls.warp_depth()
    }

    pub fn enter_call(&mut self, procedure: BlockId, args: IndexMap<String, Value>, warp: bool) {
        self.calls.push(CallFrame {
            procedure,
            args,
            warp,
        });
    }

    pub fn exit_call(&mut self) -> Option<CallFrame> {
        self.calls.pop()
    }

    /// A parameter of the innermost call, or null outside any call
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.calls.top().and_then(|frame| frame.args.get(name))
    }

    /* ===================== Services ===================== */

    pub fn request_redraw(&mut self) {
        self.services.redraw_requested = true;
    }

    /// An awaitable settled once `duration` has passed
    pub fn delay(&mut self, duration: Duration) -> Awaitable {
        self.services.timers.delay(duration)
    }

    pub fn timer_seconds(&self) -> f64 {
        self.services.timers.elapsed_seconds()
    }

    pub fn reset_timer(&mut self) {
        self.services.timers.reset();
    }

    /// Start every script listening for `message`. With a resolver, it is
    /// settled once all of them have finished.
    pub fn broadcast(&mut self, message: &str, completion: Option<Resolver>) {
        self.services
            .outbox
            .push_broadcast(Trigger::broadcast(message), completion);
    }

    pub fn stop_all(&mut self) {
        self.services.outbox.push_stop_all();
    }

    /// Stop every other thread running on this target
    pub fn stop_other_scripts(&mut self) {
        self.services
            .outbox
            .push_stop_others(self.target, self.thread);
    }
}
