//! The scheduler
//!
//! An [`Interpreter`] owns the live threads of one session and drives them for
//! a bounded slice of wall-clock time per host frame. Threads are stepped in
//! registration order; finished threads are compacted out in place so the
//! order of the survivors never changes.

use super::awaitable::Resolver;
use super::calls::CallStack;
use super::context::{Context, Services};
use super::outbox::Effect;
use super::thread::{Status, Thread, ThreadId};
use super::timers::{Clock, SystemClock, Timers};
use crate::block::{BlockId, Input, Trigger};
use crate::config::{Config, ErrorPolicy, SchedulerConfig};
use crate::errors::ExecError;
use crate::scene::{Scene, Script, TargetId};
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::ensure;
use tracing::{debug, trace, warn};

/// Summary of one [`Interpreter::step_threads`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Scheduling rounds run (always at least one)
    pub rounds: usize,
    /// Individual thread steps taken
    pub stepped: usize,
    /// Threads that finished and were removed
    pub finished: usize,
    /// Whether the work budget ran out while threads were still active
    pub timed_out: bool,
}

/// A broadcast-and-wait in flight
struct Watcher {
    threads: Vec<ThreadId>,
    resolver: Resolver,
}

pub struct Interpreter {
    threads: Vec<Thread>,
    config: SchedulerConfig,
    work_time: Duration,
    services: Services,
    next_id: u64,
    edge_states: HashMap<(TargetId, BlockId), bool>,
    watchers: Vec<Watcher>,
}

impl Interpreter {
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Build an interpreter whose timers follow `clock`
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let config = config.scheduler.clone();
        let work_time = config.work_time();
        debug!(
            frame_rate = config.frame_rate,
            turbo = config.turbo,
            ?work_time,
            policy = ?config.error_policy,
            "interpreter created"
        );
        Self {
            threads: Vec::new(),
            config,
            work_time,
            services: Services::new(Timers::new(clock)),
            next_id: 0,
            edge_states: HashMap::new(),
            watchers: Vec::new(),
        }
    }

    /// Tear the session down: every thread is stopped and pending timers are
    /// dropped.
    pub fn destroy(mut self) {
        self.stop_all();
        self.services.timers.clear();
        debug!("interpreter destroyed");
    }

    /* ===================== Settings ===================== */

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn turbo(&self) -> bool {
        self.config.turbo
    }

    pub fn set_turbo(&mut self, turbo: bool) {
        self.config.turbo = turbo;
    }

    /// Change the host frame rate and recompute the work budget
    pub fn set_frame_rate(&mut self, frame_rate: f64) -> anyhow::Result<()> {
        ensure!(
            frame_rate.is_finite() && frame_rate > 0.0,
            "frame rate must be a positive number, got {frame_rate}"
        );
        self.config.frame_rate = frame_rate;
        self.work_time = self.config.work_time();
        Ok(())
    }

    /// Override the per-frame work budget directly
    pub fn set_work_time(&mut self, work_time: Duration) {
        self.work_time = work_time;
    }

    pub fn work_time(&self) -> Duration {
        self.work_time
    }

    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.config.error_policy = policy;
    }

    pub fn request_redraw(&mut self) {
        self.services.redraw_requested = true;
    }

    pub fn redraw_requested(&self) -> bool {
        self.services.redraw_requested
    }

    pub fn timers(&self) -> &Timers {
        &self.services.timers
    }

    pub fn timers_mut(&mut self) -> &mut Timers {
        &mut self.services.timers
    }

    /* ===================== Threads ===================== */

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id() == id)
    }

    pub fn thread_mut(&mut self, id: ThreadId) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.id() == id)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Whether a live thread is running `script` (matched by top block)
    pub fn is_running(&self, script: &Script) -> bool {
        self.find_live(script.top_id()).is_some()
    }

    fn find_live(&self, top: &BlockId) -> Option<usize> {
        self.threads
            .iter()
            .position(|t| !t.is_done() && t.script().top_id() == top)
    }

    /// Start `script` on `target`.
    ///
    /// With `restart_existing` set, a live thread already running the same
    /// script (on any target) is restarted instead of adding a new one.
    ///
    /// `target` must belong to the scene the thread is stepped with; a
    /// foreign id makes every step fail with [`ExecError::UnknownTarget`].
    pub fn launch(
        &mut self,
        script: Arc<Script>,
        target: TargetId,
        payload: Option<Value>,
        restart_existing: bool,
    ) -> ThreadId {
        if restart_existing {
            if let Some(index) = self.find_live(script.top_id()) {
                let thread = &mut self.threads[index];
                thread.restart(payload);
                return thread.id();
            }
        }

        let id = ThreadId(self.next_id);
        self.next_id += 1;
        debug!(thread = %id, script = %script.top_id(), target = target.0, "thread launched");
        self.threads.push(Thread::new(id, script, target, payload));
        id
    }

    /// Retire every thread and clear the set
    pub fn stop_all(&mut self) {
        if !self.threads.is_empty() {
            debug!(count = self.threads.len(), "stopping all threads");
        }
        for thread in &mut self.threads {
            thread.retire();
        }
        self.threads.clear();
        self.watchers.clear();
        self.services.outbox.clear();
    }

    /* ===================== Triggers ===================== */

    /// Start every event-hat script matching `trigger`. A restarting hat
    /// restarts its live thread; any other hat adds a new instance.
    pub fn trigger(&mut self, scene: &Scene, trigger: &Trigger) -> Vec<ThreadId> {
        let mut started = Vec::new();
        for (target_id, target) in scene.targets() {
            for script in target.scripts() {
                let (Some(hat), Some(block)) = (script.hat(), script.hat_block()) else {
                    continue;
                };
                if !hat.matches(block, trigger) {
                    continue;
                }
                started.push(self.launch(
                    script.clone(),
                    target_id,
                    trigger.payload.clone(),
                    hat.restart,
                ));
            }
        }
        trace!(event = %trigger.event, key = ?trigger.key, started = started.len(), "trigger dispatched");
        started
    }

    /// Stop everything, reset the project timer and fire the green flag
    pub fn green_flag(&mut self, scene: &Scene) -> Vec<ThreadId> {
        self.stop_all();
        self.services.timers.reset();
        self.edge_states.clear();
        self.trigger(scene, &Trigger::green_flag())
    }

    /// Re-check every edge-activated hat and launch (restarting) the scripts
    /// whose predicate went from false to true.
    pub fn start_edge_hats(&mut self, scene: &mut Scene) -> Result<Vec<ThreadId>, ExecError> {
        let edges: Vec<(TargetId, Arc<Script>)> = scene
            .targets()
            .flat_map(|(id, target)| {
                target
                    .scripts()
                    .iter()
                    .filter(|s| s.hat().is_some_and(|h| h.is_edge()))
                    .map(move |s| (id, s.clone()))
            })
            .collect();

        let mut started = Vec::new();
        for (target, script) in edges {
            let mut calls = CallStack::new();
            let mut cx = Context::new(scene, &mut self.services, target, &mut calls, None, None);
            let value = match cx.evaluate_fast(&Input::Block(script.top().clone())) {
                Ok(value) => value.to_bool(),
                Err(e) if e.is_protocol_violation() => return Err(e),
                Err(e) => match self.config.error_policy {
                    ErrorPolicy::AbortFrame => return Err(e),
                    ErrorPolicy::RetireThread => {
                        warn!(script = %script.top_id(), error = %e, "edge hat predicate failed");
                        false
                    }
                },
            };

            let previous = self
                .edge_states
                .insert((target, script.top_id().clone()), value)
                .unwrap_or(false);
            if value && !previous {
                started.push(self.launch(script, target, None, true));
            }
        }

        self.apply_effects(scene);
        Ok(started)
    }

    /* ===================== Stepping ===================== */

    /// Edge hats, then one frame of thread stepping
    pub fn tick(&mut self, scene: &mut Scene) -> Result<StepReport, ExecError> {
        self.start_edge_hats(scene)?;
        self.step_threads(scene)
    }

    /// Run one frame's worth of scheduling rounds.
    ///
    /// Each round steps every running thread once (parked threads are polled
    /// first) and then drops finished threads. Rounds continue while threads
    /// remain, at least one was active, the work budget is not spent and,
    /// unless in turbo mode, no redraw was requested.
    pub fn step_threads(&mut self, scene: &mut Scene) -> Result<StepReport, ExecError> {
        let started = Instant::now();
        self.services.redraw_requested = false;
        self.services.timers.fire_due();

        let mut report = StepReport::default();
        loop {
            report.rounds += 1;
            let mut active = 0;

            let mut i = 0;
            while i < self.threads.len() {
                let thread = &mut self.threads[i];
                if thread.status() == Status::Parked {
                    thread.poll_pending();
                }
                if thread.status() == Status::Running {
                    active += 1;
                    report.stepped += 1;
                    let result = thread.step(scene, &mut self.services);
                    let id = thread.id();
                    self.apply_effects(scene);
                    if let Err(e) = result {
                        self.handle_error(id, e, &mut report)?;
                    }
                }
                i += 1;
            }

            self.compact(&mut report);
            self.settle_watchers();

            trace!(
                round = report.rounds,
                active,
                live = self.threads.len(),
                "round complete"
            );

            if self.threads.is_empty() || active == 0 {
                break;
            }
            if started.elapsed() >= self.work_time {
                report.timed_out = true;
                break;
            }
            if !self.config.turbo && self.services.redraw_requested {
                break;
            }
        }

        Ok(report)
    }

    fn handle_error(
        &mut self,
        id: ThreadId,
        error: ExecError,
        report: &mut StepReport,
    ) -> Result<(), ExecError> {
        if error.is_protocol_violation() {
            self.compact(report);
            return Err(error);
        }
        match self.config.error_policy {
            ErrorPolicy::AbortFrame => {
                self.compact(report);
                Err(error)
            }
            ErrorPolicy::RetireThread => {
                warn!(thread = %id, error = %error, "block failed, thread retired");
                Ok(())
            }
        }
    }

    /// Stable in-place removal of finished threads
    fn compact(&mut self, report: &mut StepReport) {
        let before = self.threads.len();
        self.threads.retain(|t| !t.is_done());
        report.finished += before - self.threads.len();
    }

    /// Apply side effects recorded by the thread that just ran
    fn apply_effects(&mut self, scene: &Scene) {
        for effect in self.services.outbox.drain() {
            match effect {
                Effect::Broadcast {
                    trigger,
                    completion,
                } => {
                    let started = self.trigger(scene, &trigger);
                    if let Some(resolver) = completion {
                        if started.is_empty() {
                            resolver.resolve(Value::Null);
                        } else {
                            self.watchers.push(Watcher {
                                threads: started,
                                resolver,
                            });
                        }
                    }
                }
                Effect::StopAll => self.stop_all(),
                Effect::StopOtherScripts { target, except } => {
                    for thread in &mut self.threads {
                        if thread.target() == target && Some(thread.id()) != except {
                            thread.retire();
                        }
                    }
                }
            }
        }
    }

    /// Resolve every broadcast-and-wait whose threads are all gone
    fn settle_watchers(&mut self) {
        if self.watchers.is_empty() {
            return;
        }
        let threads = &self.threads;
        let (finished, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.watchers)
                .into_iter()
                .partition(|w| {
                    !w.threads
                        .iter()
                        .any(|id| threads.iter().any(|t| t.id() == *id && !t.is_done()))
                });
        self.watchers = waiting;
        for watcher in finished {
            watcher.resolver.resolve(Value::Null);
        }
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("threads", &self.threads)
            .field("config", &self.config)
            .field("work_time", &self.work_time)
            .field("watchers", &self.watchers.len())
            .finish_non_exhaustive()
    }
}
