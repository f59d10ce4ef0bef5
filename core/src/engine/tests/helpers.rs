//! Test helpers for engine tests
//!
//! A [`Harness`] holds a small scene (a stage and one sprite), an interpreter
//! on a manual clock, and shortcuts for building the blocks most tests need.

use crate::block::{Block, Input};
use crate::config::{Config, ErrorPolicy};
use crate::engine::{Interpreter, ManualClock, StepReport, ThreadId};
use crate::scene::{Scene, Script, Target, TargetId};
use crate::value::Value;
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub scene: Scene,
    pub interpreter: Interpreter,
    pub clock: ManualClock,
    pub stage: TargetId,
    pub sprite: TargetId,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_policy(policy: ErrorPolicy) -> Self {
        let mut config = Config::default();
        config.scheduler.error_policy = policy;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let mut scene = Scene::new().expect("builtins should register");
        let stage = scene
            .add_target(Target::stage().with_variable("score", 0))
            .unwrap();
        let sprite = scene
            .add_target(
                Target::sprite("Sprite1")
                    .with_costumes(["cat-a", "cat-b", "cat-c"])
                    .with_variable("count", 0)
                    .with_variable("result", "")
                    .with_list("items", vec![]),
            )
            .unwrap();
        let clock = ManualClock::new();
        let interpreter = Interpreter::with_clock(&config, Arc::new(clock.clone()));
        Self {
            scene,
            interpreter,
            clock,
            stage,
            sprite,
        }
    }

    /* ===================== Building ===================== */

    /// Build a block of `opcode` with the given inputs
    pub fn block(&self, opcode: &str, inputs: Vec<(&str, Input)>) -> Arc<Block> {
        inputs
            .into_iter()
            .fold(self.scene.block(opcode).unwrap(), |b, (name, input)| {
                b.input(name, input)
            })
            .build()
            .unwrap()
    }

    pub fn flag_hat(&self) -> Arc<Block> {
        self.block("event_whenflagclicked", vec![])
    }

    pub fn set(&self, var: &str, value: impl Into<Input>) -> Arc<Block> {
        self.block(
            "data_setvariableto",
            vec![("VARIABLE", var.into()), ("VALUE", value.into())],
        )
    }

    pub fn change(&self, var: &str, by: impl Into<Input>) -> Arc<Block> {
        self.block(
            "data_changevariableby",
            vec![("VARIABLE", var.into()), ("VALUE", by.into())],
        )
    }

    pub fn var(&self, name: &str) -> Arc<Block> {
        self.block("data_variable", vec![("VARIABLE", name.into())])
    }

    pub fn wait(&self, secs: f64) -> Arc<Block> {
        self.block("control_wait", vec![("DURATION", secs.into())])
    }

    pub fn repeat(&self, times: impl Into<Input>, body: Vec<Arc<Block>>) -> Arc<Block> {
        self.block(
            "control_repeat",
            vec![("TIMES", times.into()), ("SUBSTACK", body.into())],
        )
    }

    pub fn forever(&self, body: Vec<Arc<Block>>) -> Arc<Block> {
        self.block("control_forever", vec![("SUBSTACK", body.into())])
    }

    /// Attach a script to `target`
    pub fn add_script(&mut self, target: TargetId, blocks: Vec<Arc<Block>>) -> Arc<Script> {
        let script = Script::new(blocks).unwrap();
        self.scene[target].add_script(script.clone());
        script
    }

    /* ===================== Running ===================== */

    /// Launch a new thread for `script` on the sprite
    pub fn launch(&mut self, script: &Arc<Script>) -> ThreadId {
        self.interpreter
            .launch(script.clone(), self.sprite, None, false)
    }

    pub fn step(&mut self) -> StepReport {
        self.interpreter
            .step_threads(&mut self.scene)
            .expect("step_threads failed")
    }

    pub fn advance(&self, secs: f64) {
        self.clock.advance(Duration::from_secs_f64(secs));
    }

    /// Evaluate a reporter by running `set result to <reporter>` to completion
    pub fn eval(&mut self, reporter: Arc<Block>) -> Value {
        let block = self.set("result", reporter);
        let script = Script::new(vec![block]).unwrap();
        self.launch(&script);
        self.step();
        self.value("result")
    }

    /// A variable as seen from the sprite
    pub fn value(&self, name: &str) -> Value {
        self.scene
            .variable(self.sprite, name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn number(&self, name: &str) -> f64 {
        self.value(name).to_number()
    }
}
