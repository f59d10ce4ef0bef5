//! Custom blocks: warp mode, recursion guard, arguments

use super::helpers::Harness;
use crate::block::{Block, Procedure};
use crate::config::ErrorPolicy;
use crate::engine::{Services, Status, Thread, ThreadId, Timers};
use crate::errors::ExecError;
use crate::scene::Script;
use std::sync::Arc;

/// Declare `countdown %s` (param `n`): while n > 0, bump `count` and recurse
/// with n - 1.
fn countdown(h: &mut Harness, warp: bool) -> Arc<Procedure> {
    let procedure = h
        .scene
        .declare_procedure("countdown-def", "countdown %s", vec!["n".to_string()], warp)
        .unwrap();

    let n = || h.block("argument_reporter_string_number", vec![("VALUE", "n".into())]);
    let positive = h.block(
        "operator_gt",
        vec![("OPERAND1", n().into()), ("OPERAND2", 0.0.into())],
    );
    let less = h.block(
        "operator_subtract",
        vec![("NUM1", n().into()), ("NUM2", 1.0.into())],
    );
    let recurse = h.block("countdown %s", vec![("n", less.into())]);
    let body = h.block(
        "control_if",
        vec![
            ("CONDITION", positive.into()),
            ("SUBSTACK", vec![h.change("count", 1.0), recurse].into()),
        ],
    );
    procedure.define(vec![body]).unwrap();
    h.scene.validate().unwrap();
    procedure
}

fn call(h: &Harness, times: f64) -> Arc<Block> {
    h.block("countdown %s", vec![("n", times.into())])
}

#[test]
fn test_warp_recursion_completes_in_one_step() {
    let mut h = Harness::new();
    countdown(&mut h, true);
    let script = Script::new(vec![call(&h, 1000.0)]).unwrap();

    let mut services = Services::new(Timers::new(Arc::new(h.clock.clone())));
    let mut thread = Thread::new(ThreadId(0), script, h.sprite, None);

    let status = thread.step(&mut h.scene, &mut services).unwrap();

    assert_eq!(status, Status::Done);
    assert_eq!(h.number("count"), 1000.0);
    assert_eq!(thread.warp_depth(), 0);
}

#[test]
fn test_warp_recursion_takes_one_round() {
    let mut h = Harness::new();
    countdown(&mut h, true);
    let script = h.add_script(h.sprite, vec![call(&h, 1000.0)]);
    h.launch(&script);

    let report = h.step();

    assert_eq!(report.rounds, 1);
    assert_eq!(report.finished, 1);
    assert_eq!(h.number("count"), 1000.0);
}

#[test]
fn test_recursion_yields_on_every_reentry() {
    let mut h = Harness::new();
    countdown(&mut h, false);
    let script = h.add_script(h.sprite, vec![call(&h, 20.0)]);
    let id = h.launch(&script);

    let report = h.step();

    assert!(report.rounds >= 20, "only {} rounds", report.rounds);
    assert_eq!(h.number("count"), 20.0);
    assert!(h.interpreter.thread(id).is_none());
}

#[test]
fn test_recursion_yields_one_call_per_step() {
    let mut h = Harness::new();
    countdown(&mut h, false);
    let script = Script::new(vec![call(&h, 3.0)]).unwrap();

    let mut services = Services::new(Timers::new(Arc::new(h.clock.clone())));
    let mut thread = Thread::new(ThreadId(0), script, h.sprite, None);

    // The outermost call runs straight into its first re-entry
    assert_eq!(thread.step(&mut h.scene, &mut services).unwrap(), Status::Running);
    assert_eq!(h.number("count"), 1.0);
    assert_eq!(thread.step(&mut h.scene, &mut services).unwrap(), Status::Running);
    assert_eq!(h.number("count"), 2.0);
    assert_eq!(thread.step(&mut h.scene, &mut services).unwrap(), Status::Running);
    assert_eq!(h.number("count"), 3.0);
    assert_eq!(thread.step(&mut h.scene, &mut services).unwrap(), Status::Done);
}

#[test]
fn test_arguments_are_scoped_to_the_call() {
    let mut h = Harness::new();
    let procedure = h
        .scene
        .declare_procedure("echo-def", "echo %s", vec!["text".to_string()], false)
        .unwrap();
    let arg = h.block("argument_reporter_string_number", vec![("VALUE", "text".into())]);
    procedure.define(vec![h.set("result", arg)]).unwrap();

    let call = h.block("echo %s", vec![("text", "hello".into())]);
    let script = h.add_script(h.sprite, vec![call]);
    h.launch(&script);
    h.step();
    assert_eq!(h.value("result").to_string(), "hello");

    // Outside any call the reporter reads 0
    let outside = h.block("argument_reporter_string_number", vec![("VALUE", "text".into())]);
    assert_eq!(h.eval(outside).to_number(), 0.0);
}

#[test]
fn test_missing_body_fails_the_call() {
    let mut h = Harness::with_policy(ErrorPolicy::AbortFrame);
    h.scene
        .declare_procedure("ghost-def", "ghost", vec![], false)
        .unwrap();
    assert!(h.scene.validate().is_err());

    let call = h.block("ghost", vec![]);
    let script = h.add_script(h.sprite, vec![call]);
    h.launch(&script);

    let err = h.interpreter.step_threads(&mut h.scene).unwrap_err();
    assert_eq!(err, ExecError::MissingBody("ghost".to_string()));
    assert_eq!(h.interpreter.thread_count(), 0);
}
