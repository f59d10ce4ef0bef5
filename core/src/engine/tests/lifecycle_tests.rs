//! Thread lifecycle: launch, restart, completion, retirement

use super::helpers::Harness;
use crate::block::Trigger;
use crate::engine::Status;
use crate::errors::ExecError;
use crate::scene::TargetId;
use crate::value::Value;

#[test]
fn test_launch_creates_one_running_thread() {
    let mut h = Harness::new();
    let body = h.forever(vec![h.change("count", 1.0)]);
    let script = h.add_script(h.sprite, vec![body]);

    let id = h.launch(&script);

    assert_eq!(h.interpreter.thread_count(), 1);
    let thread = h.interpreter.thread(id).unwrap();
    assert_eq!(thread.status(), Status::Running);
    assert_eq!(thread.generation(), 0);
    assert_eq!(thread.target(), h.sprite);
}

#[test]
fn test_foreign_target_fails_the_thread() {
    let mut h = Harness::new();
    let body = h.change("count", 1.0);
    let script = h.add_script(h.sprite, vec![body]);
    let stray = h.interpreter.launch(script, TargetId(7), None, false);

    let err = h.interpreter.step_threads(&mut h.scene).unwrap_err();

    assert_eq!(err, ExecError::UnknownTarget(7));
    assert!(h.interpreter.thread(stray).is_none());
    assert_eq!(h.number("count"), 0.0);
}

#[test]
fn test_restart_on_refire_keeps_thread_count() {
    let mut h = Harness::new();
    let hat = h.flag_hat();
    let body = h.forever(vec![h.change("count", 1.0)]);
    h.add_script(h.sprite, vec![hat, body]);

    let first = h.interpreter.trigger(&h.scene, &Trigger::green_flag());
    h.step();
    let second = h.interpreter.trigger(&h.scene, &Trigger::green_flag());

    assert_eq!(first, second);
    assert_eq!(h.interpreter.thread_count(), 1);
    let thread = h.interpreter.thread(first[0]).unwrap();
    assert_eq!(thread.generation(), 1);
    assert_eq!(thread.status(), Status::Running);
}

#[test]
fn test_launch_with_restart_matches_any_target() {
    let mut h = Harness::new();
    let body = h.forever(vec![]);
    let script = h.add_script(h.sprite, vec![body]);

    let a = h.interpreter.launch(script.clone(), h.sprite, None, true);
    let b = h.interpreter.launch(script.clone(), h.stage, None, true);
    assert_eq!(a, b);
    assert_eq!(h.interpreter.thread_count(), 1);

    // Without restart a second thread is registered
    let c = h.interpreter.launch(script, h.sprite, None, false);
    assert_ne!(a, c);
    assert_eq!(h.interpreter.thread_count(), 2);
}

#[test]
fn test_restart_runs_from_the_top() {
    let mut h = Harness::new();
    let hat = h.flag_hat();
    let count = h.change("count", 1.0);
    let wait = h.wait(10.0);
    h.add_script(h.sprite, vec![hat, count, wait]);

    h.interpreter.trigger(&h.scene, &Trigger::green_flag());
    h.step();
    assert_eq!(h.number("count"), 1.0);

    h.interpreter.trigger(&h.scene, &Trigger::green_flag());
    h.step();
    assert_eq!(h.number("count"), 2.0);
    assert_eq!(h.interpreter.thread_count(), 1);
}

#[test]
fn test_completed_thread_removed_in_order() {
    let mut h = Harness::new();
    let a = h.forever(vec![h.change("count", 1.0)]);
    let b = h.set("score", 1.0);
    let c = h.forever(vec![h.change("count", 1.0)]);
    let a = h.add_script(h.sprite, vec![a]);
    let b = h.add_script(h.sprite, vec![b]);
    let c = h.add_script(h.sprite, vec![c]);

    let ta = h.launch(&a);
    let tb = h.launch(&b);
    let tc = h.launch(&c);

    h.interpreter.set_work_time(std::time::Duration::ZERO);
    let report = h.step();

    assert_eq!(report.finished, 1);
    let ids: Vec<_> = h.interpreter.threads().iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![ta, tc]);
    assert!(h.interpreter.thread(tb).is_none());
    assert_eq!(h.number("score"), 1.0);
}

#[test]
fn test_stop_all_leaves_no_threads() {
    let mut h = Harness::new();
    let waiting = h.wait(5.0);
    let looping = h.forever(vec![]);
    let a = h.add_script(h.sprite, vec![waiting]);
    let b = h.add_script(h.sprite, vec![looping]);
    h.launch(&a);
    h.launch(&b);
    h.step();

    h.interpreter.stop_all();
    assert_eq!(h.interpreter.thread_count(), 0);

    let report = h.step();
    assert_eq!(report.rounds, 1);
    assert_eq!(report.stepped, 0);
}

#[test]
fn test_late_timer_after_restart_is_discarded() {
    let mut h = Harness::new();
    let hat = h.flag_hat();
    let wait = h.wait(1.0);
    let count = h.change("count", 1.0);
    h.add_script(h.sprite, vec![hat, wait, count]);

    let id = h.interpreter.trigger(&h.scene, &Trigger::green_flag())[0];
    h.step();
    assert_eq!(h.interpreter.thread(id).unwrap().status(), Status::Parked);

    h.advance(0.5);
    h.interpreter.trigger(&h.scene, &Trigger::green_flag());
    h.step();
    let thread = h.interpreter.thread(id).unwrap();
    assert_eq!(thread.generation(), 1);
    assert_eq!(thread.status(), Status::Parked);

    // The first wait comes due; the restarted thread keeps waiting
    h.advance(0.5);
    h.step();
    assert_eq!(h.interpreter.thread(id).unwrap().status(), Status::Parked);
    assert_eq!(h.number("count"), 0.0);

    // A settlement tagged with the old generation is refused
    let thread = h.interpreter.thread_mut(id).unwrap();
    assert!(!thread.resolve(0, Value::from(99)));
    assert_eq!(thread.status(), Status::Parked);

    h.advance(0.5);
    h.step();
    assert_eq!(h.number("count"), 1.0);
    assert_eq!(h.interpreter.thread_count(), 0);
}

#[test]
fn test_retired_thread_ignores_settlement() {
    let mut h = Harness::new();
    let wait = h.wait(1.0);
    let count = h.change("count", 1.0);
    let script = h.add_script(h.sprite, vec![wait, count]);
    let id = h.launch(&script);
    h.step();

    let thread = h.interpreter.thread_mut(id).unwrap();
    let generation = thread.generation();
    thread.retire();
    assert!(thread.is_done());
    assert!(!thread.resolve(generation, Value::Null));
    assert_eq!(thread.status(), Status::Done);

    h.advance(1.0);
    h.step();
    assert_eq!(h.number("count"), 0.0);
    assert_eq!(h.interpreter.thread_count(), 0);
}

#[test]
fn test_destroy_stops_everything() {
    let mut h = Harness::new();
    let wait = h.wait(1.0);
    let script = h.add_script(h.sprite, vec![wait]);
    h.launch(&script);
    h.step();
    assert_eq!(h.interpreter.timers().pending_count(), 1);

    let Harness { interpreter, .. } = h;
    interpreter.destroy();
}
