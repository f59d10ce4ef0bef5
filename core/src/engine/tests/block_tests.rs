//! Builtin blocks running inside threads

use super::helpers::Harness;
use crate::value::Value;

fn arith(h: &mut Harness, opcode: &str, a: f64, b: f64) -> f64 {
    let block = h.block(opcode, vec![("NUM1", a.into()), ("NUM2", b.into())]);
    h.eval(block).to_number()
}

fn compare(h: &mut Harness, opcode: &str, a: impl Into<Value>, b: impl Into<Value>) -> bool {
    let (a, b): (Value, Value) = (a.into(), b.into());
    let block = h.block(opcode, vec![("OPERAND1", a.into()), ("OPERAND2", b.into())]);
    h.eval(block).to_bool()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_arithmetic_reporters() {
    let mut h = Harness::new();
    assert_eq!(arith(&mut h, "operator_add", 2.0, 3.0), 5.0);
    assert_eq!(arith(&mut h, "operator_subtract", 2.0, 3.0), -1.0);
    assert_eq!(arith(&mut h, "operator_multiply", 4.0, 2.5), 10.0);
    assert_eq!(arith(&mut h, "operator_mod", -7.0, 3.0), 2.0);
    assert!(arith(&mut h, "operator_divide", 1.0, 0.0).is_infinite());
}

#[test]
fn test_comparison_reporters() {
    let mut h = Harness::new();
    assert!(compare(&mut h, "operator_lt", 2, "10"));
    assert!(compare(&mut h, "operator_lt", "apple", "Banana"));
    assert!(compare(&mut h, "operator_gt", 3.5, 3));
    assert!(compare(&mut h, "operator_equals", "Hello", "hello"));
    assert!(compare(&mut h, "operator_equals", "10", 10));
    assert!(!compare(&mut h, "operator_equals", "10", "1O"));
}

#[test]
fn test_text_and_rounding_reporters() {
    let mut h = Harness::new();
    let join = h.block(
        "operator_join",
        vec![("STRING1", "ab".into()), ("STRING2", 7.into())],
    );
    assert_eq!(h.eval(join).to_string(), "ab7");

    let length = h.block("operator_length", vec![("STRING", "hello".into())]);
    assert_eq!(h.eval(length).to_number(), 5.0);

    let round = h.block("operator_round", vec![("NUM", 2.5.into())]);
    assert_eq!(h.eval(round).to_number(), 3.0);
}

#[test]
fn test_boolean_reporters_nest() {
    let mut h = Harness::new();
    let gt = h.block(
        "operator_gt",
        vec![("OPERAND1", 5.into()), ("OPERAND2", 1.into())],
    );
    let not = h.block("operator_not", vec![("OPERAND", false.into())]);
    let and = h.block(
        "operator_and",
        vec![("OPERAND1", gt.into()), ("OPERAND2", not.into())],
    );
    assert!(h.eval(and).to_bool());
}

#[test]
fn test_move_and_turn() {
    let mut h = Harness::new();
    let go = h.block("motion_gotoxy", vec![("X", 10.0.into()), ("Y", (-5.0).into())]);
    let step = h.block("motion_movesteps", vec![("STEPS", 10.0.into())]);
    let turn = h.block("motion_turnleft", vec![("DEGREES", 90.0.into())]);
    let climb = h.block("motion_movesteps", vec![("STEPS", 3.0.into())]);
    let script = h.add_script(h.sprite, vec![go, step, turn, climb]);
    h.interpreter.set_turbo(true);
    h.launch(&script);
    h.step();

    let sprite = &h.scene[h.sprite];
    assert!(approx(sprite.x, 20.0));
    assert!(approx(sprite.y, -2.0));
    assert_eq!(sprite.direction(), 0.0);
}

#[test]
fn test_direction_is_normalized() {
    let mut h = Harness::new();
    let turn = h.block("motion_turnright", vec![("DEGREES", 270.0.into())]);
    let script = h.add_script(h.sprite, vec![turn]);
    h.launch(&script);
    h.step();
    assert_eq!(h.scene[h.sprite].direction(), 0.0);

    let point = h.block("motion_pointindirection", vec![("DIRECTION", (-270.0).into())]);
    let script = h.add_script(h.sprite, vec![point]);
    h.launch(&script);
    h.step();
    assert_eq!(h.scene[h.sprite].direction(), 90.0);

    let reading = h.block("motion_direction", vec![]);
    assert_eq!(h.eval(reading).to_number(), 90.0);
}

#[test]
fn test_position_reporters() {
    let mut h = Harness::new();
    let change = h.block("motion_changexby", vec![("DX", 4.0.into())]);
    let sety = h.block("motion_sety", vec![("Y", 7.0.into())]);
    let script = h.add_script(h.sprite, vec![change, sety]);
    h.interpreter.set_turbo(true);
    h.launch(&script);
    h.step();

    let x = h.block("motion_xposition", vec![]);
    let y = h.block("motion_yposition", vec![]);
    assert_eq!(h.eval(x).to_number(), 4.0);
    assert_eq!(h.eval(y).to_number(), 7.0);
}

#[test]
fn test_costumes() {
    let mut h = Harness::new();
    let by_name = h.block("looks_switchcostumeto", vec![("COSTUME", "cat-c".into())]);
    let script = h.add_script(h.sprite, vec![by_name]);
    h.launch(&script);
    h.step();
    assert_eq!(h.scene[h.sprite].costume, 2);

    let next = h.block("looks_nextcostume", vec![]);
    let script = h.add_script(h.sprite, vec![next]);
    h.launch(&script);
    h.step();
    assert_eq!(h.scene[h.sprite].costume, 0);

    let by_text_number = h.block("looks_switchcostumeto", vec![("COSTUME", "2".into())]);
    let script = h.add_script(h.sprite, vec![by_text_number]);
    h.launch(&script);
    h.step();

    let number = h.block("looks_costumenumbername", vec![("NUMBER_NAME", "number".into())]);
    assert_eq!(h.eval(number).to_number(), 2.0);
    let name = h.block("looks_costumenumbername", vec![("NUMBER_NAME", "name".into())]);
    assert_eq!(h.eval(name).to_string(), "cat-b");
}

#[test]
fn test_previous_costume_wraps() {
    let mut h = Harness::new();
    let previous = h.block(
        "looks_switchcostumeto",
        vec![("COSTUME", "previous costume".into())],
    );
    let script = h.add_script(h.sprite, vec![previous]);
    h.launch(&script);
    h.step();
    assert_eq!(h.scene[h.sprite].costume_name(), Some("cat-c"));
}

#[test]
fn test_show_and_hide() {
    let mut h = Harness::new();
    let hide = h.block("looks_hide", vec![]);
    let script = h.add_script(h.sprite, vec![hide]);
    h.launch(&script);
    h.step();
    assert!(!h.scene[h.sprite].visible);
    assert!(h.interpreter.redraw_requested());

    let show = h.block("looks_show", vec![]);
    let script = h.add_script(h.sprite, vec![show]);
    h.launch(&script);
    h.step();
    assert!(h.scene[h.sprite].visible);
}

#[test]
fn test_list_blocks() {
    let mut h = Harness::new();
    let blocks = ["x", "y", "z"]
        .into_iter()
        .map(|item| {
            h.block(
                "data_addtolist",
                vec![("LIST", "items".into()), ("ITEM", item.into())],
            )
        })
        .collect();
    let script = h.add_script(h.sprite, blocks);
    h.launch(&script);
    h.step();

    let length = h.block("data_lengthoflist", vec![("LIST", "items".into())]);
    assert_eq!(h.eval(length).to_number(), 3.0);

    let second = h.block(
        "data_itemoflist",
        vec![("LIST", "items".into()), ("INDEX", 2.0.into())],
    );
    assert_eq!(h.eval(second), Value::from("y"));

    let last = h.block(
        "data_itemoflist",
        vec![("LIST", "items".into()), ("INDEX", "last".into())],
    );
    assert_eq!(h.eval(last), Value::from("z"));

    let missing = h.block(
        "data_itemoflist",
        vec![("LIST", "items".into()), ("INDEX", 9.0.into())],
    );
    assert_eq!(h.eval(missing), Value::from(""));

    let clear = h.block("data_deletealloflist", vec![("LIST", "items".into())]);
    let script = h.add_script(h.sprite, vec![clear]);
    h.launch(&script);
    h.step();
    assert!(h.scene[h.sprite].lists["items"].is_empty());
}

#[test]
fn test_stage_variables_are_shared() {
    let mut h = Harness::new();
    let bump = h.change("score", 5.0);
    let script = h.add_script(h.sprite, vec![bump]);
    h.launch(&script);
    h.step();

    assert_eq!(h.scene[h.stage].variables["score"], Value::from(5));
    let read = h.var("score");
    assert_eq!(h.eval(read).to_number(), 5.0);
}

#[test]
fn test_if_else_picks_a_branch() {
    let mut h = Harness::new();
    let test = h.block(
        "operator_lt",
        vec![("OPERAND1", 1.into()), ("OPERAND2", 2.into())],
    );
    let branch = h.block(
        "control_if_else",
        vec![
            ("CONDITION", test.into()),
            ("SUBSTACK", vec![h.set("result", "then")].into()),
            ("SUBSTACK2", vec![h.set("result", "else")].into()),
        ],
    );
    let script = h.add_script(h.sprite, vec![branch]);
    h.launch(&script);
    h.step();
    assert_eq!(h.value("result"), Value::from("then"));
}

#[test]
fn test_repeat_until_checks_before_each_pass() {
    let mut h = Harness::new();
    let count = h.var("count");
    let done = h.block(
        "operator_gt",
        vec![("OPERAND1", count.into()), ("OPERAND2", 3.into())],
    );
    let body = h.block(
        "control_repeat_until",
        vec![
            ("CONDITION", done.into()),
            ("SUBSTACK", vec![h.change("count", 1.0)].into()),
        ],
    );
    let script = h.add_script(h.sprite, vec![body]);
    h.launch(&script);
    h.step();
    assert_eq!(h.number("count"), 4.0);
}

#[test]
fn test_wait_until_parks_across_frames() {
    let mut h = Harness::new();
    let score = h.var("score");
    let ready = h.block(
        "operator_equals",
        vec![("OPERAND1", score.into()), ("OPERAND2", 1.into())],
    );
    let wait = h.block("control_wait_until", vec![("CONDITION", ready.into())]);
    let after = h.set("result", "done");
    let script = h.add_script(h.sprite, vec![wait, after]);
    h.interpreter.set_work_time(std::time::Duration::ZERO);
    h.launch(&script);

    h.step();
    h.step();
    assert_eq!(h.value("result"), Value::from(""));

    h.scene[h.stage].variables.insert("score".to_string(), Value::from(1));
    h.step();
    assert_eq!(h.value("result"), Value::from("done"));
}

#[test]
fn test_timer_follows_the_clock() {
    let mut h = Harness::new();
    h.advance(1.5);
    let timer = h.block("sensing_timer", vec![]);
    assert_eq!(h.eval(timer).to_number(), 1.5);

    let reset = h.block("sensing_resettimer", vec![]);
    let script = h.add_script(h.sprite, vec![reset]);
    h.launch(&script);
    h.step();
    h.advance(0.25);
    let timer = h.block("sensing_timer", vec![]);
    assert_eq!(h.eval(timer).to_number(), 0.25);
}
