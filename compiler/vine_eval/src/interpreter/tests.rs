use std::path::PathBuf;

use super::*;
use crate::errors::EvalErrorKind;
use crate::loader::MemoryLoader;
use crate::print_handler::buffer_handler;
use pretty_assertions::assert_eq;

struct Harness {
    interp: Interpreter,
    printer: SharedPrintHandler,
}

impl Harness {
    fn new() -> Self {
        Self::with_loader(MemoryLoader::new())
    }

    fn with_loader(loader: MemoryLoader) -> Self {
        let printer = buffer_handler();
        let interp = InterpreterBuilder::new()
            .print_handler(Arc::clone(&printer))
            .loader(loader)
            .workspace(Workspace::new(PathBuf::from("/w")))
            .build();
        Harness { interp, printer }
    }

    fn eval(&self, source: &str) -> EvalResult {
        let program = vine_parse::parse_source(source, self.interp.interner())
            .unwrap_or_else(|err| panic!("parse failed: {err}"));
        let context = self.interp.context("main.vine", source);
        let env = self.interp.new_root(Arc::clone(&context));
        self.interp.eval_safe(&program, &env, &context)
    }

    fn output(&self) -> String {
        self.printer.output()
    }
}

fn eval(source: &str) -> Value {
    Harness::new()
        .eval(source)
        .unwrap_or_else(|err| panic!("evaluation failed: {err}"))
}

fn eval_text(source: &str) -> String {
    eval(source).to_string()
}

fn eval_err(source: &str) -> EvalError {
    match Harness::new().eval(source) {
        Ok(value) => panic!("expected an error, got {value}"),
        Err(err) => err,
    }
}

fn output(source: &str) -> String {
    let harness = Harness::new();
    if let Err(err) = harness.eval(source) {
        panic!("evaluation failed: {err}");
    }
    harness.output()
}

// Basics

#[test]
fn reassignment() {
    assert_eq!(eval("let x = 10\nx = x + 5\nx"), Value::Int(15));
}

#[test]
fn counted_for_prints_each_value() {
    assert_eq!(output("for let i = 0; i < 3; i++: print(i) end"), "0\n1\n2\n");
}

#[test]
fn function_call() {
    assert_eq!(eval("fn add(a, b): return a + b end\nadd(2, 3)"), Value::Int(5));
}

#[test]
fn last_expression_is_function_result() {
    assert_eq!(eval("fn add(a, b): a + b end\nadd(2, 3)"), Value::Int(5));
}

#[test]
fn task_wait() {
    assert_eq!(
        eval("task fn work(): return 42 end\nlet t = work()\nwait t"),
        Value::Int(42)
    );
}

#[test]
fn division_results() {
    assert_eq!(eval("7 / 2"), Value::Float(3.5));
    assert_eq!(eval("6 / 2"), Value::Int(3));
}

#[test]
fn string_concat_with_number() {
    assert_eq!(eval_text("\"n=\" + 3"), "n=3");
}

#[test]
fn compound_assignment() {
    assert_eq!(eval("let x = 2\nx += 3\nx *= 4\nx -= 1\nx"), Value::Int(19));
}

#[test]
fn update_expressions() {
    assert_eq!(
        eval_text("let i = 5\nlet a = i++\nlet b = ++i\nlet c = i--\n[a, b, c, i]"),
        "[5, 7, 7, 6]"
    );
}

#[test]
fn update_rejects_strings() {
    let err = eval_err("let s = \"a\"\ns++");
    assert_eq!(err.kind, EvalErrorKind::TypeMismatch);
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(eval("false and missing()"), Value::Bool(false));
    assert_eq!(eval("true or missing()"), Value::Bool(true));
    assert_eq!(eval("true and 1"), Value::Bool(false));
    assert_eq!(eval("false || true"), Value::Bool(true));
}

#[test]
fn typeof_reports_type_names() {
    assert_eq!(
        eval_text("[typeof 1, typeof 1.5, typeof \"s\", typeof nil, typeof print, typeof time, typeof {a: 1}, typeof []]"),
        "[\"int\", \"float\", \"string\", \"nil\", \"func\", \"module\", \"object\", \"array\"]"
    );
}

#[test]
fn print_variadic() {
    assert_eq!(output("print(1, \"a\", [1, \"b\"], 2.0)"), "1 a [1, \"b\"] 2\n");
}

// Scope rules

#[test]
fn undefined_variable() {
    let err = eval_err("y + 1");
    assert_eq!(err.kind, EvalErrorKind::Undefined);
    assert_eq!(err.message, "variable y is not defined");
}

#[test]
fn redeclaration_fails() {
    let err = eval_err("let a = 1\nlet a = 2");
    assert_eq!(err.kind, EvalErrorKind::AlreadyDeclared);
}

#[test]
fn redeclaration_in_nested_block_fails() {
    let err = eval_err("let a = 1\nif true: let a = 2 end");
    assert_eq!(err.kind, EvalErrorKind::AlreadyDeclared);
}

#[test]
fn block_declarations_do_not_leak() {
    let err = eval_err("if true: let z = 1 end\nz");
    assert_eq!(err.kind, EvalErrorKind::Undefined);
}

#[test]
fn const_violation_keeps_value() {
    let harness = Harness::new();
    let err = harness.eval("cst x = 1\nx = 2").unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::ConstViolation);
    assert_eq!(err.message, "constant x cannot be reassigned");
    let location = err.location.unwrap();
    assert_eq!((location.line, location.column), (2, 1));
}

#[test]
fn const_checked_at_owner() {
    let err = eval_err("cst limit = 3\nfn bump(): limit = 4 end\nbump()");
    assert_eq!(err.kind, EvalErrorKind::ConstViolation);
}

#[test]
fn parameter_shadows_outer_binding() {
    assert_eq!(
        eval("let a = 1\nfn f(a): return a * 2 end\n[f(5), a]").to_string(),
        "[10, 1]"
    );
}

#[test]
fn closures_are_lexical() {
    let source = "let x = 1\nfn show(): return x end\nfn call(x): return show() end\ncall(2)";
    assert_eq!(eval(source), Value::Int(1));
}

#[test]
fn closure_outlives_call() {
    let source = "fn make():\n  let n = 10\n  fn get(): return n end\n  return get\nend\nlet g = make()\ng()";
    assert_eq!(eval(source), Value::Int(10));
}

#[test]
fn closure_counter() {
    let source = "fn counter():\n  let c = 0\n  return fn(): c = c + 1\n    return c\n  end\nend\nlet tick = counter()\ntick()\ntick()";
    assert_eq!(eval(source), Value::Int(2));
}

// Control flow

#[test]
fn if_non_bool_takes_else() {
    assert_eq!(eval("if 1: 2 else: 3 end"), Value::Int(3));
    assert_eq!(eval("if nil: 2 end"), Value::Nil);
}

#[test]
fn if_test_error_takes_else() {
    assert_eq!(eval("if missing > 1: 1 else: 2 end"), Value::Int(2));
}

#[test]
fn else_if_chain() {
    let source = "let x = 5\nif x < 3: \"small\" else if x < 10: \"medium\" else: \"large\" end";
    assert_eq!(eval_text(source), "medium");
}

#[test]
fn switch_matches_first_case() {
    let source = "let x = 3\nlet r = 0\nswitch x:\ncase 1, 2: r = 1\ncase 3: r = 3\ndefault: r = 9\nend\nr";
    assert_eq!(eval(source), Value::Int(3));
}

#[test]
fn switch_default_and_numeric_match() {
    let source = "let r = 0\nswitch 7:\ncase 1: r = 1\ndefault: r = 9\nend\nr";
    assert_eq!(eval(source), Value::Int(9));
    let source = "let r = 0\nswitch 2.0:\ncase 2: r = 2\nend\nr";
    assert_eq!(eval(source), Value::Int(2));
}

#[test]
fn break_and_continue() {
    let source = "let s = 0\nfor let i = 0; i < 10; i++:\n  if i == 5: break end\n  if i % 2 == 0: continue end\n  s += i\nend\ns";
    assert_eq!(eval(source), Value::Int(4));
}

#[test]
fn return_from_inside_loop() {
    let source = "fn find(items, x):\n  for v in items:\n    if v == x: return true end\n  end\n  return false\nend\n[find([1, 2], 2), find([1, 2], 3)]";
    assert_eq!(eval_text(source), "[true, false]");
}

#[test]
fn break_outside_loop() {
    let err = eval_err("break");
    assert_eq!(err.kind, EvalErrorKind::InvalidControlFlow);
    let err = eval_err("fn f(): continue end\nf()");
    assert_eq!(err.kind, EvalErrorKind::InvalidControlFlow);
}

#[test]
fn range_for_over_array_string_object() {
    assert_eq!(eval("let s = 0\nfor x in [1, 2, 3]: s += x end\ns"), Value::Int(6));
    assert_eq!(
        eval_text("let out = \"\"\nfor c in \"abc\": out = c + out end\nout"),
        "cba"
    );
    assert_eq!(output("for k in {a: 1, b: 2}: print(k) end"), "a\nb\n");
}

#[test]
fn range_for_rejects_numbers() {
    let err = eval_err("for x in 5: print(x) end");
    assert_eq!(err.message, "cannot iterate over int");
}

#[test]
fn simple_loop_reuses_header_scope() {
    let harness = Harness::new();
    let value = harness
        .eval("let n = 0\nfor let i = 0; i < 100; i++: n = n + i end\nn")
        .unwrap();
    assert_eq!(value, Value::Int(4950));
    // Program root and the loop header; no per-iteration frames.
    assert_eq!(harness.interp.arena().stats().slots, 2);
}

#[test]
fn declaring_loop_gets_fresh_scope_per_iteration() {
    let harness = Harness::new();
    harness
        .eval("for let i = 0; i < 3; i++:\n  let y = i * 2\n  print(y)\nend")
        .unwrap();
    assert_eq!(harness.output(), "0\n2\n4\n");
    // The iteration frame is recycled, so one slot serves every pass.
    assert_eq!(harness.interp.arena().stats().slots, 3);

    let err = eval_err("for let i = 0; i < 2; i++: let y = i end\ny");
    assert_eq!(err.kind, EvalErrorKind::Undefined);
}

#[test]
fn recursion() {
    let source = "fn fact(n):\n  if n <= 1: return 1 end\n  return n * fact(n - 1)\nend\nfact(10)";
    assert_eq!(eval(source), Value::Int(3_628_800));
}

#[test]
fn recursion_limit() {
    let printer = buffer_handler();
    let interp = InterpreterBuilder::new()
        .print_handler(printer)
        .loader(MemoryLoader::new())
        .max_depth(50)
        .build();
    let err = interp
        .run_source("main.vine", "fn f(n): return f(n + 1) end\nf(0)")
        .unwrap_err();
    assert!(err.message.contains("maximum recursion depth exceeded"));
}

// Calls and errors

#[test]
fn not_a_function() {
    let err = eval_err("let x = 1\nx()");
    assert_eq!(err.kind, EvalErrorKind::NotAFunction);
    assert_eq!(err.message, "variable x is not a function");
}

#[test]
fn arity_mismatch() {
    let err = eval_err("fn f(a): end\nf()");
    assert_eq!(err.kind, EvalErrorKind::Arity);
    assert_eq!(err.message, "function f expects 1 argument, got 0");
}

#[test]
fn divide_by_zero_location() {
    let interp = InterpreterBuilder::new()
        .print_handler(buffer_handler())
        .loader(MemoryLoader::new())
        .build();
    let err = interp
        .run_source("main.vine", "let a = 1\nlet b = a / 0")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "[Line 2, Column 9] Interpreter Error: Divide by zero"
    );
}

#[test]
fn error_located_inside_function() {
    let err = eval_err("fn f():\n  return 1 / 0\nend\nf()");
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    let location = err.location.unwrap();
    assert_eq!((location.line, location.column), (2, 10));
}

#[test]
fn syntax_error_is_reported() {
    let interp = InterpreterBuilder::new()
        .print_handler(buffer_handler())
        .loader(MemoryLoader::new())
        .build();
    let err = interp.run_source("main.vine", "let = 1").unwrap_err();
    assert!(err.to_string().contains("Parser Error"));
}

// Objects, arrays, mounts

#[test]
fn object_access_and_update() {
    let source = "let o = {a: 1, b: {c: 2}}\no.a = 5\no[\"d\"] = 4\n[o.a, o.b.c, o[\"a\"], o.d]";
    assert_eq!(eval_text(source), "[5, 2, 5, 4]");
}

#[test]
fn missing_property() {
    let err = eval_err("let o = {a: 1}\no.z");
    assert_eq!(err.kind, EvalErrorKind::NotFound);
    let err = eval_err("let n = 1\nn.z");
    assert_eq!(err.message, "cannot read property z of int");
}

#[test]
fn duplicate_object_key() {
    let err = eval_err("{a: 1, a: 2}");
    assert_eq!(err.message, "key a is already defined");
}

#[test]
fn prototype_lookup() {
    let source = "let base = {greet: \"hi\"}\nlet o = {__proto__: base, name: \"o\"}\n[o.greet, o.name]";
    assert_eq!(eval_text(source), "[\"hi\", \"o\"]");
}

#[test]
fn array_index_and_length() {
    assert_eq!(eval("let a = [1, 2, 3]\na[1] = 20\na[1] + a.length"), Value::Int(23));
    assert_eq!(eval_text("\"héllo\"[1]"), "é");
    let err = eval_err("let a = [1, 2, 3]\na[5]");
    assert_eq!(err.kind, EvalErrorKind::IndexOutOfRange);
    assert_eq!(err.message, "index 5 out of range for length 3");
}

#[test]
fn arrays_are_shared() {
    assert_eq!(eval_text("let a = [1]\nlet b = a\npush(b, 2)\na"), "[1, 2]");
}

#[test]
fn mount_reads_object() {
    assert_eq!(eval("let o = {a: 1, b: 2}\no.(a + b)"), Value::Int(3));
}

#[test]
fn mount_prefers_lexical_bindings() {
    assert_eq!(eval("let a = 10\nlet o = {a: 1}\no.(a)"), Value::Int(10));
}

#[test]
fn mount_assignment_lands_on_object() {
    assert_eq!(eval_text("let o = {a: 1}\no.(c = 5)\no.(a = 7)\no"), "{\"a\": 7, \"c\": 5}");
}

#[test]
fn mount_module_is_read_only() {
    let err = eval_err("time.(now = 1)");
    assert_eq!(err.kind, EvalErrorKind::InvalidModule);
}

#[test]
fn global_object() {
    assert_eq!(eval("GLOBAL.x = 3\nGLOBAL.x"), Value::Int(3));
    let err = eval_err("GLOBAL = 1");
    assert_eq!(err.kind, EvalErrorKind::ConstViolation);
}

// Tasks and continuations

#[test]
fn task_arguments() {
    assert_eq!(eval("task fn double(x): return x * 2 end\nwait double(21)"), Value::Int(42));
}

#[test]
fn task_value() {
    assert_eq!(
        eval_text("task fn work(): return 1 end\nlet t = work()\ntypeof t"),
        "task"
    );
}

#[test]
fn failed_task_yields_nil() {
    assert_eq!(eval("task fn boom(): return 1 / 0 end\nwait boom()"), Value::Nil);
}

#[test]
fn wait_on_plain_value() {
    assert_eq!(eval("wait 5"), Value::Int(5));
}

#[test]
fn chain_links_pass_results() {
    let source = "task fn work(): return 20 end\nlet c = work() to (r): r + 1 to (s): s * 2 end\nwait c";
    assert_eq!(eval(source), Value::Int(42));
}

#[test]
fn chain_catch_receives_error() {
    let source = "task fn boom(): return 1 / 0 end\nlet c = boom() to (r): r + 1 catch (e): e.message end\nwait c";
    assert_eq!(eval_text(source), "Divide by zero");
}

#[test]
fn chain_link_error_goes_to_catch() {
    let source = "task fn work(): return 1 end\nwait work() to (r): missing catch (e): [typeof e, e.kind] end";
    assert_eq!(eval_text(source), "[\"error\", \"Undefined\"]");
}

#[test]
fn chain_without_catch_swallows() {
    let source = "task fn boom(): return 1 / 0 end\nwait boom() to (r): r end";
    assert_eq!(eval(source), Value::Nil);
}

#[test]
fn chain_on_plain_function() {
    assert_eq!(eval("fn plain(): return 5 end\nwait plain() to (r): r + 1 end"), Value::Int(6));
}

#[test]
fn chain_on_function_returning_task_binds_task_result() {
    let source = "task fn work(): return 41 end\n\
                  fn wrap(): return work() end\n\
                  wait wrap() to (r): r + 1 catch (e): e.message end";
    assert_eq!(eval(source), Value::Int(42));
}

#[test]
fn chain_on_existing_task_routes_failure_to_catch() {
    let source = "task fn boom(): return 1 / 0 end\n\
                  let t = boom()\n\
                  fn pending(): return t end\n\
                  wait pending() to (r): \"ran\" catch (e): e.message end";
    assert_eq!(eval(source), Value::from("Divide by zero"));
}

#[test]
fn chain_on_finished_failed_task_routes_failure_to_catch() {
    let source = "task fn boom(): return 1 / 0 end\n\
                  let t = boom()\n\
                  wait t\n\
                  fn finished(): return t end\n\
                  wait finished() to (r): \"ran\" catch (e): e.message end";
    assert_eq!(eval(source), Value::from("Divide by zero"));
}

#[test]
fn program_end_joins_continuations() {
    let source = "task fn work(): return 1 end\nwork() to (r):\n  time.sleep(10)\n  print(r + 1)\nend";
    assert_eq!(output(source), "2\n");
}

#[test]
fn failed_program_still_joins_tasks() {
    let harness = Harness::new();
    let source = "task fn slow():\n  time.sleep(20)\n  print(\"done\")\nend\nslow()\n1 / 0";
    let err = harness.eval(source).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    assert_eq!(harness.output(), "done\n");
    assert!(harness.interp.tasks().is_empty());
}

#[test]
fn tasks_share_global() {
    assert_eq!(
        eval("task fn set(): GLOBAL.x = 1 end\nwait set()\nGLOBAL.x"),
        Value::Int(1)
    );
}

#[test]
fn task_in_loop_keeps_its_scope() {
    let source = "let results = []\nfor let i = 0; i < 4; i++:\n  task fn square(n): return n * n end\n  push(results, square(i))\nend\nlet out = []\nfor t in results: push(out, wait t) end\nout";
    assert_eq!(eval_text(source), "[0, 1, 4, 9]");
}

// Modules

fn math_loader() -> MemoryLoader {
    MemoryLoader::new().with_file(
        "/w/math.vine",
        "expose cst PI = 3\nexpose fn double(x): return x * 2 end\nlet hidden = 1",
    )
}

fn eval_with(loader: MemoryLoader, source: &str) -> EvalResult {
    Harness::with_loader(loader).eval(source)
}

#[test]
fn use_alias() {
    assert_eq!(
        eval_with(math_loader(), "use \"math\" as m\nm.double(m.PI)").unwrap(),
        Value::Int(6)
    );
}

#[test]
fn use_pick() {
    assert_eq!(
        eval_with(math_loader(), "use \"math\" pick (double as dbl, PI)\ndbl(PI)").unwrap(),
        Value::Int(6)
    );
}

#[test]
fn use_all_imports_exports_only() {
    assert_eq!(
        eval_with(math_loader(), "use \"math\"\ndouble(PI)").unwrap(),
        Value::Int(6)
    );
    let err = eval_with(math_loader(), "use \"math\"\nhidden").unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Undefined);
}

#[test]
fn use_builtin_module() {
    assert_eq!(eval_text("use time as t\ntypeof t.now()"), "int");
    assert_eq!(eval_text("use \"time\" pick milli\ntypeof milli()"), "int");
}

#[test]
fn missing_module_and_member() {
    let err = eval_err("use \"nope\"");
    assert_eq!(err.kind, EvalErrorKind::InvalidModule);
    assert_eq!(err.message, "module nope is not defined or file not found");

    let err = eval_with(math_loader(), "use \"math\" pick tau").unwrap_err();
    assert_eq!(err.message, "module math has no member tau");
}

#[test]
fn modules_are_read_only() {
    let err = eval_with(math_loader(), "use \"math\" as m\nm.PI = 4").unwrap_err();
    assert_eq!(err.message, "module math is read-only");
}

#[test]
fn module_runs_once() {
    let loader = MemoryLoader::new().with_file("/w/noisy.vine", "print(\"loaded\")\nexpose x = 1");
    let harness = Harness::with_loader(loader);
    let value = harness
        .eval("use \"noisy\" as a\nuse \"noisy\" as b\na.x + b.x")
        .unwrap();
    assert_eq!(value, Value::Int(2));
    assert_eq!(harness.output(), "loaded\n");
}

#[test]
fn circular_import() {
    let loader = MemoryLoader::new()
        .with_file("/w/a.vine", "use \"b\"\nexpose x = 1")
        .with_file("/w/b.vine", "use \"a\"\nexpose y = 2");
    let err = eval_with(loader, "use \"a\"").unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::InvalidModule);
    assert!(err.message.contains("circular import"));
    assert_eq!(&*err.location.unwrap().file, "/w/b.vine");
}

#[test]
fn concurrent_import_waits_for_loading_module() {
    let loader = MemoryLoader::new()
        .with_file("/w/slow.vine", "print(\"loading\")\ntime.sleep(200)\nexpose x = 1");
    let harness = Harness::with_loader(loader);
    let source = "task fn early(): use \"slow\" as s\nreturn s.x end\n\
                  let t = early()\n\
                  time.sleep(50)\n\
                  use \"slow\" as m\n\
                  let r = wait t\n\
                  m.x + r";
    assert_eq!(harness.eval(source), Ok(Value::Int(2)));
    assert_eq!(harness.output(), "loading\n");
}

#[test]
fn import_chain_through_shared_module_is_not_circular() {
    let loader = MemoryLoader::new()
        .with_file("/w/a.vine", "use \"base\" pick n\nexpose a = n")
        .with_file("/w/b.vine", "use \"base\" pick n\nuse \"a\" pick a\nexpose b = n + a")
        .with_file("/w/base.vine", "expose n = 1");
    assert_eq!(eval_with(loader, "use \"b\" pick b\nb").unwrap(), Value::Int(2));
}

#[test]
fn module_relative_imports() {
    let loader = MemoryLoader::new()
        .with_file("/w/lib/util.vine", "use \"helper\" pick base\nexpose value = base + 1")
        .with_file("/w/lib/helper.vine", "expose base = 41");
    assert_eq!(
        eval_with(loader, "use \"lib/util\" as u\nu.value").unwrap(),
        Value::Int(42)
    );
}

#[test]
fn module_syntax_error_points_into_module() {
    let loader = MemoryLoader::new().with_file("/w/bad.vine", "let = 1");
    let err = eval_with(loader, "use \"bad\"").unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::InvalidModule);
    let location = err.location.unwrap();
    assert_eq!(&*location.file, "/w/bad.vine");
    assert_eq!(location.line, 1);
}

#[test]
fn expose_round_trip() {
    let loader = MemoryLoader::new().with_file(
        "/w/counter.vine",
        "let count = 41\ncount = count + 1\nexpose count",
    );
    assert_eq!(
        eval_with(loader, "use \"counter\" pick count\ncount").unwrap(),
        Value::Int(42)
    );
}

#[test]
fn expose_with_value_updates_existing() {
    let loader = MemoryLoader::new().with_file("/w/cfg.vine", "let level = 1\nexpose level = 3");
    assert_eq!(
        eval_with(loader, "use \"cfg\" as c\nc.level").unwrap(),
        Value::Int(3)
    );
}

#[test]
fn expose_undefined() {
    let err = eval_err("expose ghost");
    assert_eq!(err.message, "cannot expose ghost: it is not defined");
}

#[test]
fn exports_collected_on_root() {
    let harness = Harness::new();
    let source = "expose let a = 1\nfn inner(): expose b = 2 end\ninner()";
    let program = vine_parse::parse_source(source, harness.interp.interner()).unwrap();
    let context = harness.interp.context("main.vine", source);
    let env = harness.interp.new_root(Arc::clone(&context));
    harness.interp.eval_safe(&program, &env, &context).unwrap();
    let exports = harness.interp.arena().exports(&env).unwrap();
    assert_eq!(exports.get("a"), Some(Value::Int(1)));
    assert_eq!(exports.get("b"), Some(Value::Int(2)));
}
