//! End-to-end tests: full pipeline (scan → parse → resolve → interpret) with
//! program output captured in memory.

use {
    loxide::{interpreter::Interpreter, output::Output, report},
    pretty_assertions::assert_eq,
    std::{cell::RefCell, rc::Rc},
};

fn run_with(source: &str, is_repl: bool) -> String {
    report::clear();
    let buffer = Rc::new(RefCell::new(String::new()));
    let mut interpreter = Interpreter::new(Output::Capture(buffer.clone()));
    interpreter.is_repl = is_repl;
    if let Err(e) = loxide::run(&mut interpreter, source, 0) {
        report::runtime_error(&e);
    }
    let output = buffer.borrow().clone();
    output
}

fn run(source: &str) -> String {
    run_with(source, false)
}

/// Run expecting a clean program: no static and no runtime diagnostics.
fn run_ok(source: &str) -> String {
    let output = run(source);
    assert!(!report::had_error(), "unexpected static error");
    assert!(!report::had_runtime_error(), "unexpected runtime error");
    output
}

/// Run expecting the program to die with a runtime error.
fn run_runtime_error(source: &str) -> String {
    let output = run(source);
    assert!(!report::had_error(), "expected a clean front end");
    assert!(report::had_runtime_error(), "expected a runtime error");
    output
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(run_ok("print (1 + 2) * 3 - 4 / 2;"), "7\n");
}

#[test]
fn closures_preserve_bindings() {
    let source = "
        fun makeCounter() { var i = 0; fun c() { i = i + 1; return i; } return c; }
        var c = makeCounter();
        print c(); print c(); print c();
    ";
    assert_eq!(run_ok(source), "1\n2\n3\n");
}

#[test]
fn inheritance_and_super() {
    let source = "
        class A { greet() { print \"A\"; } }
        class B < A { greet() { super.greet(); print \"B\"; } }
        B().greet();
    ";
    assert_eq!(run_ok(source), "A\nB\n");
}

#[test]
fn initializer_discipline() {
    let source = "
        class P { init(x) { this.x = x; } }
        var p = P(3);
        print p.x;
        print p.init(5).x;
    ";
    assert_eq!(run_ok(source), "3\n5\n");
}

#[test]
fn runtime_error_halts_the_program() {
    let output = run_runtime_error("var a = \"s\"; print -a;");
    assert_eq!(output, "");
}

#[test]
fn for_loop_increment_semantics() {
    assert_eq!(run_ok("for (var i = 0; i < 3; i = i + 1) print i;"), "0\n1\n2\n");
}

#[test]
fn zero_and_empty_string_are_truthy() {
    assert_eq!(run_ok("if (0) print \"t\"; else print \"f\";"), "t\n");
    assert_eq!(run_ok("if (\"\") print \"t\"; else print \"f\";"), "t\n");
    assert_eq!(run_ok("if (nil) print \"t\"; else print \"f\";"), "f\n");
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    assert_eq!(run_ok("print \"hi\" or 2;"), "hi\n");
    assert_eq!(run_ok("print nil or \"yes\";"), "yes\n");
    assert_eq!(run_ok("print nil and 2;"), "nil\n");
    assert_eq!(run_ok("print 1 and 2;"), "2\n");
}

#[test]
fn short_circuit_skips_the_right_operand() {
    let source = "
        var touched = \"no\";
        fun touch() { touched = \"yes\"; return true; }
        var ignored = false and touch();
        print touched;
    ";
    assert_eq!(run_ok(source), "no\n");
}

#[test]
fn comma_yields_the_right_operand() {
    assert_eq!(run_ok("print (1, 2);"), "2\n");
}

#[test]
fn conditional_evaluates_only_the_taken_branch() {
    let source = "
        fun boom() { return missing_global; }
        print 1 < 2 ? \"a\" : boom();
    ";
    assert_eq!(run_ok(source), "a\n");
}

#[test]
fn permissive_plus_stringifies_around_strings() {
    assert_eq!(run_ok("print \"n=\" + 4;"), "n=4\n");
    assert_eq!(run_ok("print 4 + \"!\";"), "4!\n");
    assert_eq!(run_ok("print 1 + 2 + \"s\";"), "3s\n");
    assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
    assert_eq!(run_ok("print \"v: \" + true + nil;"), "v: truenil\n");
}

#[test]
fn plus_on_incompatible_operands_errors() {
    run_runtime_error("print true + 1;");
}

#[test]
fn division_by_zero_errors() {
    run_runtime_error("print 1 / 0;");
}

#[test]
fn comparisons_require_numbers() {
    run_runtime_error("print \"a\" < \"b\";");
    assert_eq!(run_ok("print 2 >= 2;"), "true\n");
}

#[test]
fn equality_never_errors() {
    assert_eq!(
        run_ok("print 1 == 1; print \"a\" == \"a\"; print nil == nil; print 1 == \"1\";"),
        "true\ntrue\ntrue\nfalse\n"
    );
    assert_eq!(run_ok("print nil == false;"), "false\n");
}

#[test]
fn callables_compare_by_identity() {
    let source = "
        fun f() {}
        fun g() {}
        var h = f;
        print f == h;
        print f == g;
        class C {}
        var a = C();
        var b = C();
        print a == a;
        print a == b;
    ";
    assert_eq!(run_ok(source), "true\nfalse\ntrue\nfalse\n");
}

#[test]
fn integer_valued_floats_print_without_decimals() {
    assert_eq!(run_ok("print 7.0; print 2.5; print 100.00;"), "7\n2.5\n100\n");
}

#[test]
fn unassigned_read_is_a_runtime_error() {
    run_runtime_error("var a; print a;");
}

#[test]
fn assignment_cures_the_unassigned_state() {
    assert_eq!(run_ok("var a; a = 3; print a;"), "3\n");
}

#[test]
fn explicit_nil_initializer_is_readable() {
    assert_eq!(run_ok("var a = nil; print a;"), "nil\n");
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    run_runtime_error("print missing;");
}

#[test]
fn wrong_arity_is_a_runtime_error() {
    run_runtime_error("fun f(a) {} f(1, 2);");
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    run_runtime_error("\"not a function\"();");
}

#[test]
fn instance_fields_and_methods() {
    let source = "
        class C { m() { return this.v * 2; } }
        var c = C();
        c.v = 21;
        print c.v;
        print c.m();
    ";
    assert_eq!(run_ok(source), "21\n42\n");
}

#[test]
fn undefined_property_is_a_runtime_error() {
    run_runtime_error("class C {} print C().missing;");
}

#[test]
fn property_access_on_non_instances_errors() {
    run_runtime_error("print (4).x;");
    run_runtime_error("4 . x = 1;");
}

#[test]
fn methods_fall_through_to_the_superclass() {
    let source = "
        class A { m() { return \"A\"; } }
        class B < A {}
        print B().m();
    ";
    assert_eq!(run_ok(source), "A\n");
}

#[test]
fn superclass_must_be_a_class() {
    run_runtime_error("var NotAClass = 1; class C < NotAClass {}");
}

#[test]
fn bare_return_in_initializer_still_yields_the_instance() {
    let source = "
        class P { init() { return; } }
        print P();
    ";
    assert_eq!(run_ok(source), "<P instance>\n");
}

#[test]
fn bound_methods_remember_their_instance() {
    let source = "
        class C { init(name) { this.name = name; } who() { print this.name; } }
        var m = C(\"left\").who;
        C(\"right\");
        m();
    ";
    assert_eq!(run_ok(source), "left\n");
}

#[test]
fn lambdas_are_first_class() {
    assert_eq!(run_ok("var f = fun (x) { return x * 2; }; print f(21);"), "42\n");
}

#[test]
fn lambdas_close_over_their_environment() {
    let source = "
        var base = 10;
        var add = fun (x) { return base + x; };
        print add(5);
    ";
    assert_eq!(run_ok(source), "15\n");
}

#[test]
fn recursion_works() {
    let source = "
        fun fib(n) { if (n <= 1) return n; return fib(n - 2) + fib(n - 1); }
        print fib(7);
    ";
    assert_eq!(run_ok(source), "13\n");
}

#[test]
fn break_leaves_the_nearest_loop() {
    let source = "for (var i = 0; i < 10; i = i + 1) { if (i == 2) break; print i; }";
    assert_eq!(run_ok(source), "0\n1\n");
}

#[test]
fn break_in_nested_loops_only_leaves_the_inner_one() {
    let source = "
        for (var i = 0; i < 2; i = i + 1) {
            for (var j = 0; j < 10; j = j + 1) {
                if (j == 1) break;
                print i + j;
            }
        }
    ";
    assert_eq!(run_ok(source), "0\n1\n");
}

#[test]
fn while_loops_run_their_condition() {
    assert_eq!(run_ok("var i = 3; while (i > 0) { print i; i = i - 1; }"), "3\n2\n1\n");
}

#[test]
fn closures_bind_statically_not_dynamically() {
    let source = "
        var a = \"global\";
        {
            fun show() { print a; }
            show();
            var a = \"block\";
            show();
        }
    ";
    assert_eq!(run_ok(source), "global\nglobal\n");
}

#[test]
fn block_scopes_shadow_and_restore() {
    let source = "
        var a = \"outer\";
        { var a = \"inner\"; print a; }
        print a;
    ";
    assert_eq!(run_ok(source), "inner\nouter\n");
}

#[test]
fn value_stringification() {
    let source = "
        class C {}
        fun f() {}
        print C;
        print C();
        print f;
        print fun () {};
        print clock;
        print true;
        print nil;
    ";
    assert_eq!(
        run_ok(source),
        "C\n<C instance>\n<fn f>\n<anonymous fn>\n<native fn>\ntrue\nnil\n"
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(run_ok("print clock() > 0;"), "true\n");
}

#[test]
fn static_errors_prevent_execution() {
    let output = run("var 1 = 2; print 3;");
    assert!(report::had_error());
    assert!(!report::had_runtime_error());
    assert_eq!(output, "");
}

#[test]
fn resolver_errors_prevent_execution() {
    let output = run("print 1; return 2;");
    assert!(report::had_error());
    assert_eq!(output, "");
}

#[test]
fn repl_echoes_bare_expression_statements() {
    assert_eq!(run_with("1 + 2;", true), "3\n");
}

#[test]
fn file_mode_does_not_echo_expression_statements() {
    assert_eq!(run_ok("1 + 2;"), "");
}

#[test]
fn repl_side_table_survives_offset_lines() {
    // Two pipeline runs over one interpreter, the way the REPL drives it:
    // later lines get growing scan offsets, so reference identities stay
    // distinct and earlier resolutions stay valid.
    report::clear();
    let buffer = Rc::new(RefCell::new(String::new()));
    let mut interpreter = Interpreter::new(Output::Capture(buffer.clone()));
    interpreter.is_repl = true;

    let first = "fun twice(x) { return x + x; }";
    loxide::run(&mut interpreter, first, 0).unwrap();
    let second = "print twice(4);";
    loxide::run(&mut interpreter, second, first.len() + 1).unwrap();

    assert!(!report::had_error());
    assert_eq!(*buffer.borrow(), "8\n");
}
