//! End-to-end tests: parse a source script, interpret it, and check what
//! `print` wrote (or which failure stopped the script).

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tinyjs_interpreter::Interpreter;
use tinyjs_parser::parse;

/// Print sink the test keeps a handle to after handing it to the
/// interpreter.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("print wrote invalid utf-8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn eval(source: &str) -> (tinyjs_interpreter::Result<()>, String) {
    let script = parse(source).expect("script should parse");
    let buf = SharedBuf::default();
    let mut interp = Interpreter::with_output(Box::new(buf.clone()));
    let result = interp.interpret(&script);
    (result, buf.contents())
}

/// Run a script that must succeed; return everything it printed.
fn run(source: &str) -> String {
    let (result, output) = eval(source);
    result.expect("script should run");
    output
}

/// Run a script that must fail; return the failure message.
fn fail(source: &str) -> String {
    let (result, _) = eval(source);
    result.expect_err("script should fail").message
}

mod printing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_joins_arguments_with_spaces() {
        assert_eq!(run(r#"print("a", "b");"#), "a b\n");
    }

    #[test]
    fn test_print_strings_without_quotes() {
        assert_eq!(run(r#"print("hello");"#), "hello\n");
    }

    #[test]
    fn test_print_no_arguments_prints_empty_line() {
        assert_eq!(run("print();"), "\n");
    }

    #[test]
    fn test_print_returns_undefined() {
        assert_eq!(run(r#"print(print("x"));"#), "x\nundefined\n");
    }

    #[test]
    fn test_print_object_shows_fields_in_order() {
        let output = run("var o = { b: 1, a: 2 }; print(o);");
        assert_eq!(output, "{ b: 1, a: 2, this: ... }\n");
    }
}

mod variables {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_declaration_then_access() {
        assert_eq!(run("var a = 3; print(a);"), "3\n");
    }

    #[test]
    fn test_unbound_variable_reads_as_undefined() {
        assert_eq!(run("print(missing);"), "undefined\n");
    }

    #[test]
    fn test_redeclaration_fails() {
        assert_eq!(fail("var a = 1; var a = 2;"), "a already defined");
    }

    #[test]
    fn test_redeclaration_of_builtin_fails() {
        assert_eq!(fail("var print = 3;"), "print already defined");
    }

    #[test]
    fn test_assignment_rebinds_in_place() {
        assert_eq!(run("var a = 1; a = 2; print(a);"), "2\n");
    }

    #[test]
    fn test_assignment_to_undeclared_name_creates_it() {
        // plain assignment never checks for a prior declaration
        assert_eq!(run("a = 7; print(a);"), "7\n");
    }
}

mod arithmetic {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operators_and_precedence() {
        assert_eq!(run("print(2 + 3 * 4 - 10 / 2 % 3);"), "12\n");
    }

    #[test]
    fn test_comparisons_yield_int_booleans() {
        assert_eq!(run("print(1 < 2, 2 <= 1, 3 > 2, 1 >= 2);"), "1 0 1 0\n");
        assert_eq!(run("print(1 == 1, 1 != 1);"), "1 0\n");
    }

    #[test]
    fn test_adding_string_fails() {
        assert_eq!(fail(r#"print(1 + "x");"#), "cannot + int and string");
    }

    #[test]
    fn test_operator_is_an_ordinary_binding() {
        // `+` resolves through the environment like any name. It is not an
        // identifier in source syntax, so rebinding goes through the host
        // API.
        let script = parse("print(3 + 4);").expect("script should parse");
        let buf = SharedBuf::default();
        let mut interp = Interpreter::with_output(Box::new(buf.clone()));
        let mul = interp.globals().borrow().lookup("*");
        interp.globals().borrow_mut().register("+".into(), mul);
        interp.interpret(&script).expect("script should run");
        assert_eq!(buf.contents(), "12\n");
    }
}

mod conditionals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_true_branch() {
        assert_eq!(run("if (1 == 1) { print(10); } else { print(20); }"), "10\n");
    }

    #[test]
    fn test_false_branch() {
        assert_eq!(run("if (1 == 2) { print(10); } else { print(20); }"), "20\n");
    }

    #[test]
    fn test_missing_else_is_an_empty_block() {
        assert_eq!(run("if (1 == 2) { print(10); } print(30);"), "30\n");
    }

    #[test]
    fn test_condition_must_be_zero_or_one() {
        assert_eq!(fail("if (3) { print(1); }"), "invalid boolean value");
        assert_eq!(fail(r#"if ("yes") { print(1); }"#), "invalid boolean value");
        assert_eq!(fail("if (missing) { print(1); }"), "invalid boolean value");
    }
}

mod functions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_call_and_return() {
        let source = r#"
            function add1(n) { return n + 1; }
            print(add1(41));
        "#;
        assert_eq!(run(source), "42\n");
    }

    #[test]
    fn test_falling_off_the_end_returns_undefined() {
        let source = r#"
            function noop(n) { n + 1; }
            print(noop(1));
        "#;
        assert_eq!(run(source), "undefined\n");
    }

    #[test]
    fn test_bare_return_yields_undefined() {
        let source = r#"
            function f() { return; }
            print(f());
        "#;
        assert_eq!(run(source), "undefined\n");
    }

    #[test]
    fn test_wrong_arity_fails() {
        let source = r#"
            function f(a, b) { return a; }
            f(1);
        "#;
        assert_eq!(fail(source), "invalid number of arguments");
    }

    #[test]
    fn test_calling_a_non_function_fails() {
        assert_eq!(fail("var x = 3; x(1);"), "type error 3 is not a function");
    }

    #[test]
    fn test_callee_is_vetted_before_arguments_run() {
        // arguments of a doomed call must not leave side effects behind
        let (result, output) = eval(r#"var x = 3; x(print("side"));"#);
        assert_eq!(
            result.expect_err("script should fail").message,
            "type error 3 is not a function"
        );
        assert_eq!(output, "");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            function fact(n) {
                if (n == 0) { return 1; }
                return n * fact(n - 1);
            }
            print(fact(5));
        "#;
        assert_eq!(run(source), "120\n");
    }

    #[test]
    fn test_closure_captures_defining_frame() {
        let source = r#"
            function makeAdder(n) {
                return function(x) { return x + n; };
            }
            var add3 = makeAdder(3);
            print(add3(4));
        "#;
        assert_eq!(run(source), "7\n");
    }

    #[test]
    fn test_each_call_gets_a_fresh_frame() {
        let source = r#"
            function makeAdder(n) {
                return function(x) { return x + n; };
            }
            var add3 = makeAdder(3);
            var add10 = makeAdder(10);
            print(add3(1), add10(1));
        "#;
        assert_eq!(run(source), "4 11\n");
    }

    #[test]
    fn test_closure_mutation_is_visible_across_calls() {
        let source = r#"
            function makeCounter() {
                var count = 0;
                return function() {
                    count = count + 1;
                    return count;
                };
            }
            var tick = makeCounter();
            print(tick(), tick(), tick());
        "#;
        assert_eq!(run(source), "1 2 3\n");
    }

    #[test]
    fn test_parameter_shadows_outer_binding() {
        let source = r#"
            var n = 100;
            function f(n) { return n; }
            print(f(1), n);
        "#;
        assert_eq!(run(source), "1 100\n");
    }

    #[test]
    fn test_return_unwinds_nested_blocks_only_to_its_own_call() {
        let source = r#"
            function inner() { return 1; }
            function outer() {
                inner();
                return 2;
            }
            print(outer());
        "#;
        assert_eq!(run(source), "2\n");
    }

    #[test]
    fn test_this_is_undefined_in_a_free_call() {
        let source = r#"
            function f() { return this; }
            print(f());
        "#;
        assert_eq!(run(source), "undefined\n");
    }
}

mod objects {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_and_field_access() {
        let source = r#"
            var o = { x: 1, y: 2 };
            print(o.x, o.y);
        "#;
        assert_eq!(run(source), "1 2\n");
    }

    #[test]
    fn test_missing_field_reads_as_undefined() {
        assert_eq!(run("var o = { x: 1 }; print(o.y);"), "undefined\n");
    }

    #[test]
    fn test_field_assignment() {
        let source = r#"
            var o = { x: 1 };
            o.x = 2;
            o.z = 3;
            print(o.x, o.z);
        "#;
        assert_eq!(run(source), "2 3\n");
    }

    #[test]
    fn test_field_assignment_on_non_object_fails() {
        assert_eq!(fail("var x = 3; x.f = 1;"), "type error 3 is not an object");
    }

    #[test]
    fn test_receiver_is_vetted_before_assigned_value_runs() {
        let (result, output) = eval(r#"var x = 3; x.f = print("side");"#);
        assert_eq!(
            result.expect_err("script should fail").message,
            "type error 3 is not an object"
        );
        assert_eq!(output, "");
    }

    #[test]
    fn test_every_object_carries_its_own_this() {
        let source = r#"
            var o = { x: 1 };
            print(o.this == o);
        "#;
        assert_eq!(run(source), "1\n");
    }

    #[test]
    fn test_field_access_on_primitive_yields_the_receiver() {
        assert_eq!(run("var n = 5; print(n.x);"), "5\n");
        assert_eq!(run(r#"var s = "hi"; print(s.length);"#), "hi\n");
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let source = r#"
            var a = { x: 1 };
            var b = { x: 1 };
            print(a == b, a == a, a != b);
        "#;
        assert_eq!(run(source), "0 1 1\n");
    }
}

mod methods {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_method_call_binds_this_to_the_receiver() {
        let source = r#"
            var o = {
                x: 40,
                getX: function() { return this.x + 2; }
            };
            print(o.getX());
        "#;
        assert_eq!(run(source), "42\n");
    }

    #[test]
    fn test_extracted_method_loses_its_receiver() {
        let source = r#"
            var o = {
                x: 40,
                getX: function() { return this; }
            };
            var f = o.getX;
            print(f());
        "#;
        assert_eq!(run(source), "undefined\n");
    }

    #[test]
    fn test_method_added_after_construction() {
        let source = r#"
            var o = { x: 7 };
            o.getX = function() { return this.x; };
            print(o.getX());
        "#;
        assert_eq!(run(source), "7\n");
    }

    #[test]
    fn test_missing_method_fails() {
        let err = fail("var o = { x: 1 }; o.nope();");
        assert_eq!(
            err,
            "{ x: 1, this: ... } doesn't have a method called nope"
        );
    }

    #[test]
    fn test_non_callable_field_fails() {
        assert_eq!(fail("var o = { x: 1 }; o.x();"), "x is not a method");
    }

    #[test]
    fn test_method_call_on_primitive_fails() {
        assert_eq!(fail("var n = 3; n.f();"), "type error 3 is not an object");
    }
}

mod globals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_global_field_write_is_a_variable_binding() {
        assert_eq!(run("global.x = 3; print(x);"), "3\n");
    }

    #[test]
    fn test_global_field_read_sees_top_level_declarations() {
        assert_eq!(run("var y = 4; print(global.y);"), "4\n");
    }

    #[test]
    fn test_global_read_does_not_see_function_locals() {
        let source = r#"
            function f() {
                var local = 1;
                return global.local;
            }
            print(f());
        "#;
        assert_eq!(run(source), "undefined\n");
    }

    #[test]
    fn test_global_write_is_visible_inside_functions() {
        let source = r#"
            global.shared = 9;
            function f() { return shared; }
            print(f());
        "#;
        assert_eq!(run(source), "9\n");
    }
}

mod unwinding {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_level_return_fails() {
        assert_eq!(fail("return 1;"), "return outside function");
    }

    #[test]
    fn test_failure_stops_the_script() {
        let (result, output) = eval(r#"print("before"); missing(); print("after");"#);
        assert!(result.is_err());
        assert_eq!(output, "before\n");
    }
}
