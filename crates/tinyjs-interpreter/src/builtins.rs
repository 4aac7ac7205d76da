//! Built-in functions installed in the global frame.
//!
//! Binary operators in source text are sugar for calls to these bindings,
//! so `2 + 3` resolves `+` through the environment chain like any other
//! name. Rebinding an operator name is legal and takes effect immediately.

use std::cmp::Ordering;
use std::rc::Rc;

use smol_str::SmolStr;
use tinyjs_lexer::Span;

use crate::environment::EnvRef;
use crate::eval::Interpreter;
use crate::value::{BuiltinFn, NativeFn, Value};
use crate::{Failure, Result};

/// Populate a fresh global frame with the bootstrap bindings: `global`
/// itself, `print`, and the operator functions.
pub(crate) fn install(globals: &EnvRef) {
    let mut frame = globals.borrow_mut();
    // the global frame is reachable from scripts as an object
    frame.register(SmolStr::new("global"), Value::Env(globals.clone()));

    let mut register = |name: &str, func: NativeFn| {
        frame.register(
            SmolStr::new(name),
            Value::Builtin(Rc::new(BuiltinFn {
                name: SmolStr::new(name),
                func,
            })),
        );
    };

    register("print", builtin_print);
    register("+", builtin_add);
    register("-", builtin_sub);
    register("*", builtin_mul);
    register("/", builtin_div);
    register("%", builtin_rem);
    register("==", builtin_eq);
    register("!=", builtin_ne);
    register("<", builtin_lt);
    register("<=", builtin_le);
    register(">", builtin_gt);
    register(">=", builtin_ge);
}

/// Print form of a value: strings print their raw content, everything else
/// prints its display form.
fn stringify(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn builtin_print(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    if interp.trace() {
        eprintln!("print called with {:?}", args);
    }
    let line = args.iter().map(stringify).collect::<Vec<_>>().join(" ");
    writeln!(interp.out(), "{}", line)
        .map_err(|e| Failure::new(format!("print failed: {}", e), Span::dummy()))?;
    Ok(Value::Undefined)
}

/// Extract the two integer operands of an arithmetic builtin. Missing
/// arguments are a host bug, not a script error; wrong types are a script
/// error.
fn int_operands(op: &str, args: &[Value]) -> Result<(i64, i64)> {
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        (a, b) => Err(Failure::new(
            format!("cannot {} {} and {}", op, a.type_name(), b.type_name()),
            Span::dummy(),
        )),
    }
}

fn builtin_add(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    let (a, b) = int_operands("+", args)?;
    Ok(Value::Int(a + b))
}

fn builtin_sub(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    let (a, b) = int_operands("-", args)?;
    Ok(Value::Int(a - b))
}

fn builtin_mul(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    let (a, b) = int_operands("*", args)?;
    Ok(Value::Int(a * b))
}

fn builtin_div(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    let (a, b) = int_operands("/", args)?;
    Ok(Value::Int(a / b))
}

fn builtin_rem(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    let (a, b) = int_operands("%", args)?;
    Ok(Value::Int(a % b))
}

fn bool_int(b: bool) -> Value {
    Value::Int(if b { 1 } else { 0 })
}

fn builtin_eq(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    Ok(bool_int(args[0] == args[1]))
}

fn builtin_ne(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    Ok(bool_int(args[0] != args[1]))
}

/// Ordering for `<` and friends: integers by value, strings
/// lexicographically, nothing else is ordered.
fn ordering(op: &str, args: &[Value]) -> Result<Ordering> {
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (a, b) => Err(Failure::new(
            format!("cannot compare {} and {} with {}", a.type_name(), b.type_name(), op),
            Span::dummy(),
        )),
    }
}

fn builtin_lt(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    Ok(bool_int(ordering("<", args)? == Ordering::Less))
}

fn builtin_le(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    Ok(bool_int(ordering("<=", args)? != Ordering::Greater))
}

fn builtin_gt(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    Ok(bool_int(ordering(">", args)? == Ordering::Greater))
}

fn builtin_ge(_: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    Ok(bool_int(ordering(">=", args)? != Ordering::Less))
}
