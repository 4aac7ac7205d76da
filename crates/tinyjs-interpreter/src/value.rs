//! Runtime values.
//!
//! The source language has one non-primitive notion, "the object", worn in
//! three roles: record, function, and environment frame. Here each role is
//! an explicit shape of the [`Value`] sum so the evaluator dispatches on
//! exactly the shape it needs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tinyjs_ast::Block;

use crate::environment::EnvRef;
use crate::eval::Interpreter;

/// Shared handle to a record object.
pub type ObjRef = Rc<RefCell<ScriptObject>>;

/// Runtime values.
#[derive(Clone)]
pub enum Value {
    /// The absent value; unbound variables and valueless calls read as this
    Undefined,

    /// 64-bit signed integer. Also the language's only boolean: 1 is true,
    /// 0 is false, and anything else used as a condition is a type error.
    Int(i64),

    /// String value
    Str(SmolStr),

    /// Record object with ordered mutable fields
    Object(ObjRef),

    /// User-defined function closing over its defining environment
    Function(Rc<ScriptFunction>),

    /// Built-in function implemented in Rust
    Builtin(Rc<BuiltinFn>),

    /// An environment frame addressed as a value. Only the global frame is
    /// ever exposed this way, through the `global` binding.
    Env(EnvRef),
}

/// A record: a mutable, insertion-ordered mapping from field name to value.
#[derive(Default)]
pub struct ScriptObject {
    fields: IndexMap<SmolStr, Value>,
}

impl ScriptObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field.
    pub fn register(&mut self, name: SmolStr, value: Value) {
        self.fields.insert(name, value);
    }

    /// Read an own field. There is no prototype to fall back to; a missing
    /// field reads as [`Value::Undefined`].
    pub fn lookup(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or(Value::Undefined)
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&SmolStr, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A user-defined function: parameter list, body, and the environment that
/// was active at its definition (not at any call site).
pub struct ScriptFunction {
    pub name: SmolStr,
    pub params: Vec<SmolStr>,
    pub body: Block,
    pub closure: EnvRef,
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptFunction({})", self.name)
    }
}

/// Signature shared by all builtins: the interpreter (for the output sink),
/// the receiver, and the already-evaluated arguments. Builtins perform no
/// arity checking of their own.
pub type NativeFn = fn(&mut Interpreter, &Value, &[Value]) -> crate::Result<Value>;

/// A built-in function implemented in Rust.
pub struct BuiltinFn {
    pub name: SmolStr,
    pub func: NativeFn,
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFn({})", self.name)
    }
}

impl Value {
    /// Get the type name of this value, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Builtin(_) => "function",
            Value::Env(_) => "global",
        }
    }

    /// Whether this value carries an invocation capability.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Display form, guarding against the self-referential `this` field
    /// every object carries.
    fn fmt_guarded(
        &self,
        f: &mut fmt::Formatter<'_>,
        seen: &mut Vec<*const ScriptObject>,
    ) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Object(obj) => {
                let ptr = obj.as_ptr() as *const ScriptObject;
                if seen.contains(&ptr) {
                    return write!(f, "...");
                }
                seen.push(ptr);
                let obj = obj.borrow();
                if obj.is_empty() {
                    write!(f, "{{}}")?;
                } else {
                    write!(f, "{{ ")?;
                    for (i, (k, v)) in obj.fields().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: ", k)?;
                        v.fmt_guarded(f, seen)?;
                    }
                    write!(f, " }}")?;
                }
                seen.pop();
                Ok(())
            }
            Value::Function(func) => write!(f, "<fn {}>", func.name),
            Value::Builtin(func) => write!(f, "<builtin {}>", func.name),
            Value::Env(_) => write!(f, "<global>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_guarded(f, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(_) => write!(f, "Object({})", self),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Builtin(func) => write!(f, "{:?}", func),
            Value::Env(_) => write!(f, "Env(<global>)"),
        }
    }
}

/// Value equality for primitives, identity for everything reference-shaped.
/// This is what the `==` builtin sees: `1 == 1` but two structurally equal
/// objects are only equal if they are the same object.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Env(a), Value::Env(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_primitives() {
        assert_eq!(format!("{}", Value::Undefined), "undefined");
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(format!("{}", Value::Str("hello".into())), "\"hello\"");
    }

    #[test]
    fn test_display_object_is_insertion_ordered() {
        let mut obj = ScriptObject::new();
        obj.register("b".into(), Value::Int(1));
        obj.register("a".into(), Value::Int(2));
        let value = Value::Object(Rc::new(RefCell::new(obj)));
        assert_eq!(format!("{}", value), "{ b: 1, a: 2 }");
    }

    #[test]
    fn test_display_self_referential_object() {
        let obj = Rc::new(RefCell::new(ScriptObject::new()));
        obj.borrow_mut().register("x".into(), Value::Int(1));
        obj.borrow_mut()
            .register("this".into(), Value::Object(obj.clone()));
        assert_eq!(format!("{}", Value::Object(obj)), "{ x: 1, this: ... }");
    }

    #[test]
    fn test_primitive_equality_is_by_value() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Int(2));
        assert_eq!(Value::Str("a".into()), Value::Str("a".into()));
        assert_ne!(Value::Int(1), Value::Str("1".into()));
        assert_eq!(Value::Undefined, Value::Undefined);
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = Rc::new(RefCell::new(ScriptObject::new()));
        let b = Rc::new(RefCell::new(ScriptObject::new()));
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_field_overwrite_keeps_position() {
        let mut obj = ScriptObject::new();
        obj.register("a".into(), Value::Int(1));
        obj.register("b".into(), Value::Int(2));
        obj.register("a".into(), Value::Int(3));
        let keys: Vec<_> = obj.fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(obj.lookup("a"), Value::Int(3));
    }

    #[test]
    fn test_missing_field_reads_as_undefined() {
        let obj = ScriptObject::new();
        assert_eq!(obj.lookup("nope"), Value::Undefined);
    }
}
