//! Expression evaluation.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use smol_str::SmolStr;
use tinyjs_ast::{Block, Expr, ExprKind, Literal, Script};
use tinyjs_lexer::Span;

use crate::builtins;
use crate::environment::{EnvRef, Environment};
use crate::value::{ScriptFunction, ScriptObject, Value};
use crate::{Failure, Result, Unwind};

/// Result of one evaluation step: a value, or an unwind in flight.
type Flow<T> = std::result::Result<T, Unwind>;

/// The tinyjs interpreter. Holds the global frame and the sink that
/// `print` writes to.
pub struct Interpreter {
    globals: EnvRef,
    out: Box<dyn Write>,
    trace: bool,
}

impl Interpreter {
    /// Create an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Create an interpreter printing to the given sink. Tests use this to
    /// capture `print` output.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        builtins::install(&globals);
        Interpreter {
            globals,
            out,
            trace: false,
        }
    }

    /// When enabled, every `print` call also logs its raw argument list to
    /// stderr.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// The global frame.
    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    pub(crate) fn trace(&self) -> bool {
        self.trace
    }

    pub(crate) fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    /// Evaluate a whole script in the global frame.
    pub fn interpret(&mut self, script: &Script) -> Result<()> {
        let globals = self.globals.clone();
        match self.eval_block(&script.body, &globals) {
            Ok(_) => Ok(()),
            Err(Unwind::Return(_)) => Err(Failure::new(
                "return outside function",
                script.body.span,
            )),
            Err(Unwind::Fail(failure)) => Err(failure),
        }
    }

    /// Evaluate each instruction in order for its side effects. A block is
    /// not an expression: the result is always undefined.
    fn eval_block(&mut self, block: &Block, env: &EnvRef) -> Flow<Value> {
        for instr in &block.instrs {
            self.eval_expr(instr, env)?;
        }
        Ok(Value::Undefined)
    }

    /// Evaluate one expression in the given frame.
    ///
    /// The match is exhaustive over the closed node set on purpose: a new
    /// node kind that reaches the evaluator unhandled must be a compile
    /// error, not a runtime fallthrough.
    fn eval_expr(&mut self, expr: &Expr, env: &EnvRef) -> Flow<Value> {
        match &expr.kind {
            ExprKind::Block(block) => self.eval_block(block, env),

            ExprKind::Literal(Literal::Int(n)) => Ok(Value::Int(*n)),
            ExprKind::Literal(Literal::Str(s)) => Ok(Value::Str(s.clone())),

            ExprKind::FunCall { qualifier, args } => {
                let callee = self.eval_expr(qualifier, env)?;
                // the callee is vetted before any argument runs, so argument
                // side effects of a doomed call stay unobservable
                if !callee.is_callable() {
                    return Err(Unwind::Fail(Failure::new(
                        format!("type error {} is not a function", callee),
                        expr.span,
                    )));
                }
                let values = self.eval_args(args, env)?;
                // a free call has no receiver
                Ok(self.call_value(&callee, Value::Undefined, values, expr.span)?)
            }

            ExprKind::LocalVarAccess { name } => Ok(env.borrow().lookup(name)),

            ExprKind::LocalVarAssignment {
                name,
                expr: value_expr,
                declaration,
            } => {
                // a declaration may not shadow any live binding in the
                // chain; a name currently resolving to undefined is free
                if *declaration && !env.borrow().lookup(name).is_undefined() {
                    return Err(Unwind::Fail(Failure::new(
                        format!("{} already defined", name),
                        expr.span,
                    )));
                }
                let value = self.eval_expr(value_expr, env)?;
                env.borrow_mut().register(name.clone(), value);
                Ok(Value::Undefined)
            }

            ExprKind::Fun { name, params, body } => {
                let function = Rc::new(ScriptFunction {
                    name: name
                        .as_ref()
                        .map(|n| n.node.clone())
                        .unwrap_or_else(|| SmolStr::new("lambda")),
                    params: params.iter().map(|p| p.node.clone()).collect(),
                    body: body.clone(),
                    // captured at definition, not at any call site
                    closure: env.clone(),
                });
                let value = Value::Function(function);
                if let Some(name) = name {
                    // named functions can refer to themselves
                    env.borrow_mut().register(name.node.clone(), value.clone());
                }
                Ok(value)
            }

            ExprKind::Return { expr: value_expr } => {
                let value = match value_expr {
                    Some(value_expr) => self.eval_expr(value_expr, env)?,
                    None => Value::Undefined,
                };
                Err(Unwind::Return(value))
            }

            ExprKind::If {
                condition,
                true_block,
                false_block,
            } => {
                let cond = self.eval_expr(condition, env)?;
                match cond {
                    Value::Int(1) => self.eval_block(true_block, env),
                    Value::Int(0) => self.eval_block(false_block, env),
                    _ => Err(Unwind::Fail(Failure::new(
                        "invalid boolean value",
                        condition.span,
                    ))),
                }
            }

            ExprKind::New { init } => {
                let object = Rc::new(RefCell::new(ScriptObject::new()));
                for (key, field_expr) in init {
                    let value = self.eval_expr(field_expr, env)?;
                    object.borrow_mut().register(key.node.clone(), value);
                }
                object
                    .borrow_mut()
                    .register(SmolStr::new("this"), Value::Object(object.clone()));
                Ok(Value::Object(object))
            }

            ExprKind::FieldAccess { receiver, name } => {
                let value = self.eval_expr(receiver, env)?;
                match &value {
                    Value::Object(obj) => Ok(obj.borrow().lookup(name)),
                    Value::Env(frame) => Ok(frame.borrow().lookup_local(name)),
                    // field access on anything else yields the receiver
                    // itself, not an error
                    _ => Ok(value),
                }
            }

            ExprKind::FieldAssignment {
                receiver,
                name,
                expr: value_expr,
            } => {
                let target = self.eval_expr(receiver, env)?;
                // the receiver is vetted before the value expression runs
                match &target {
                    Value::Object(obj) => {
                        let value = self.eval_expr(value_expr, env)?;
                        obj.borrow_mut().register(name.clone(), value);
                    }
                    Value::Env(frame) => {
                        let value = self.eval_expr(value_expr, env)?;
                        frame.borrow_mut().register(name.clone(), value);
                    }
                    _ => {
                        return Err(Unwind::Fail(Failure::new(
                            format!("type error {} is not an object", target),
                            receiver.span,
                        )))
                    }
                }
                Ok(target)
            }

            ExprKind::MethodCall {
                receiver,
                name,
                args,
            } => {
                let target = self.eval_expr(receiver, env)?;
                let method = match &target {
                    Value::Object(obj) => obj.borrow().lookup(name),
                    Value::Env(frame) => frame.borrow().lookup_local(name),
                    _ => {
                        return Err(Unwind::Fail(Failure::new(
                            format!("type error {} is not an object", target),
                            receiver.span,
                        )))
                    }
                };
                if method.is_undefined() {
                    return Err(Unwind::Fail(Failure::new(
                        format!("{} doesn't have a method called {}", target, name),
                        expr.span,
                    )));
                }
                if !method.is_callable() {
                    return Err(Unwind::Fail(Failure::new(
                        format!("{} is not a method", name),
                        expr.span,
                    )));
                }
                let values = self.eval_args(args, env)?;
                Ok(self.call_value(&method, target, values, expr.span)?)
            }
        }
    }

    /// Evaluate an argument list left to right.
    fn eval_args(&mut self, args: &[Expr], env: &EnvRef) -> Flow<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env)?);
        }
        Ok(values)
    }

    /// Invoke a callable with a receiver and evaluated arguments.
    ///
    /// User functions check exact arity, bind `this` and each parameter in
    /// a fresh child of their *captured* frame, and intercept the return
    /// unwind here and nowhere else. Builtins get the arguments as-is.
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        receiver: Value,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value> {
        match callee {
            Value::Function(function) => {
                if args.len() != function.params.len() {
                    return Err(Failure::new("invalid number of arguments", span));
                }
                let local = Rc::new(RefCell::new(Environment::with_parent(
                    function.closure.clone(),
                )));
                {
                    let mut frame = local.borrow_mut();
                    frame.register(SmolStr::new("this"), receiver);
                    for (param, arg) in function.params.iter().zip(args) {
                        frame.register(param.clone(), arg);
                    }
                }
                match self.eval_block(&function.body, &local) {
                    // falling off the end of the body yields undefined
                    Ok(value) => Ok(value),
                    Err(Unwind::Return(value)) => Ok(value),
                    Err(Unwind::Fail(failure)) => Err(failure),
                }
            }
            Value::Builtin(builtin) => (builtin.func)(self, &receiver, &args),
            _ => Err(Failure::new(
                format!("type error {} is not a function", callee),
                span,
            )),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
