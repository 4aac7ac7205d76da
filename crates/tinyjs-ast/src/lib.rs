//! tinyjs Abstract Syntax Tree
//!
//! Defines the node types produced by the parser and consumed read-only by
//! the interpreter. The expression grammar is a closed set: adding a variant
//! without handling it in the evaluator is a compile error, which is the
//! point of keeping `ExprKind` a plain exhaustively-matched enum.

// Re-export common types for use by other crates
pub use smol_str::SmolStr;
pub use tinyjs_lexer::Span;

/// A spanned value - wraps any value with source location info
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self {
            node,
            span: Span::dummy(),
        }
    }
}

/// Identifier (variable names, parameter names, field names)
pub type Ident = Spanned<SmolStr>;

/// A complete tinyjs script: the top-level instruction sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub body: Block,
}

/// A sequence of instructions. Blocks are not expressions: evaluating one
/// always yields undefined, whatever its last instruction produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub instrs: Vec<Expr>,
    pub span: Span,
}

impl Block {
    pub fn new(instrs: Vec<Expr>, span: Span) -> Self {
        Self { instrs, span }
    }

    /// An empty block, used for a missing `else` branch.
    pub fn empty(span: Span) -> Self {
        Self {
            instrs: Vec::new(),
            span,
        }
    }
}

/// An expression node with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Constant values embedded directly in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(SmolStr),
}

/// Every expression form in the language.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A nested instruction sequence (if branches, function bodies).
    Block(Block),

    /// An embedded constant.
    Literal(Literal),

    /// Call of an arbitrary callee expression. Binary operators desugar to
    /// this form with the operator name as a variable access, so `a + b`
    /// parses as `FunCall(LocalVarAccess("+"), [a, b])`.
    FunCall {
        qualifier: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Read of a variable through the environment chain.
    LocalVarAccess { name: SmolStr },

    /// `var name = expr` (declaration) or `name = expr` (re-assignment).
    LocalVarAssignment {
        name: SmolStr,
        expr: Box<Expr>,
        declaration: bool,
    },

    /// Function literal, optionally named. A name makes the function
    /// visible in its defining scope, enabling recursion.
    Fun {
        name: Option<Ident>,
        params: Vec<Ident>,
        body: Block,
    },

    /// Non-local return; `return;` carries no operand and yields undefined.
    Return { expr: Option<Box<Expr>> },

    /// Two-armed conditional; the false block is empty when `else` is
    /// omitted.
    If {
        condition: Box<Expr>,
        true_block: Block,
        false_block: Block,
    },

    /// Object literal `{ a: 1, b: 2 }`. Initializers are kept as a vector
    /// of pairs so evaluation order follows the source text.
    New { init: Vec<(Ident, Expr)> },

    /// `receiver.name` read.
    FieldAccess { receiver: Box<Expr>, name: SmolStr },

    /// `receiver.name = expr` write.
    FieldAssignment {
        receiver: Box<Expr>,
        name: SmolStr,
        expr: Box<Expr>,
    },

    /// `receiver.name(args)` invocation with `this` bound to the receiver.
    MethodCall {
        receiver: Box<Expr>,
        name: SmolStr,
        args: Vec<Expr>,
    },
}
