// SPDX-License-Identifier: MIT OR Apache-2.0

//! Syntax tree for templates and the expressions inside them.

use super::value::Value;

/// A parsed template: literal text interleaved with replacement fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    /// Parts in source order
    pub parts: Vec<Part>,
}

/// One piece of a template.
#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    /// Literal text, escapes already decoded
    Literal(String),
    /// A `{...}` replacement field
    Field(Field),
}

/// A replacement field.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// The expression to evaluate
    pub expr: Expr,
    /// For `{expr=}` fields, the text echoed before the value
    pub debug_text: Option<String>,
    /// `!s`, `!r` or `!a`
    pub conversion: Option<Conversion>,
    /// Format spec after `:`, which may itself contain fields
    pub spec: Option<Template>,
}

/// Conversion applied before formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// `!s`
    Str,
    /// `!r`
    Repr,
    /// `!a`
    Ascii,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `~x`
    Invert,
    /// `not x`
    Not,
}

/// Arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
}

impl BinaryOp {
    /// The operator as written.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "** or pow()",
        }
    }
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `not in`
    NotIn,
    /// `is`
    Is,
    /// `is not`
    IsNot,
}

impl CompareOp {
    /// The operator as written.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        }
    }
}

/// Short-circuit boolean operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolOp {
    /// `and`
    And,
    /// `or`
    Or,
}

/// A `for target in iter if cond...` clause of a comprehension.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    /// Loop variable
    pub target: String,
    /// Iterated expression
    pub iter: Expr,
    /// Filters, all of which must hold
    pub conditions: Vec<Expr>,
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A constant
    Literal(Value),
    /// A name to look up
    Name(String),
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `[elt for x in xs]`, or a bare generator passed as a call argument
    Comprehension {
        /// Produced element
        element: Box<Expr>,
        /// `for` clauses, outermost first
        clauses: Vec<Clause>,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Binary arithmetic
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// Possibly chained comparison, `a < b <= c`
    Compare {
        /// Leftmost operand
        first: Box<Expr>,
        /// Remaining operator/operand pairs
        rest: Vec<(CompareOp, Expr)>,
    },
    /// `a and b`, `a or b`
    BoolOp {
        /// Operator
        op: BoolOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `body if test else orelse`
    Conditional {
        /// Condition
        test: Box<Expr>,
        /// Value when true
        body: Box<Expr>,
        /// Value when false
        orelse: Box<Expr>,
    },
    /// `func(args, key=value)`
    Call {
        /// Callee
        func: Box<Expr>,
        /// Positional arguments
        args: Vec<Expr>,
        /// Keyword arguments
        kwargs: Vec<(String, Expr)>,
    },
    /// `receiver.method(args)`
    MethodCall {
        /// Object the method is looked up on
        receiver: Box<Expr>,
        /// Method name
        method: String,
        /// Positional arguments
        args: Vec<Expr>,
        /// Keyword arguments
        kwargs: Vec<(String, Expr)>,
    },
    /// `value.name` outside a call
    Attribute {
        /// Object
        value: Box<Expr>,
        /// Attribute name
        name: String,
    },
    /// `value[index]`
    Subscript {
        /// Indexed object
        value: Box<Expr>,
        /// Index
        index: Box<Expr>,
    },
    /// `value[lower:upper:step]`
    Slice {
        /// Sliced object
        value: Box<Expr>,
        /// Start bound
        lower: Option<Box<Expr>>,
        /// End bound
        upper: Option<Box<Expr>>,
        /// Stride
        step: Option<Box<Expr>>,
    },
}
