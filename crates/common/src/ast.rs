//! Syntax tree for bitlang programs.
//!
//! Compound expressions are written operator-first (`(+ a b)`), so the tree
//! has no precedence levels: every node is one of a handful of tagged
//! variants and the evaluator dispatches on the tag.
//!
//! Every statement and expression carries the [`Position`] of its first
//! token for error reporting. Positions take no part in evaluation.

use crate::position::Position;
use crate::types::Type;

/// Binary operator of a prefix expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic (wraparound)
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`, division by zero is a runtime error.
    Div,
    /// `%`, remainder by zero is a runtime error.
    Rem,

    // Bitwise
    /// `^`
    Xor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,

    // Logical over 0/nonzero, both operands always evaluated
    /// `|`
    Or,
    /// `&`
    And,

    // Comparison, result is a `u1`
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// All binary operators, in definition order.
pub const ALL_BIN_OPS: [BinOp; 16] = [
    BinOp::Add,
    BinOp::Sub,
    BinOp::Mul,
    BinOp::Div,
    BinOp::Rem,
    BinOp::Xor,
    BinOp::Shl,
    BinOp::Shr,
    BinOp::Or,
    BinOp::And,
    BinOp::Eq,
    BinOp::Ne,
    BinOp::Lt,
    BinOp::Le,
    BinOp::Gt,
    BinOp::Ge,
];

impl BinOp {
    /// Source spelling of this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Or => "|",
            BinOp::And => "&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }

    /// Comparisons produce a `u1` regardless of operand width.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    /// `|` and `&` test operands for nonzero and produce a `u1`.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::Or | BinOp::And)
    }

    /// Returns true if the result is a `u1` rather than the operand width.
    pub fn yields_bool(&self) -> bool {
        self.is_comparison() || self.is_logical()
    }
}

/// Compound assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`, same wraparound as `+`.
    Add,
    /// `-=`, same wraparound as `-`.
    Sub,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
        }
    }

    /// The arithmetic operator a compound assignment expands to.
    pub fn bin_op(&self) -> Option<BinOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub at: Position,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// Untyped integer literal. Its width comes from the context.
    Literal(u64),
    /// Local, parameter, static, or const.
    Ident(String),
    /// `[index]array`
    Index { index: Box<Expr>, array: String },
    /// `(op left right)`
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `(name args...)`
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn new(kind: ExprKind, at: Position) -> Self {
        Self { kind, at }
    }
}

/// Target of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Place {
    /// A whole binding or slot.
    Var(String),
    /// One element of an array binding or slot.
    Element { index: Box<Expr>, array: String },
}

impl Place {
    /// Name of the binding or slot written through.
    pub fn name(&self) -> &str {
        match self {
            Place::Var(name) => name,
            Place::Element { array, .. } => array,
        }
    }
}

/// A statement node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StmtKind,
    pub at: Position,
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    /// `let name:Type = value`
    Let { name: String, ty: Type, value: Expr },
    /// `static NAME:Type` inside a function body.
    Static(StaticDecl),
    /// `(= place value)`, `(+= place value)`, `(-= place value)`
    Assign {
        op: AssignOp,
        place: Place,
        value: Expr,
    },
    /// `if cond { .. } else { .. }`
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
    /// `for var:Type in start..end { .. }`, exclusive end.
    For {
        var: String,
        ty: Type,
        start: Expr,
        end: Expr,
        body: Block,
    },
    /// `loop { .. }`
    Loop(Block),
    Break,
    Continue,
    /// `return` or `return value`
    Return(Option<Expr>),
    /// `!!`
    Panic,
    /// An expression evaluated for its side effects.
    Expr(Expr),
}

impl Statement {
    pub fn new(kind: StmtKind, at: Position) -> Self {
        Self { kind, at }
    }
}

/// An ordered list of statements.
pub type Block = Vec<Statement>;

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// `fn name(params):ret { body }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    /// `None` for functions that only `return` without a value.
    pub ret: Option<Type>,
    pub body: Block,
    pub at: Position,
}

impl Function {
    /// Every `static` declared anywhere in the body, in source order.
    pub fn statics(&self) -> Vec<&StaticDecl> {
        let mut out = Vec::new();
        collect_statics(&self.body, &mut out);
        out
    }
}

fn collect_statics<'a>(block: &'a [Statement], out: &mut Vec<&'a StaticDecl>) {
    crate::stack::ensure_sufficient_stack(|| collect_statics_inner(block, out));
}

fn collect_statics_inner<'a>(block: &'a [Statement], out: &mut Vec<&'a StaticDecl>) {
    for stmt in block {
        match &stmt.kind {
            StmtKind::Static(decl) => out.push(decl),
            StmtKind::If {
                then, otherwise, ..
            } => {
                collect_statics(then, out);
                if let Some(otherwise) = otherwise {
                    collect_statics(otherwise, out);
                }
            }
            StmtKind::For { body, .. } | StmtKind::Loop(body) => collect_statics(body, out),
            _ => {}
        }
    }
}

/// `static NAME:Type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDecl {
    pub name: String,
    pub ty: Type,
    pub at: Position,
}

/// `const NAME:[Type N] = [v0 v1 ...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: String,
    pub ty: Type,
    pub values: Vec<u64>,
    pub at: Position,
}

/// A top-level item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Function(Function),
    Static(StaticDecl),
    Const(ConstDecl),
    Statement(Statement),
}

/// A parsed program: top-level items in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    /// Create a program from its items.
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Function declarations, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Global `static` declarations, in source order.
    pub fn statics(&self) -> impl Iterator<Item = &StaticDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Static(s) => Some(s),
            _ => None,
        })
    }

    /// Global `const` declarations, in source order.
    pub fn consts(&self) -> impl Iterator<Item = &ConstDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Const(c) => Some(c),
            _ => None,
        })
    }

    /// Top-level statements, in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.items.iter().filter_map(|item| match item {
            Item::Statement(s) => Some(s),
            _ => None,
        })
    }

    /// Number of top-level items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the program has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
