//! Syntax-node shapes consumed by the reflection model.
//!
//! Pyrite does not parse source text itself. Whatever parser is plugged in
//! must produce these nodes; they are serde-compatible so that an
//! out-of-process parser can hand a tree over as JSON.

use serde::{Deserialize, Serialize};

use crate::NamespaceContext;

// ============================================================================
// Statements
// ============================================================================

/// A top-level statement in a parsed source unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stmt {
    /// `namespace A\B { ... }` or `namespace A\B;` followed by its statements
    Namespace(NamespaceNode),
    /// A class declaration
    Class(ClassNode),
    /// Anything reflection does not look at
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespaceNode {
    /// `None` for an unnamed `namespace { ... }` block
    #[serde(default)]
    pub name: Option<NamespaceContext>,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

/// A class declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassNode {
    pub name: String,
    /// Body statements in source order
    #[serde(default)]
    pub stmts: Vec<ClassStmt>,
}

impl ClassNode {
    /// Method declarations in source order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodNode> {
        self.stmts.iter().filter_map(|stmt| match stmt {
            ClassStmt::Method(method) => Some(method),
            _ => None,
        })
    }

    /// Constant declaration statements in source order.
    pub fn constants(&self) -> impl Iterator<Item = &ClassConstNode> {
        self.stmts.iter().filter_map(|stmt| match stmt {
            ClassStmt::ClassConst(consts) => Some(consts),
            _ => None,
        })
    }
}

/// A statement inside a class body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassStmt {
    Method(MethodNode),
    /// `const A = 1, B = 2;`
    ClassConst(ClassConstNode),
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassConstNode {
    pub consts: Vec<ConstNode>,
}

/// One `NAME = value` pair of a constant declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstNode {
    pub name: String,
    pub value: Expr,
}

// ============================================================================
// Methods and Parameters
// ============================================================================

/// A modifier keyword on a method declaration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Final,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodNode {
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub params: Vec<ParamNode>,
}

impl MethodNode {
    fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_abstract(&self) -> bool {
        self.has(Modifier::Abstract)
    }

    pub fn is_final(&self) -> bool {
        self.has(Modifier::Final)
    }

    pub fn is_private(&self) -> bool {
        self.has(Modifier::Private)
    }

    pub fn is_protected(&self) -> bool {
        self.has(Modifier::Protected)
    }

    /// Explicitly public, or no visibility keyword at all.
    pub fn is_public(&self) -> bool {
        self.has(Modifier::Public) || !(self.is_private() || self.is_protected())
    }

    pub fn is_static(&self) -> bool {
        self.has(Modifier::Static)
    }
}

/// A formal parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamNode {
    /// Variable name without the `$` sigil
    pub name: String,
    #[serde(default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub default: Option<Expr>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub by_ref: bool,
}

impl ParamNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
            variadic: false,
            by_ref: false,
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitwiseNot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    BooleanAnd,
    BooleanOr,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Smaller,
    SmallerOrEqual,
    Greater,
    GreaterOrEqual,
}

/// An expression as it can appear in a constant initializer or a
/// parameter default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    String {
        value: String,
    },
    Array {
        #[serde(default)]
        items: Vec<Expr>,
    },
    /// A bare constant name such as `true`, `null` or `PHP_EOL`
    ConstFetch {
        name: String,
    },
    /// `Class::NAME`
    ClassConstFetch {
        class: String,
        name: String,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Int { value }
    }

    pub fn float(value: f64) -> Self {
        Expr::Float { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String {
            value: value.into(),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Short description of the expression form, for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Expr::Int { .. } => "integer literal".to_string(),
            Expr::Float { .. } => "float literal".to_string(),
            Expr::String { .. } => "string literal".to_string(),
            Expr::Array { .. } => "array literal".to_string(),
            Expr::ConstFetch { name } => format!("constant {}", name),
            Expr::ClassConstFetch { class, name } => format!("class constant {}::{}", class, name),
            Expr::Unary { op, .. } => format!("unary {:?}", op),
            Expr::Binary { op, .. } => format!("binary {:?}", op),
            Expr::Call { name, .. } => format!("call to {}()", name),
        }
    }
}
