//! Abstract Syntax Tree types
//!
//! One variant or struct per node kind. Lists are ordered and the order is
//! significant: it is source order, and after analysis const lists are in
//! dependency order.

use crate::util::span::Span;
use serde::Serialize;
use std::fmt;

/// Root of a compilation unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Root {
    Library(Library),
    Behaviour(Behaviour),
    Sequence(Sequence),
}

impl Root {
    /// Declared name of the unit
    pub fn name(&self) -> &str {
        match self {
            Root::Library(lib) => &lib.name,
            Root::Behaviour(behaviour) => &behaviour.name,
            Root::Sequence(sequence) => &sequence.name,
        }
    }
}

/// `library Name { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Library {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub consts: ConstList,
    pub behaviours: Vec<Behaviour>,
    pub span: Span,
}

/// `behaviour Name { ... }`: a state machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Behaviour {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub consts: ConstList,
    pub starter: Option<Starter>,
    pub states: Vec<State>,
    pub span: Span,
}

/// `sequence Name { ... }`: a linear behaviour commands sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sequence {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub consts: ConstList,
    pub packs: Vec<CommandPack>,
    pub commands: Vec<Command>,
    pub span: Span,
}

/// `pack(script) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandPack {
    pub script: Reference,
    pub commands: Vec<Command>,
    pub span: Span,
}

/// `starter { assign ...; }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Starter {
    pub assigners: Vec<Assigner>,
    pub span: Span,
}

/// `assign Object(type = 1, ...);`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assigner {
    pub object: Reference,
    pub fields: Vec<Assign>,
    pub span: Span,
}

/// `state Name(target) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub target: Option<Reference>,
    pub bodies: Vec<StateBody>,
    pub span: Span,
}

/// `if Cond() { ... }` or `do { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateBody {
    pub condition: Option<Condition>,
    pub commands: Vec<Command>,
    pub jump: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub id: u16,
    pub negate: bool,
    pub parameter: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub id: u16,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// Numeric or symbolic pointer into the host's asset registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Reference {
    Literal(i64),
    Symbol(String),
}

impl fmt::Display for Reference {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Reference::Literal(value) => write!(f, "{}", value),
            Reference::Symbol(name) => write!(f, "{}", name),
        }
    }
}

/// `[Name(args)]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeKind {
    GlobalIndex(Expr),
    Priority(Expr),
    InstanceType(Expr),
    StartFrom(String),
    UseObjectSlot(Expr),
    ControlPacket(ControlPacketBody),
    NonBlocking,
    SkipFirstBody,
    Unknown(Expr),
}

impl AttributeKind {
    /// Attribute name as written in source
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::GlobalIndex(_) => "GlobalIndex",
            AttributeKind::Priority(_) => "Priority",
            AttributeKind::InstanceType(_) => "InstanceType",
            AttributeKind::StartFrom(_) => "StartFrom",
            AttributeKind::UseObjectSlot(_) => "UseObjectSlot",
            AttributeKind::ControlPacket(_) => "ControlPacket",
            AttributeKind::NonBlocking => "NonBlocking",
            AttributeKind::SkipFirstBody => "SkipFirstBody",
            AttributeKind::Unknown(_) => "Unknown",
        }
    }
}

/// Settings (`name = expr`) and raw data words of a control packet
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ControlPacketBody {
    pub settings: Vec<Assign>,
    pub data: Vec<Expr>,
}

/// `name = expr`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assign {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// `const NAME = expr;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstDecl {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// Ordered const declarations of one scope
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConstList {
    pub decls: Vec<ConstDecl>,
}

impl ConstList {
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Number(i64, Span),
    Const(String, Span),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, span) | Expr::Const(_, span) => *span,
            Expr::Unary { span, .. } | Expr::Binary { span, .. } => *span,
        }
    }

    /// Literal expression with no source location
    pub fn number(value: i64) -> Self {
        Expr::Number(value, Span::dummy())
    }

    /// Names of every const this expression references, in source order
    pub fn const_refs<'e>(
        &'e self,
        out: &mut Vec<(&'e str, Span)>,
    ) {
        match self {
            Expr::Number(..) => {}
            Expr::Const(name, span) => out.push((name, *span)),
            Expr::Unary { operand, .. } => operand.const_refs(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.const_refs(out);
                rhs.const_refs(out);
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnOp {
    Neg,
}
