//! Symbol table
//!
//! Const scopes and the evaluator used by validation and code generation.

use super::SemanticError;
use crate::frontend::parser::ast::{BinOp, Expr, UnOp};
use crate::util::span::Span;
use indexmap::IndexMap;

/// Narrowest storage class a const value fits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstType {
    Byte,
    Short,
    Word,
}

impl ConstType {
    /// Classify a value; `None` if it does not fit a 32-bit word
    pub fn of(value: i64) -> Option<Self> {
        if (i8::MIN as i64..=u8::MAX as i64).contains(&value) {
            Some(ConstType::Byte)
        } else if (i16::MIN as i64..=u16::MAX as i64).contains(&value) {
            Some(ConstType::Short)
        } else if (i32::MIN as i64..=u32::MAX as i64).contains(&value) {
            Some(ConstType::Word)
        } else {
            None
        }
    }
}

/// A declared const
#[derive(Debug, Clone, PartialEq)]
pub struct ConstInfo {
    pub name: String,
    /// Filled in once the declaration has been evaluated
    pub value: Option<i64>,
    pub ty: Option<ConstType>,
    /// Index of the declaration in source order
    pub decl_index: usize,
    pub span: Span,
}

/// Consts of one scope, in dependency order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    consts: IndexMap<String, ConstInfo>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        info: ConstInfo,
    ) {
        self.consts.insert(info.name.clone(), info);
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&ConstInfo> {
        self.consts.get(name)
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.consts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.consts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consts.is_empty()
    }

    /// Consts in dependency order
    pub fn iter(&self) -> impl Iterator<Item = &ConstInfo> {
        self.consts.values()
    }
}

/// Symbol table of one compilation unit
///
/// The root scope holds the consts of the library, or of the lone
/// behaviour/sequence. Each behaviour of a library gets a child scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    root: Scope,
    children: IndexMap<String, Scope>,
}

impl SymbolTable {
    pub fn new(root: Scope) -> Self {
        Self {
            root,
            children: IndexMap::new(),
        }
    }

    pub fn add_child(
        &mut self,
        behaviour: &str,
        scope: Scope,
    ) {
        self.children.insert(behaviour.to_string(), scope);
    }

    pub fn root(&self) -> &Scope {
        &self.root
    }

    pub fn child(
        &self,
        behaviour: &str,
    ) -> Option<&Scope> {
        self.children.get(behaviour)
    }

    /// Evaluation environment for the root scope
    pub fn root_env(&self) -> ConstEnv<'_> {
        ConstEnv::new(&self.root, None)
    }

    /// Evaluation environment for a library behaviour; falls back to the
    /// root scope for behaviours without a child scope
    pub fn behaviour_env(
        &self,
        behaviour: &str,
    ) -> ConstEnv<'_> {
        match self.children.get(behaviour) {
            Some(scope) => ConstEnv::new(scope, Some(&self.root)),
            None => self.root_env(),
        }
    }
}

/// Lookup chain used to evaluate expressions: local scope, then parent
#[derive(Debug, Clone, Copy)]
pub struct ConstEnv<'s> {
    local: &'s Scope,
    parent: Option<&'s Scope>,
}

impl<'s> ConstEnv<'s> {
    pub fn new(
        local: &'s Scope,
        parent: Option<&'s Scope>,
    ) -> Self {
        Self { local, parent }
    }

    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&'s ConstInfo> {
        self.local
            .get(name)
            .or_else(|| self.parent.and_then(|p| p.get(name)))
    }

    /// Evaluate an expression with checked 64-bit arithmetic
    pub fn eval(
        &self,
        expr: &Expr,
    ) -> Result<i64, SemanticError> {
        match expr {
            Expr::Number(value, _) => Ok(*value),
            Expr::Const(name, span) => self
                .lookup(name)
                .and_then(|info| info.value)
                .ok_or_else(|| SemanticError::UndefinedConst {
                    name: name.clone(),
                    position: span.start,
                }),
            Expr::Unary {
                op: UnOp::Neg,
                operand,
                span,
            } => self
                .eval(operand)?
                .checked_neg()
                .ok_or(SemanticError::ArithmeticOverflow { position: span.start }),
            Expr::Binary { op, lhs, rhs, span } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                let result = match op {
                    BinOp::Add => lhs.checked_add(rhs),
                    BinOp::Sub => lhs.checked_sub(rhs),
                };
                result.ok_or(SemanticError::ArithmeticOverflow { position: span.start })
            }
        }
    }
}
