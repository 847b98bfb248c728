//! Semantic analysis
//!
//! Orders and evaluates const declarations, builds the symbol table and
//! validates the tree. Analysis rewrites const lists in place; everything
//! else in the AST is left as parsed.

pub mod const_order;
pub mod symbols;
pub mod validate;


pub use symbols::{ConstEnv, ConstInfo, ConstType, Scope, SymbolTable};

use crate::frontend::parser::ast::{ConstList, Root};
use crate::util::span::Position;
use thiserror::Error;
use tracing::debug;

/// Semantic error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("{position}: const `{name}` is declared twice")]
    DuplicateConst { name: String, position: Position },

    #[error("{position}: undefined const `{name}`")]
    UndefinedConst { name: String, position: Position },

    /// Consts that depend on each other
    #[error("cyclic const declarations: {}", .names.join(", "))]
    CyclicConst { names: Vec<String> },

    #[error("{position}: arithmetic overflow")]
    ArithmeticOverflow { position: Position },

    #[error("{position}: attribute `{name}` is not allowed on a {target}")]
    MisplacedAttribute {
        name: String,
        target: String,
        position: Position,
    },

    #[error("{position}: attribute `{name}` is given twice")]
    DuplicateAttribute { name: String, position: Position },

    #[error("{position}: state `{name}` is declared twice")]
    DuplicateState { name: String, position: Position },

    #[error("{position}: behaviour `{name}` is declared twice")]
    DuplicateBehaviour { name: String, position: Position },

    /// Two library behaviours end up with the same graph id
    #[error("{position}: behaviour `{name}` reuses graph id {id} of `{first}`")]
    DuplicateGraphId {
        id: i64,
        name: String,
        first: String,
        position: Position,
    },

    #[error("{position}: no state named `{name}`")]
    UndefinedState { name: String, position: Position },

    /// A state both delegates to a graph and uses an object slot
    #[error("{position}: state `{state}` has both a graph reference and `UseObjectSlot`")]
    ConflictingStateTarget { state: String, position: Position },

    #[error("{position}: unknown control packet setting `{name}`")]
    UnknownSetting { name: String, position: Position },

    #[error("{position}: control packet setting `{name}` is given twice")]
    DuplicateSetting { name: String, position: Position },

    #[error("{position}: unknown or repeated assigner field `{name}`")]
    UnknownAssignerField { name: String, position: Position },

    /// Value does not fit its binary field
    #[error("{what} is {value}, outside {min}..={max}")]
    OutOfRange {
        what: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Analyze a parsed unit
///
/// Sorts every const list into dependency order, evaluates it and checks
/// the tree. The returned table is what code generation evaluates against.
pub fn analyze(root: &mut Root) -> Result<SymbolTable, SemanticError> {
    let symbols = match root {
        Root::Library(library) => {
            let mut symbols = SymbolTable::new(build_scope(&mut library.consts, None)?);
            for behaviour in &mut library.behaviours {
                let scope = build_scope(&mut behaviour.consts, Some(symbols.root()))?;
                symbols.add_child(&behaviour.name, scope);
            }
            symbols
        }
        Root::Behaviour(behaviour) => SymbolTable::new(build_scope(&mut behaviour.consts, None)?),
        Root::Sequence(sequence) => SymbolTable::new(build_scope(&mut sequence.consts, None)?),
    };

    validate::validate(root, &symbols)?;
    debug!("analysis of `{}` complete", root.name());
    Ok(symbols)
}

/// Order and evaluate one const list
fn build_scope(
    list: &mut ConstList,
    outer: Option<&Scope>,
) -> Result<Scope, SemanticError> {
    let order = const_order::sort_consts(list, outer)?;

    let mut scope = Scope::new();
    for (decl, decl_index) in list.decls.iter().zip(order) {
        let value = ConstEnv::new(&scope, outer).eval(&decl.value)?;
        scope.insert(ConstInfo {
            name: decl.name.clone(),
            value: Some(value),
            ty: ConstType::of(value),
            decl_index,
            span: decl.span,
        });
    }
    Ok(scope)
}
