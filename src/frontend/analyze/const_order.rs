//! Const declaration ordering
//!
//! Declarations may reference consts declared later in the same list. The
//! list is reordered so every const follows the consts it depends on, using
//! Kahn's algorithm with the smallest original index taken first. Ties keep
//! source order and an already ordered list is left untouched.

use super::symbols::Scope;
use super::SemanticError;
use crate::frontend::parser::ast::ConstList;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

/// Reorder `list` in place
///
/// References that are not declared in `list` must be declared in `outer`.
/// Returns the source index of each declaration in its new order.
pub fn sort_consts(
    list: &mut ConstList,
    outer: Option<&Scope>,
) -> Result<Vec<usize>, SemanticError> {
    let count = list.decls.len();
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(count);
    for (i, decl) in list.decls.iter().enumerate() {
        if index_of.insert(decl.name.as_str(), i).is_some() {
            return Err(SemanticError::DuplicateConst {
                name: decl.name.clone(),
                position: decl.span.start,
            });
        }
    }

    // dependents[d] lists the declarations that reference d
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut in_degree = vec![0usize; count];
    let mut refs = Vec::new();
    for (i, decl) in list.decls.iter().enumerate() {
        refs.clear();
        decl.value.const_refs(&mut refs);
        for &(name, span) in &refs {
            match index_of.get(name) {
                Some(&dep) => {
                    dependents[dep].push(i);
                    in_degree[i] += 1;
                }
                None if outer.is_some_and(|scope| scope.contains(name)) => {}
                None => {
                    return Err(SemanticError::UndefinedConst {
                        name: name.to_string(),
                        position: span.start,
                    })
                }
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(count);
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < count {
        let names = (0..count)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| list.decls[i].name.clone())
            .collect();
        return Err(SemanticError::CyclicConst { names });
    }

    let mut slots: Vec<_> = std::mem::take(&mut list.decls).into_iter().map(Some).collect();
    list.decls = order.iter().filter_map(|&i| slots[i].take()).collect();
    trace!(
        "const order: {}",
        list.decls.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(", ")
    );
    Ok(order)
}
