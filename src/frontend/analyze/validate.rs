//! Structural validation
//!
//! Attribute placement, name uniqueness, state references and field names.
//! Every expression is evaluated once here so undefined consts and overflow
//! surface before emission.

use super::symbols::{ConstEnv, SymbolTable};
use super::SemanticError;
use crate::frontend::parser::ast::*;
use crate::middle::catalogue;
use std::collections::HashSet;

/// Assigner field names, in nibble order
pub const ASSIGNER_FIELDS: [&str; 4] = ["type", "locality", "status", "preference"];

/// Where an attribute list is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Library,
    Behaviour,
    LibraryBehaviour,
    Sequence,
    State,
}

impl Target {
    fn describe(self) -> &'static str {
        match self {
            Target::Library => "library",
            Target::Behaviour => "behaviour",
            Target::LibraryBehaviour => "library behaviour",
            Target::Sequence => "sequence",
            Target::State => "state",
        }
    }

    fn allows(
        self,
        kind: &AttributeKind,
    ) -> bool {
        match kind {
            AttributeKind::Priority(_) | AttributeKind::StartFrom(_) => {
                matches!(self, Target::Behaviour | Target::LibraryBehaviour)
            }
            AttributeKind::GlobalIndex(_) => matches!(self, Target::LibraryBehaviour | Target::Sequence),
            AttributeKind::InstanceType(_) => self == Target::Sequence,
            AttributeKind::Unknown(_) => self != Target::State,
            AttributeKind::UseObjectSlot(_)
            | AttributeKind::ControlPacket(_)
            | AttributeKind::NonBlocking
            | AttributeKind::SkipFirstBody => self == Target::State,
        }
    }
}

pub fn validate(
    root: &Root,
    symbols: &SymbolTable,
) -> Result<(), SemanticError> {
    match root {
        Root::Library(library) => {
            let env = symbols.root_env();
            check_attributes(&library.attributes, Target::Library, env)?;

            let mut names = HashSet::new();
            for behaviour in &library.behaviours {
                if !names.insert(behaviour.name.as_str()) {
                    return Err(SemanticError::DuplicateBehaviour {
                        name: behaviour.name.clone(),
                        position: behaviour.span.start,
                    });
                }
                let env = symbols.behaviour_env(&behaviour.name);
                validate_behaviour(behaviour, Target::LibraryBehaviour, env)?;
            }
            Ok(())
        }
        Root::Behaviour(behaviour) => validate_behaviour(behaviour, Target::Behaviour, symbols.root_env()),
        Root::Sequence(sequence) => validate_sequence(sequence, symbols.root_env()),
    }
}

fn check_attributes(
    attributes: &[Attribute],
    target: Target,
    env: ConstEnv<'_>,
) -> Result<(), SemanticError> {
    let mut seen = HashSet::new();
    for attribute in attributes {
        let name = attribute.kind.name();
        let position = attribute.span.start;
        if !target.allows(&attribute.kind) {
            return Err(SemanticError::MisplacedAttribute {
                name: name.to_string(),
                target: target.describe().to_string(),
                position,
            });
        }
        if !seen.insert(name) {
            return Err(SemanticError::DuplicateAttribute {
                name: name.to_string(),
                position,
            });
        }

        match &attribute.kind {
            AttributeKind::GlobalIndex(expr)
            | AttributeKind::Priority(expr)
            | AttributeKind::InstanceType(expr)
            | AttributeKind::UseObjectSlot(expr)
            | AttributeKind::Unknown(expr) => {
                env.eval(expr)?;
            }
            AttributeKind::ControlPacket(body) => check_control_packet(body, env)?,
            AttributeKind::StartFrom(_) | AttributeKind::NonBlocking | AttributeKind::SkipFirstBody => {}
        }
    }
    Ok(())
}

fn check_control_packet(
    body: &ControlPacketBody,
    env: ConstEnv<'_>,
) -> Result<(), SemanticError> {
    let mut seen = HashSet::new();
    for setting in &body.settings {
        if catalogue::setting_bit(&setting.name).is_none() {
            return Err(SemanticError::UnknownSetting {
                name: setting.name.clone(),
                position: setting.span.start,
            });
        }
        if !seen.insert(setting.name.as_str()) {
            return Err(SemanticError::DuplicateSetting {
                name: setting.name.clone(),
                position: setting.span.start,
            });
        }
        env.eval(&setting.value)?;
    }
    for word in &body.data {
        env.eval(word)?;
    }
    Ok(())
}

fn validate_behaviour(
    behaviour: &Behaviour,
    target: Target,
    env: ConstEnv<'_>,
) -> Result<(), SemanticError> {
    check_attributes(&behaviour.attributes, target, env)?;

    let mut states = HashSet::new();
    for state in &behaviour.states {
        if !states.insert(state.name.as_str()) {
            return Err(SemanticError::DuplicateState {
                name: state.name.clone(),
                position: state.span.start,
            });
        }
    }

    for attribute in &behaviour.attributes {
        if let AttributeKind::StartFrom(name) = &attribute.kind {
            if !states.contains(name.as_str()) {
                return Err(SemanticError::UndefinedState {
                    name: name.clone(),
                    position: attribute.span.start,
                });
            }
        }
    }

    if let Some(starter) = &behaviour.starter {
        for assigner in &starter.assigners {
            let mut seen = HashSet::new();
            for field in &assigner.fields {
                if !ASSIGNER_FIELDS.contains(&field.name.as_str()) || !seen.insert(field.name.as_str()) {
                    return Err(SemanticError::UnknownAssignerField {
                        name: field.name.clone(),
                        position: field.span.start,
                    });
                }
                env.eval(&field.value)?;
            }
        }
    }

    for state in &behaviour.states {
        check_attributes(&state.attributes, Target::State, env)?;

        let uses_slot = state
            .attributes
            .iter()
            .any(|a| matches!(a.kind, AttributeKind::UseObjectSlot(_)));
        if uses_slot && state.target.is_some() {
            return Err(SemanticError::ConflictingStateTarget {
                state: state.name.clone(),
                position: state.span.start,
            });
        }

        for body in &state.bodies {
            if let Some(condition) = &body.condition {
                if let Some(parameter) = &condition.parameter {
                    env.eval(parameter)?;
                }
            }
            check_commands(&body.commands, env)?;
            if let Some(jump) = &body.jump {
                if !states.contains(jump.as_str()) {
                    return Err(SemanticError::UndefinedState {
                        name: jump.clone(),
                        position: body.span.start,
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_sequence(
    sequence: &Sequence,
    env: ConstEnv<'_>,
) -> Result<(), SemanticError> {
    check_attributes(&sequence.attributes, Target::Sequence, env)?;
    for pack in &sequence.packs {
        check_commands(&pack.commands, env)?;
    }
    check_commands(&sequence.commands, env)
}

fn check_commands(
    commands: &[Command],
    env: ConstEnv<'_>,
) -> Result<(), SemanticError> {
    for command in commands {
        for arg in &command.args {
            env.eval(arg)?;
        }
    }
    Ok(())
}
