//! Code generation
//!
//! Lowers an analyzed AST into the engine's packed binary records.
//! Expressions are evaluated against the symbol table, references go
//! through the compile resolvers, and every value is range checked against
//! its field before it is written. Nothing is ever truncated.

pub mod buffer;
pub mod layout;

#[cfg(test)]
mod tests;

use self::buffer::ByteWriter;
use self::layout::{Field, NONE_INDEX};
use crate::error::Result;
use crate::frontend::analyze::validate::ASSIGNER_FIELDS;
use crate::frontend::analyze::{ConstEnv, SemanticError, SymbolTable};
use crate::frontend::parser::ast::*;
use crate::middle::catalogue;
use crate::middle::resolve::CompileResolvers;
use crate::util::span::Position;
use std::collections::HashMap;
use tracing::debug;

/// Emit the binary form of an analyzed unit
pub fn emit(
    root: &Root,
    symbols: &SymbolTable,
    resolvers: &CompileResolvers<'_>,
) -> Result<Vec<u8>> {
    let mut emitter = Emitter::new(symbols, resolvers);
    match root {
        Root::Library(library) => emitter.library(library)?,
        Root::Behaviour(behaviour) => emitter.behaviour(behaviour, symbols.root_env())?,
        Root::Sequence(sequence) => emitter.sequence(sequence)?,
    }
    let bytes = emitter.finish();
    debug!("emitted {} bytes for `{}`", bytes.len(), root.name());
    Ok(bytes)
}

/// Check `value` against an inclusive range
fn ranged(
    value: i64,
    min: i64,
    max: i64,
    what: impl FnOnce() -> String,
) -> std::result::Result<i64, SemanticError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(SemanticError::OutOfRange {
            what: what(),
            value,
            min,
            max,
        })
    }
}

/// Check a value against the capacity of a header field
fn fits(
    field: Field,
    value: i64,
    what: impl FnOnce() -> String,
) -> std::result::Result<u32, SemanticError> {
    ranged(value, 0, i64::from(field.max()), what).map(|v| v as u32)
}

fn count(
    len: usize,
    max: i64,
    what: impl FnOnce() -> String,
) -> std::result::Result<i64, SemanticError> {
    ranged(i64::try_from(len).unwrap_or(i64::MAX), 0, max, what)
}

/// Binary emitter for one compilation unit
pub struct Emitter<'a> {
    symbols: &'a SymbolTable,
    resolvers: &'a CompileResolvers<'a>,
    out: ByteWriter,
}

impl<'a> Emitter<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        resolvers: &'a CompileResolvers<'a>,
    ) -> Self {
        Self {
            symbols,
            resolvers,
            out: ByteWriter::new(),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.out.into_bytes()
    }

    fn library(
        &mut self,
        library: &Library,
    ) -> Result<()> {
        let symbols = self.symbols;
        let env = symbols.root_env();
        let behaviour_count = count(library.behaviours.len(), i64::from(u16::MAX), || {
            format!("behaviour count of library `{}`", library.name)
        })?;
        let unknown = match find_expr(&library.attributes, is_unknown) {
            Some(expr) => ranged(env.eval(expr)?, 0, i64::from(u16::MAX), || {
                format!("`Unknown` of library `{}`", library.name)
            })?,
            None => 0,
        };
        self.out.u16(behaviour_count as u16);
        self.out.u16(unknown as u16);

        let mut graph_ids: HashMap<i64, &str> = HashMap::new();
        for behaviour in &library.behaviours {
            let env = symbols.behaviour_env(&behaviour.name);
            let graph_id = match find_expr(&behaviour.attributes, is_global_index) {
                Some(expr) => env.eval(expr)?,
                None => self.resolvers.graph_id(&behaviour.name)?,
            };
            let graph_id = ranged(graph_id, 0, i64::from(u32::MAX), || {
                format!("graph id of behaviour `{}`", behaviour.name)
            })?;
            if let Some(first) = graph_ids.insert(graph_id, &behaviour.name) {
                return Err(SemanticError::DuplicateGraphId {
                    id: graph_id,
                    name: behaviour.name.clone(),
                    first: first.to_string(),
                    position: behaviour.span.start,
                }
                .into());
            }
            self.out.u32(graph_id as u32);

            let length_at = self.out.len();
            self.out.u32(0);
            let start = self.out.len();
            self.behaviour(behaviour, env)?;
            let length = count(self.out.len() - start, i64::from(u32::MAX), || {
                format!("byte length of behaviour `{}`", behaviour.name)
            })?;
            self.out.patch_u32(length_at, length as u32);
        }
        Ok(())
    }

    fn behaviour(
        &mut self,
        behaviour: &Behaviour,
        env: ConstEnv<'_>,
    ) -> Result<()> {
        let name = &behaviour.name;
        count(behaviour.states.len(), 256, || format!("state count of behaviour `{}`", name))?;

        let mut start_state = 0;
        let mut priority = 0;
        let mut unknown = 0;
        for attribute in &behaviour.attributes {
            match &attribute.kind {
                AttributeKind::StartFrom(state) => {
                    start_state = state_index(&behaviour.states, state, attribute.span.start)?;
                }
                AttributeKind::Priority(expr) => {
                    priority = fits(layout::graph::PRIORITY, env.eval(expr)?, || {
                        format!("priority of behaviour `{}`", name)
                    })?;
                }
                AttributeKind::Unknown(expr) => {
                    unknown = fits(layout::graph::UNKNOWN, env.eval(expr)?, || {
                        format!("`Unknown` of behaviour `{}`", name)
                    })?;
                }
                _ => {}
            }
        }

        let header = layout::graph::START_STATE.put(start_state as u32)
            | layout::graph::PRIORITY.put(priority)
            | layout::graph::HAS_STARTER.put_flag(behaviour.starter.is_some())
            | layout::graph::UNKNOWN.put(unknown);
        self.out.u32(header);

        if let Some(starter) = &behaviour.starter {
            self.starter(starter, env)?;
        }

        let last = behaviour.states.len().saturating_sub(1);
        for (index, state) in behaviour.states.iter().enumerate() {
            self.state(state, &behaviour.states, index < last, env)?;
        }
        Ok(())
    }

    fn starter(
        &mut self,
        starter: &Starter,
        env: ConstEnv<'_>,
    ) -> Result<()> {
        let assigner_count = count(starter.assigners.len(), i64::from(u16::MAX), || "assigner count".to_string())?;
        self.out.u16(assigner_count as u16);

        for assigner in &starter.assigners {
            let object = ranged(self.resolvers.object(&assigner.object)?, 0, i64::from(u16::MAX), || {
                format!("global object id `{}`", assigner.object)
            })?;
            self.out.u16(object as u16);

            let mut word = 0u32;
            for field in &assigner.fields {
                let slot = ASSIGNER_FIELDS
                    .iter()
                    .position(|f| *f == field.name)
                    .ok_or_else(|| SemanticError::UnknownAssignerField {
                        name: field.name.clone(),
                        position: field.span.start,
                    })?;
                let bits = layout::assigner::FIELDS[slot];
                word |= bits.put(fits(bits, env.eval(&field.value)?, || format!("assigner field `{}`", field.name))?);
            }
            self.out.u16(word as u16);
        }
        Ok(())
    }

    fn state(
        &mut self,
        state: &State,
        states: &[State],
        has_next: bool,
        env: ConstEnv<'_>,
    ) -> Result<()> {
        let name = &state.name;
        let body_count = fits(layout::state::BODY_COUNT, state.bodies.len() as i64, || {
            format!("body count of state `{}`", name)
        })?;

        let mut skip_first_body = false;
        let mut non_blocking = false;
        let mut slot = None;
        let mut packet = None;
        for attribute in &state.attributes {
            match &attribute.kind {
                AttributeKind::SkipFirstBody => skip_first_body = true,
                AttributeKind::NonBlocking => non_blocking = true,
                AttributeKind::UseObjectSlot(expr) => slot = Some(env.eval(expr)?),
                AttributeKind::ControlPacket(body) => packet = Some(body),
                _ => {}
            }
        }

        let target = match (slot, &state.target) {
            (Some(slot), _) => slot,
            (None, Some(reference)) => self.resolvers.state_graph(reference)?,
            (None, None) => i64::from(NONE_INDEX),
        };
        if slot.is_some() || state.target.is_some() {
            ranged(target, 0, i64::from(i16::MAX), || format!("target of state `{}`", name))?;
        }

        let header = layout::state::BODY_COUNT.put(body_count)
            | layout::state::SKIP_FIRST_BODY.put_flag(skip_first_body)
            | layout::state::NON_BLOCKING.put_flag(non_blocking)
            | layout::state::USES_OBJECT_SLOT.put_flag(slot.is_some())
            | layout::state::HAS_CONTROL_PACKET.put_flag(packet.is_some())
            | layout::state::HAS_NEXT.put_flag(has_next);
        self.out.u16(header as u16);
        self.out.i16(target as i16);

        if let Some(packet) = packet {
            self.control_packet(packet, env)?;
        }
        for body in &state.bodies {
            self.body(body, states, env)?;
        }
        Ok(())
    }

    fn control_packet(
        &mut self,
        packet: &ControlPacketBody,
        env: ConstEnv<'_>,
    ) -> Result<()> {
        let mut values = [None; 16];
        for setting in &packet.settings {
            let bit = catalogue::setting_bit(&setting.name).ok_or_else(|| SemanticError::UnknownSetting {
                name: setting.name.clone(),
                position: setting.span.start,
            })?;
            let value = ranged(env.eval(&setting.value)?, 0, i64::from(u8::MAX), || {
                format!("control packet setting `{}`", setting.name)
            })?;
            values[bit as usize] = Some(value as u8);
        }

        let mask = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .fold(0u32, |mask, (bit, _)| mask | (1 << bit));
        let data_count = fits(layout::control_packet::DATA_COUNT, packet.data.len() as i64, || {
            "control packet data count".to_string()
        })?;
        self.out
            .u32(layout::control_packet::SETTINGS_MASK.put(mask) | layout::control_packet::DATA_COUNT.put(data_count));
        for value in values.iter().flatten() {
            self.out.u8(*value);
        }
        for word in &packet.data {
            let value = word32(env.eval(word)?, || "control packet data".to_string())?;
            self.out.i32(value);
        }
        Ok(())
    }

    fn body(
        &mut self,
        body: &StateBody,
        states: &[State],
        env: ConstEnv<'_>,
    ) -> Result<()> {
        let header = layout::body::HAS_CONDITION.put_flag(body.condition.is_some())
            | layout::body::HAS_COMMANDS.put_flag(!body.commands.is_empty());
        self.out.u16(header as u16);

        let jump = match &body.jump {
            Some(target) => state_index(states, target, body.span.start)?,
            None => i64::from(NONE_INDEX),
        };
        self.out.i16(jump as i16);

        if let Some(condition) = &body.condition {
            self.out.u16(condition.id);
            self.out.u16(layout::condition::NEGATE.put_flag(condition.negate) as u16);
            let parameter = match &condition.parameter {
                Some(expr) => word32(env.eval(expr)?, || {
                    format!("parameter of condition `{}`", catalogue::condition_name(condition.id))
                })?,
                None => 0,
            };
            self.out.i32(parameter);
        }
        self.commands(&body.commands, env)
    }

    /// Write a command chain; an empty list writes nothing
    fn commands(
        &mut self,
        commands: &[Command],
        env: ConstEnv<'_>,
    ) -> Result<()> {
        let last = commands.len().saturating_sub(1);
        for (index, command) in commands.iter().enumerate() {
            let arg_count = fits(layout::command::ARG_COUNT, command.args.len() as i64, || {
                format!("argument count of `{}`", catalogue::command_name(command.id))
            })?;
            let word = layout::command::ID.put(u32::from(command.id))
                | layout::command::ARG_COUNT.put(arg_count)
                | layout::command::HAS_NEXT.put_flag(index < last);
            self.out.u32(word);
            for arg in &command.args {
                let value = word32(env.eval(arg)?, || {
                    format!("argument of `{}`", catalogue::command_name(command.id))
                })?;
                self.out.i32(value);
            }
        }
        Ok(())
    }

    fn command_pack(
        &mut self,
        commands: &[Command],
        env: ConstEnv<'_>,
    ) -> Result<()> {
        self.out
            .u16(layout::pack::HAS_COMMANDS.put_flag(!commands.is_empty()) as u16);
        self.commands(commands, env)
    }

    fn sequence(
        &mut self,
        sequence: &Sequence,
    ) -> Result<()> {
        let symbols = self.symbols;
        let env = symbols.root_env();
        let name = &sequence.name;

        let mut instance_type = 0;
        let mut global_index = 0;
        let mut unknown = 0;
        for attribute in &sequence.attributes {
            match &attribute.kind {
                AttributeKind::InstanceType(expr) => {
                    instance_type = fits(layout::sequence::INSTANCE_TYPE, env.eval(expr)?, || {
                        format!("instance type of sequence `{}`", name)
                    })?;
                }
                AttributeKind::GlobalIndex(expr) => {
                    global_index = fits(layout::sequence::GLOBAL_INDEX, env.eval(expr)?, || {
                        format!("global index of sequence `{}`", name)
                    })?;
                }
                AttributeKind::Unknown(expr) => {
                    unknown = fits(layout::sequence::UNKNOWN, env.eval(expr)?, || {
                        format!("`Unknown` of sequence `{}`", name)
                    })?;
                }
                _ => {}
            }
        }
        let pack_count = fits(layout::sequence::PACK_COUNT, sequence.packs.len() as i64, || {
            format!("pack count of sequence `{}`", name)
        })?;

        self.out.u32(
            layout::sequence::INSTANCE_TYPE.put(instance_type)
                | layout::sequence::GLOBAL_INDEX.put(global_index)
                | layout::sequence::PACK_COUNT.put(pack_count)
                | layout::sequence::UNKNOWN.put(unknown),
        );

        for pack in &sequence.packs {
            self.command_pack(&pack.commands, env)?;
            let script = ranged(self.resolvers.graph(&pack.script)?, 0, i64::from(u16::MAX), || {
                format!("script id `{}`", pack.script)
            })?;
            self.out.u16(script as u16);
        }
        self.command_pack(&sequence.commands, env)
    }
}

/// Check a value against the signed 32-bit argument slot
fn word32(
    value: i64,
    what: impl FnOnce() -> String,
) -> std::result::Result<i32, SemanticError> {
    ranged(value, i64::from(i32::MIN), i64::from(i32::MAX), what).map(|v| v as i32)
}

fn state_index(
    states: &[State],
    name: &str,
    position: Position,
) -> std::result::Result<i64, SemanticError> {
    states
        .iter()
        .position(|s| s.name == name)
        .map(|i| i as i64)
        .ok_or_else(|| SemanticError::UndefinedState {
            name: name.to_string(),
            position,
        })
}

fn find_expr<'e>(
    attributes: &'e [Attribute],
    pick: fn(&AttributeKind) -> Option<&Expr>,
) -> Option<&'e Expr> {
    attributes.iter().find_map(|a| pick(&a.kind))
}

fn is_unknown(kind: &AttributeKind) -> Option<&Expr> {
    match kind {
        AttributeKind::Unknown(expr) => Some(expr),
        _ => None,
    }
}

fn is_global_index(kind: &AttributeKind) -> Option<&Expr> {
    match kind {
        AttributeKind::GlobalIndex(expr) => Some(expr),
        _ => None,
    }
}
