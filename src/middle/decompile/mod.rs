//! Decompiler
//!
//! Reads the packed binary records back into an AST. Every read is bounds
//! checked, reserved bits must be zero and chains are walked iteratively,
//! stopping right after the first record whose has-next bit is clear.
//! States come back as `State_<index>`; the printer turns the tree into
//! canonical source.


use crate::error::Result;
use crate::frontend::analyze::validate::ASSIGNER_FIELDS;
use crate::frontend::lexer::tokens::is_identifier;
use crate::frontend::parser::ast::*;
use crate::middle::catalogue;
use crate::middle::codegen::buffer::ByteReader;
use crate::middle::codegen::layout::{self, Field, NONE_INDEX};
use crate::middle::resolve::{DecompileResolvers, ResolutionError, ResolverKind};
use crate::util::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

/// Malformed binary input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unexpected end of data at offset {offset} ({needed} more bytes needed)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("reserved bits {bits:#x} set in {record} at offset {offset}")]
    ReservedBits {
        record: &'static str,
        offset: usize,
        bits: u32,
    },

    /// Structurally readable but impossible, e.g. a jump past the last state
    #[error("implausible {what} at offset {offset}")]
    Implausible { what: String, offset: usize },

    #[error("graph {graph_id} declares {declared} bytes but its records span {actual}")]
    LengthMismatch {
        graph_id: u32,
        declared: u32,
        actual: usize,
    },

    #[error("{count} trailing bytes at offset {offset}")]
    TrailingBytes { offset: usize, count: usize },
}

/// Kind of a stored script item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Library,
    Behaviour,
    Sequence,
}

impl ItemKind {
    /// Kind of a parsed unit
    pub fn of(root: &Root) -> Self {
        match root {
            Root::Library(_) => ItemKind::Library,
            Root::Behaviour(_) => ItemKind::Behaviour,
            Root::Sequence(_) => ItemKind::Sequence,
        }
    }

    /// Name used when the item has none of its own
    pub fn fallback_name(
        self,
        id: u32,
    ) -> String {
        match self {
            ItemKind::Library => format!("Library_{}", id),
            ItemKind::Behaviour => format!("Behaviour_{}", id),
            ItemKind::Sequence => format!("Sequence_{}", id),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ItemKind::Library => write!(f, "library"),
            ItemKind::Behaviour => write!(f, "behaviour"),
            ItemKind::Sequence => write!(f, "sequence"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "library" => Ok(ItemKind::Library),
            "behaviour" | "behavior" => Ok(ItemKind::Behaviour),
            "sequence" => Ok(ItemKind::Sequence),
            other => Err(format!("unknown item kind `{}`", other)),
        }
    }
}

/// A script item as the host stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptItem {
    pub id: u32,
    pub kind: ItemKind,
    pub data: Vec<u8>,
}

impl ScriptItem {
    /// Display name: the graph name resolver's identifier for `id`, else
    /// `Behaviour_<id>` and friends
    pub fn name(
        &self,
        resolvers: &DecompileResolvers<'_>,
    ) -> Result<String> {
        Ok(resolvers
            .graph_identifier(self.id)?
            .unwrap_or_else(|| self.kind.fallback_name(self.id)))
    }
}

/// Decode binary data into an AST
pub fn decode(
    kind: ItemKind,
    bytes: &[u8],
    name: &str,
    resolvers: &DecompileResolvers<'_>,
) -> Result<Root> {
    if !is_identifier(name) {
        return Err(ResolutionError::InvalidName {
            kind: ResolverKind::Graph,
            name: name.to_string(),
        }
        .into());
    }

    let mut decoder = Decoder::new(bytes, resolvers);
    let root = match kind {
        ItemKind::Library => Root::Library(decoder.library(name)?),
        ItemKind::Behaviour => Root::Behaviour(decoder.behaviour(name.to_string(), Vec::new())?),
        ItemKind::Sequence => Root::Sequence(decoder.sequence(name)?),
    };
    decoder.finish()?;
    debug!("decoded {} `{}` from {} bytes", kind, name, bytes.len());
    Ok(root)
}

fn attribute(kind: AttributeKind) -> Attribute {
    Attribute {
        kind,
        span: Span::dummy(),
    }
}

fn number(value: impl Into<i64>) -> Expr {
    Expr::number(value.into())
}

fn state_name(index: usize) -> String {
    format!("State_{}", index)
}

/// Record reader for one buffer
struct Decoder<'a, 'r> {
    reader: ByteReader<'a>,
    resolvers: &'r DecompileResolvers<'r>,
}

impl<'a, 'r> Decoder<'a, 'r> {
    fn new(
        bytes: &'a [u8],
        resolvers: &'r DecompileResolvers<'r>,
    ) -> Self {
        Self {
            reader: ByteReader::new(bytes),
            resolvers,
        }
    }

    fn finish(&self) -> std::result::Result<(), FormatError> {
        if self.reader.is_empty() {
            Ok(())
        } else {
            Err(FormatError::TrailingBytes {
                offset: self.reader.offset(),
                count: self.reader.remaining(),
            })
        }
    }

    /// Fail if any reserved bit of `word` is set
    fn reserved(
        &self,
        record: &'static str,
        offset: usize,
        field: Field,
        word: u32,
    ) -> std::result::Result<(), FormatError> {
        match field.get(word) {
            0 => Ok(()),
            bits => Err(FormatError::ReservedBits {
                record,
                offset,
                bits: field.put(bits),
            }),
        }
    }

    fn implausible(
        what: impl Into<String>,
        offset: usize,
    ) -> FormatError {
        FormatError::Implausible {
            what: what.into(),
            offset,
        }
    }

    fn library(
        &mut self,
        name: &str,
    ) -> Result<Library> {
        let count = self.reader.u16()?;
        let unknown = self.reader.u16()?;

        let mut attributes = Vec::new();
        if unknown != 0 {
            attributes.push(attribute(AttributeKind::Unknown(number(unknown))));
        }

        let mut behaviours = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let graph_id = self.reader.u32()?;
            let declared = self.reader.u32()?;
            let start = self.reader.offset();

            let (entry_name, entry_attributes) = match self.resolvers.graph_identifier(graph_id)? {
                Some(entry_name) => (entry_name, Vec::new()),
                None => (
                    ItemKind::Behaviour.fallback_name(graph_id),
                    vec![attribute(AttributeKind::GlobalIndex(number(graph_id)))],
                ),
            };
            let behaviour = self.behaviour(entry_name, entry_attributes)?;

            let actual = self.reader.offset() - start;
            if actual != declared as usize {
                return Err(FormatError::LengthMismatch {
                    graph_id,
                    declared,
                    actual,
                }
                .into());
            }
            behaviours.push(behaviour);
        }

        Ok(Library {
            attributes,
            name: name.to_string(),
            consts: ConstList::default(),
            behaviours,
            span: Span::dummy(),
        })
    }

    fn behaviour(
        &mut self,
        name: String,
        mut attributes: Vec<Attribute>,
    ) -> Result<Behaviour> {
        let offset = self.reader.offset();
        let header = self.reader.u32()?;
        self.reserved("behaviour header", offset, layout::graph::RESERVED, header)?;

        let starter = if layout::graph::HAS_STARTER.flag(header) {
            Some(self.starter()?)
        } else {
            None
        };

        let mut states = Vec::new();
        let mut jumps = Vec::new();
        loop {
            if states.len() == 256 {
                return Err(Self::implausible("state count", self.reader.offset()).into());
            }
            let index = states.len();
            let (state, has_next) = self.state(index, &mut jumps)?;
            states.push(state);
            if !has_next {
                break;
            }
        }
        trace!("`{}`: {} states", name, states.len());

        for (jump_offset, target) in jumps {
            if target >= states.len() {
                return Err(Self::implausible(format!("jump to state {}", target), jump_offset).into());
            }
        }

        let start_state = layout::graph::START_STATE.get(header) as usize;
        if start_state >= states.len() {
            return Err(Self::implausible(format!("start state {}", start_state), offset).into());
        }

        attributes.push(attribute(AttributeKind::Priority(number(
            layout::graph::PRIORITY.get(header),
        ))));
        attributes.push(attribute(AttributeKind::StartFrom(state_name(start_state))));
        let unknown = layout::graph::UNKNOWN.get(header);
        if unknown != 0 {
            attributes.push(attribute(AttributeKind::Unknown(number(unknown))));
        }

        Ok(Behaviour {
            attributes,
            name,
            consts: ConstList::default(),
            starter,
            states,
            span: Span::dummy(),
        })
    }

    fn starter(&mut self) -> Result<Starter> {
        let count = self.reader.u16()?;
        let mut assigners = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let object = self.resolvers.object(self.reader.u16()?)?;
            let word = u32::from(self.reader.u16()?);
            let fields = ASSIGNER_FIELDS
                .iter()
                .zip(layout::assigner::FIELDS)
                .filter(|(_, bits)| bits.get(word) != 0)
                .map(|(name, bits)| Assign {
                    name: (*name).to_string(),
                    value: number(bits.get(word)),
                    span: Span::dummy(),
                })
                .collect();
            assigners.push(Assigner {
                object,
                fields,
                span: Span::dummy(),
            });
        }
        Ok(Starter {
            assigners,
            span: Span::dummy(),
        })
    }

    /// Read one state; returns it with its has-next bit
    fn state(
        &mut self,
        index: usize,
        jumps: &mut Vec<(usize, usize)>,
    ) -> Result<(State, bool)> {
        let offset = self.reader.offset();
        let header = u32::from(self.reader.u16()?);
        self.reserved("state header", offset, layout::state::RESERVED, header)?;
        let target_slot = self.reader.i16()?;

        let mut attributes = Vec::new();
        let target = if layout::state::USES_OBJECT_SLOT.flag(header) {
            if target_slot < 0 {
                return Err(Self::implausible(format!("object slot {}", target_slot), offset).into());
            }
            attributes.push(attribute(AttributeKind::UseObjectSlot(number(target_slot))));
            None
        } else if target_slot == NONE_INDEX {
            None
        } else if target_slot < 0 {
            return Err(Self::implausible(format!("state target {}", target_slot), offset).into());
        } else {
            Some(self.resolvers.state_graph(target_slot)?)
        };

        if layout::state::HAS_CONTROL_PACKET.flag(header) {
            let packet = self.control_packet()?;
            attributes.push(attribute(AttributeKind::ControlPacket(packet)));
        }
        if layout::state::NON_BLOCKING.flag(header) {
            attributes.push(attribute(AttributeKind::NonBlocking));
        }
        if layout::state::SKIP_FIRST_BODY.flag(header) {
            attributes.push(attribute(AttributeKind::SkipFirstBody));
        }

        let body_count = layout::state::BODY_COUNT.get(header);
        let mut bodies = Vec::with_capacity(body_count as usize);
        for _ in 0..body_count {
            bodies.push(self.body(jumps)?);
        }

        let state = State {
            attributes,
            name: state_name(index),
            target,
            bodies,
            span: Span::dummy(),
        };
        Ok((state, layout::state::HAS_NEXT.flag(header)))
    }

    fn control_packet(&mut self) -> Result<ControlPacketBody> {
        let offset = self.reader.offset();
        let header = self.reader.u32()?;
        self.reserved("control packet", offset, layout::control_packet::RESERVED, header)?;

        let mask = layout::control_packet::SETTINGS_MASK.get(header);
        let mut settings = Vec::new();
        for (bit, name) in catalogue::SETTINGS.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                settings.push(Assign {
                    name: (*name).to_string(),
                    value: number(self.reader.u8()?),
                    span: Span::dummy(),
                });
            }
        }

        let data_count = layout::control_packet::DATA_COUNT.get(header);
        let mut data = Vec::with_capacity(data_count as usize);
        for _ in 0..data_count {
            data.push(number(self.reader.i32()?));
        }
        Ok(ControlPacketBody { settings, data })
    }

    fn body(
        &mut self,
        jumps: &mut Vec<(usize, usize)>,
    ) -> Result<StateBody> {
        let offset = self.reader.offset();
        let header = u32::from(self.reader.u16()?);
        self.reserved("body header", offset, layout::body::RESERVED, header)?;

        let jump_offset = self.reader.offset();
        let jump = match self.reader.i16()? {
            NONE_INDEX => None,
            target if target < 0 => {
                return Err(Self::implausible(format!("jump to state {}", target), jump_offset).into())
            }
            target => {
                let target = target as usize;
                jumps.push((jump_offset, target));
                Some(state_name(target))
            }
        };

        let condition = if layout::body::HAS_CONDITION.flag(header) {
            let id = self.reader.u16()?;
            let flags_offset = self.reader.offset();
            let flags = u32::from(self.reader.u16()?);
            self.reserved("condition flags", flags_offset, layout::condition::RESERVED, flags)?;
            let parameter = self.reader.i32()?;
            Some(Condition {
                id,
                negate: layout::condition::NEGATE.flag(flags),
                parameter: (parameter != 0).then(|| number(parameter)),
                span: Span::dummy(),
            })
        } else {
            None
        };

        let commands = if layout::body::HAS_COMMANDS.flag(header) {
            self.command_chain()?
        } else {
            Vec::new()
        };

        Ok(StateBody {
            condition,
            commands,
            jump,
            span: Span::dummy(),
        })
    }

    /// Read commands until one has its has-next bit clear
    fn command_chain(&mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        loop {
            let offset = self.reader.offset();
            let word = self.reader.u32()?;
            self.reserved("command", offset, layout::command::RESERVED, word)?;

            let arg_count = layout::command::ARG_COUNT.get(word);
            let mut args = Vec::with_capacity(arg_count as usize);
            for _ in 0..arg_count {
                args.push(number(self.reader.i32()?));
            }
            commands.push(Command {
                id: layout::command::ID.get(word) as u16,
                args,
                span: Span::dummy(),
            });

            if !layout::command::HAS_NEXT.flag(word) {
                return Ok(commands);
            }
        }
    }

    fn command_pack(&mut self) -> Result<Vec<Command>> {
        let offset = self.reader.offset();
        let flags = u32::from(self.reader.u16()?);
        self.reserved("command pack", offset, layout::pack::RESERVED, flags)?;
        if layout::pack::HAS_COMMANDS.flag(flags) {
            self.command_chain()
        } else {
            Ok(Vec::new())
        }
    }

    fn sequence(
        &mut self,
        name: &str,
    ) -> Result<Sequence> {
        let header = self.reader.u32()?;

        let pack_count = layout::sequence::PACK_COUNT.get(header);
        let mut packs = Vec::with_capacity(pack_count as usize);
        for _ in 0..pack_count {
            let commands = self.command_pack()?;
            let script = self.resolvers.graph(u32::from(self.reader.u16()?))?;
            packs.push(CommandPack {
                script,
                commands,
                span: Span::dummy(),
            });
        }
        let commands = self.command_pack()?;

        let mut attributes = vec![
            attribute(AttributeKind::GlobalIndex(number(layout::sequence::GLOBAL_INDEX.get(header)))),
            attribute(AttributeKind::InstanceType(number(layout::sequence::INSTANCE_TYPE.get(header)))),
        ];
        let unknown = layout::sequence::UNKNOWN.get(header);
        if unknown != 0 {
            attributes.push(attribute(AttributeKind::Unknown(number(unknown))));
        }

        Ok(Sequence {
            attributes,
            name: name.to_string(),
            consts: ConstList::default(),
            packs,
            commands,
            span: Span::dummy(),
        })
    }
}
