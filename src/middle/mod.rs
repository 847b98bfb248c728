//! Binary side of the toolchain
//!
//! Name tables, resolvers, the emitter and the decompiler.

pub mod catalogue;
pub mod codegen;
pub mod decompile;
pub mod resolve;

pub use codegen::emit;
pub use decompile::{decode, FormatError, ItemKind, ScriptItem};
pub use resolve::{CompileResolvers, DecompileResolvers, ResolutionError};
