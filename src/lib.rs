//! AgentLab behaviour scripting toolchain
//!
//! Compiles AgentLab source (libraries, behaviours and command sequences)
//! into the packed binary records a game engine loads, and decompiles those
//! records back into readable source.
//!
//! # Example
//!
//! ```
//! use agentlab::{compile_source, decompile, CompileResolvers, DecompileResolvers, ItemKind};
//!
//! let source = "behaviour Idle { state Wait() { do { Wait(30); } } }";
//! let bytes = compile_source(source, &CompileResolvers::none())?;
//! let text = decompile(ItemKind::Behaviour, &bytes, "Idle", &DecompileResolvers::none())?;
//! assert!(text.contains("Wait(30);"));
//! # Ok::<(), agentlab::Error>(())
//! ```

#![warn(rust_2018_idioms)]

pub mod error;
pub mod frontend;
pub mod middle;
pub mod util;

pub use error::{Error, Result};
pub use frontend::printer::PrintOptions;
pub use frontend::{CompiledScript, Compiler};
pub use middle::decompile::{FormatError, ItemKind, ScriptItem};
pub use middle::resolve::{
    CompileResolvers, DecompileResolvers, DefaultResolver, GlobalObjectIdResolver, GlobalObjectNameResolver,
    GraphNameResolver, GraphResolver, ResolutionError, ResolverKind, ResolverSet, StateGraphNameResolver,
    StateGraphResolver, SymbolMap,
};

use tracing::debug;

/// Toolchain version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Toolchain name
pub const NAME: &str = "AgentLab";

/// Compile source text to binary
pub fn compile_source(
    source: &str,
    resolvers: &CompileResolvers<'_>,
) -> Result<Vec<u8>> {
    Compiler::with_resolvers(*resolvers)
        .compile(source)
        .map(|script| script.bytes)
}

/// Decompile binary data to canonical source text
pub fn decompile(
    kind: ItemKind,
    bytes: &[u8],
    name: &str,
    resolvers: &DecompileResolvers<'_>,
) -> Result<String> {
    decompile_with_options(kind, bytes, name, resolvers, &PrintOptions::default())
}

/// Decompile with explicit printing options
pub fn decompile_with_options(
    kind: ItemKind,
    bytes: &[u8],
    name: &str,
    resolvers: &DecompileResolvers<'_>,
    options: &PrintOptions,
) -> Result<String> {
    let root = middle::decode(kind, bytes, name, resolvers)?;
    Ok(frontend::printer::print_root(&root, options))
}

/// Decompile a host script item, naming it through the graph name resolver
pub fn decompile_item(
    item: &ScriptItem,
    resolvers: &DecompileResolvers<'_>,
) -> Result<String> {
    let name = item.name(resolvers)?;
    debug!("decompiling {} item {} as `{}`", item.kind, item.id, name);
    decompile(item.kind, &item.data, &name, resolvers)
}

/// Re-print source in canonical layout without evaluating it
///
/// Comments are not preserved.
pub fn format_source(
    source: &str,
    options: &PrintOptions,
) -> Result<String> {
    let tokens = frontend::lexer::tokenize(source)?;
    let root = frontend::parser::parse(&tokens)?;
    Ok(frontend::printer::print_root(&root, options))
}
