//! Check command implementation
//!
//! Walks files and directories for `.agl` sources and compiles each one
//! in parallel without writing any output.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::frontend::{CompiledScript, Compiler};
use crate::middle::resolve::ResolverSet;

/// Source file extension
pub const SOURCE_EXTENSION: &str = "agl";

/// Result of checking one file
#[derive(Debug)]
pub struct CheckOutcome {
    pub path: PathBuf,
    pub result: Result<CompiledScript>,
}

impl CheckOutcome {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Collect all `.agl` source files from the given paths
///
/// Files named explicitly are kept even without the extension. Directory
/// contents are returned sorted.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(anyhow::anyhow!("Path does not exist: {}", path.display()));
        }

        if path.is_file() {
            if !is_source(path) {
                warn!("checking {} although it is not a .{} file", path.display(), SOURCE_EXTENSION);
            }
            files.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && is_source(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        debug!("found {} source files under {}", found.len(), path.display());
        files.extend(found);
    }

    Ok(files)
}

fn is_source(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(SOURCE_EXTENSION)
}

/// Compile every file in parallel, keeping input order in the output
pub fn check_files(
    files: &[PathBuf],
    symbols: &ResolverSet,
) -> Vec<CheckOutcome> {
    files
        .par_iter()
        .map(|path| CheckOutcome {
            path: path.clone(),
            result: check_file(path, symbols),
        })
        .collect()
}

/// Compile a single file
pub fn check_file(
    path: &Path,
    symbols: &ResolverSet,
) -> Result<CompiledScript> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;

    // 每个任务各自持有一套解析器
    let compiler = Compiler::with_resolvers(symbols.compile_resolvers());
    let script = compiler
        .compile(&source)
        .with_context(|| format!("{} failed to compile", path.display()))?;
    debug!("{}: `{}` ({} bytes)", path.display(), script.name, script.bytes.len());
    Ok(script)
}
