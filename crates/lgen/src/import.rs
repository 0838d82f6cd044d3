//! Import resolution.
//!
//! Every document may import other documents with `[text](target)` lines.
//! An [`ImportResolver`] maps the target as written to loadable content
//! plus a canonical resolved id; resolution walks the import graph
//! breadth-first and deduplicates by resolved id, so diamond-shaped graphs
//! load each document once.

use std::{
    collections::VecDeque,
    fs, io,
    path::{MAIN_SEPARATOR, Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use log::trace;

use crate::{document::SourceUnit, error::LgenError};

/// Maps an import target to its content and canonical resolved id.
///
/// The resolved id is the deduplication key: two targets that resolve to
/// the same id are loaded once. Implementations may read the file system,
/// an in-memory table, or anything else.
pub trait ImportResolver {
    /// Resolve `target` as written in the document identified by
    /// `importer_id`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the target cannot be loaded. The engine
    /// wraps it with the offending import target.
    fn resolve(&self, importer_id: &str, target: &str) -> io::Result<(String, String)>;
}

/// Resolves import targets as file system paths relative to the importing
/// file. Either path separator convention is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl ImportResolver for FileResolver {
    fn resolve(&self, importer_id: &str, target: &str) -> io::Result<(String, String)> {
        let path = resolve_path(importer_id, target);
        let content = fs::read_to_string(&path)?;
        let resolved = fs::canonicalize(&path).unwrap_or(path);
        Ok((content, resolved.to_string_lossy().into_owned()))
    }
}

fn resolve_path(importer_id: &str, target: &str) -> PathBuf {
    let target = PathBuf::from(normalize_separators(target));
    if target.is_absolute() {
        return target;
    }
    match Path::new(&normalize_separators(importer_id)).parent() {
        Some(base) if !base.as_os_str().is_empty() => base.join(target),
        _ => target,
    }
}

/// Rewrites whichever separator convention the source used into the
/// platform's.
fn normalize_separators(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.replace('\\', "/")
    } else {
        path.replace('/', "\\")
    }
}

/// Load the transitive import closure of `root`.
///
/// Fills in the resolved id of every import along the way. The `cache`
/// holds already-parsed units keyed by resolved id, shared across a batch
/// so common imports are parsed once.
pub(crate) fn resolve_references(
    root: &mut SourceUnit,
    resolver: &dyn ImportResolver,
    cache: &mut IndexMap<String, SourceUnit>,
) -> Result<IndexMap<String, SourceUnit>, LgenError> {
    let mut references: IndexMap<String, SourceUnit> = IndexMap::new();
    let mut visited: IndexSet<String> = IndexSet::new();
    visited.insert(root.id().to_string());

    let mut queue: VecDeque<SourceUnit> =
        resolve_imports(root, resolver, &mut visited, cache)?.into();
    while let Some(mut unit) = queue.pop_front() {
        let discovered = resolve_imports(&mut unit, resolver, &mut visited, cache)?;
        queue.extend(discovered);
        references.insert(unit.id().to_string(), unit);
    }
    Ok(references)
}

/// Resolve the direct imports of one unit, returning the units discovered
/// for the first time.
fn resolve_imports(
    unit: &mut SourceUnit,
    resolver: &dyn ImportResolver,
    visited: &mut IndexSet<String>,
    cache: &mut IndexMap<String, SourceUnit>,
) -> Result<Vec<SourceUnit>, LgenError> {
    let importer_id = unit.id().to_string();
    let mut discovered = Vec::new();
    for import in unit.imports_mut() {
        let (content, resolved) =
            resolver
                .resolve(&importer_id, &import.target)
                .map_err(|source| LgenError::Import {
                    id: import.target.clone(),
                    source,
                })?;
        import.resolved_id = resolved.clone();
        if !visited.insert(resolved.clone()) {
            continue;
        }
        trace!(importer = importer_id.as_str(), resolved = resolved.as_str(); "Resolved import");
        let sub = match cache.get(&resolved) {
            Some(unit) => unit.clone(),
            None => {
                let unit = SourceUnit::parse(&content, &resolved);
                cache.insert(resolved.clone(), unit.clone());
                unit
            }
        };
        discovered.push(sub);
    }
    Ok(discovered)
}
