//! Top-level `import` resolution.
//!
//! Imports are resolved after parsing and before evaluation: each top-level
//! `(import "ref")` node is replaced by the forms of the referenced fragment,
//! in source order, one reference at a time.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::ast::{Expr, Keyword};
use crate::error::Error;
use crate::parse::parse;

/// Splices allowed in one program before resolution gives up.
pub const MAX_IMPORTS: usize = 256;

/// Turns an import reference into parsed forms.
pub trait ImportResolver {
    fn resolve(&mut self, reference: &str) -> Result<Vec<Expr>, Error>;
}

/// Produces the source text behind a reference.
pub trait Fetch {
    fn fetch(&mut self, reference: &str) -> Result<String, Error>;
}

impl<F> Fetch for F
where
    F: FnMut(&str) -> Result<String, Error>,
{
    fn fetch(&mut self, reference: &str) -> Result<String, Error> {
        self(reference)
    }
}

/// Reads references as paths relative to a base directory.
#[derive(Debug, Clone)]
pub struct FileFetch {
    base: PathBuf,
}

impl FileFetch {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        FileFetch { base: base.into() }
    }
}

impl Fetch for FileFetch {
    fn fetch(&mut self, reference: &str) -> Result<String, Error> {
        let path = self.base.join(reference);
        fs::read_to_string(&path)
            .map_err(|e| Error::Import(format!("cannot read `{}`: {e}", path.display())))
    }
}

/// Parsed fragments by reference, so each reference is fetched once.
pub struct ImportCache<F> {
    fetch: F,
    fragments: FxHashMap<String, Vec<Expr>>,
}

impl<F: Fetch> ImportCache<F> {
    pub fn new(fetch: F) -> Self {
        ImportCache {
            fetch,
            fragments: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.fragments.contains_key(reference)
    }

    /// Write every cached fragment to `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let bytes = bincode::serialize(&self.fragments)
            .map_err(|e| Error::Import(format!("failed to serialize import cache: {e}")))?;
        fs::write(path, bytes)
            .map_err(|e| Error::Import(format!("cannot write `{}`: {e}", path.display())))
    }

    /// Merge fragments previously written by [`ImportCache::save`].
    pub fn load(&mut self, path: &Path) -> Result<(), Error> {
        let bytes = fs::read(path)
            .map_err(|e| Error::Import(format!("cannot read `{}`: {e}", path.display())))?;
        let fragments: FxHashMap<String, Vec<Expr>> = bincode::deserialize(&bytes)
            .map_err(|e| Error::Import(format!("failed to deserialize import cache: {e}")))?;
        tracing::debug!(fragments = fragments.len(), path = %path.display(), "loaded import cache");
        self.fragments.extend(fragments);
        Ok(())
    }
}

impl<F: Fetch> ImportResolver for ImportCache<F> {
    fn resolve(&mut self, reference: &str) -> Result<Vec<Expr>, Error> {
        if let Some(fragment) = self.fragments.get(reference) {
            tracing::debug!(reference, "import cache hit");
            return Ok(fragment.clone());
        }
        tracing::debug!(reference, "import cache miss");
        let source = self.fetch.fetch(reference)?;
        let fragment = parse(&source)
            .map_err(|e| Error::Import(format!("`{reference}`: {e}")))?;
        self.fragments.insert(reference.to_string(), fragment.clone());
        Ok(fragment)
    }
}

/// The reference of a top-level import node.
fn import_reference(expr: &Expr) -> Option<Result<&str, Error>> {
    match expr {
        Expr::Special(Keyword::Import, ops) => Some(match ops.as_slice() {
            [Expr::Str(reference)] => Ok(reference),
            _ => Err(Error::Import(format!(
                "expected `(import \"reference\")`, got `{expr}`"
            ))),
        }),
        _ => None,
    }
}

pub fn has_imports(program: &[Expr]) -> bool {
    program.iter().any(|expr| import_reference(expr).is_some())
}

/// Replace top-level imports with their fragments. A fragment may import in
/// turn; scanning resumes at the first spliced form.
pub fn splice_imports<R>(mut program: Vec<Expr>, resolver: &mut R) -> Result<Vec<Expr>, Error>
where
    R: ImportResolver + ?Sized,
{
    let mut splices = 0;
    let mut i = 0;
    while i < program.len() {
        let reference = match import_reference(&program[i]) {
            Some(reference) => reference?.to_string(),
            None => {
                i += 1;
                continue;
            }
        };
        splices += 1;
        if splices > MAX_IMPORTS {
            return Err(Error::Import(format!(
                "more than {MAX_IMPORTS} imports, `{reference}` may import itself"
            )));
        }
        let fragment = resolver.resolve(&reference)?;
        tracing::debug!(reference = %reference, forms = fragment.len(), "splicing import");
        program.splice(i..=i, fragment);
    }
    Ok(program)
}
