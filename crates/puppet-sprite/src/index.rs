//! Sprite index - grid key to file path
//!
//! Built once from a corpus directory, read-only afterwards. Rebuilding
//! produces a new index; it never touches a decode cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use puppet_core::{GridKey, PuppetError, PuppetResult};

use crate::grammar::parse_sprite_name;

/// Corpus directory names tried in order under the data directory
pub const DEFAULT_CORPUS_DIRS: [&str; 3] = [
    "eye_face_optimized_patches",
    "combined_parameters_optimized_patches",
    "eye_face_patches",
];

/// Sparse mapping of grid keys to sprite files
#[derive(Debug, Clone, Default)]
pub struct SpriteIndex {
    root: Option<PathBuf>,
    entries: HashMap<GridKey, PathBuf>,
    /// Keys in ascending order, the scan order of relaxed search
    sorted: Vec<GridKey>,
}

impl SpriteIndex {
    /// Index with no sprites
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from the first existing corpus directory under `data_dir`
    pub fn build<S: AsRef<str>>(data_dir: &Path, corpus_dirs: &[S]) -> PuppetResult<Self> {
        let dir = resolve_corpus_dir(data_dir, corpus_dirs)
            .ok_or_else(|| PuppetError::CorpusNotFound(data_dir.to_path_buf()))?;
        Self::build_from_dir(&dir)
    }

    /// Build from one directory, non-recursively
    ///
    /// Files whose names do not parse are skipped. Entries are visited in
    /// name order, so when two files map to the same key the later name wins
    /// on every platform.
    pub fn build_from_dir(dir: &Path) -> PuppetResult<Self> {
        let start = Instant::now();

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            files.push((name.to_string(), path));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = HashMap::with_capacity(files.len());
        let mut skipped = 0usize;
        for (name, path) in files {
            match parse_sprite_name(&name) {
                Some(key) => {
                    entries.insert(key, path);
                }
                None => {
                    tracing::trace!(file = %name, "skipping file outside sprite grammar");
                    skipped += 1;
                }
            }
        }

        let mut index = Self::from_entries(entries);
        index.root = Some(dir.to_path_buf());

        tracing::info!(
            dir = %dir.display(),
            indexed = index.len(),
            skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sprite index built"
        );
        Ok(index)
    }

    /// Build from an in-memory mapping
    pub fn from_entries(entries: HashMap<GridKey, PathBuf>) -> Self {
        let mut sorted: Vec<GridKey> = entries.keys().copied().collect();
        sorted.sort_unstable();
        SpriteIndex {
            root: None,
            entries,
            sorted,
        }
    }

    /// Path of the sprite for a key
    #[inline]
    pub fn get(&self, key: &GridKey) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    #[inline]
    pub fn contains(&self, key: &GridKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys, ascending
    pub fn sorted_keys(&self) -> &[GridKey] {
        &self.sorted
    }

    /// Smallest key, if any
    pub fn first(&self) -> Option<GridKey> {
        self.sorted.first().copied()
    }

    /// Directory the index was built from
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

/// First of `corpus_dirs` that exists as a directory under `data_dir`
pub fn resolve_corpus_dir<S: AsRef<str>>(data_dir: &Path, corpus_dirs: &[S]) -> Option<PathBuf> {
    corpus_dirs
        .iter()
        .map(|name| data_dir.join(name.as_ref()))
        .find(|dir| dir.is_dir())
}
