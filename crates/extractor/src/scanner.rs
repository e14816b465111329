use crate::config::ExtractorConfig;
use crate::types::SourceUnit;
use ignore::{DirEntry, WalkBuilder};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Scanner for finding source units in a project
pub struct SourceScanner {
    root: PathBuf,
    extensions: Vec<String>,
    max_file_size_bytes: u64,
}

impl SourceScanner {
    pub fn new(root: impl AsRef<Path>, config: &ExtractorConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            max_file_size_bytes: config.max_file_size_bytes,
        }
    }

    /// Source files under the root (.gitignore aware), sorted by path
    pub fn scan(&self) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored_scope(entry.file_name()))
            .build();

        let mut files: Vec<PathBuf> = walker
            .filter_map(|result| {
                result
                    .map_err(|e| log::warn!("Failed to read entry: {e}"))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|entry| self.is_source_file(entry.path()) && self.within_size_limit(entry))
            .map(DirEntry::into_path)
            .collect();

        files.sort();
        log::info!("Found {} source files", files.len());
        files
    }

    /// File-backed units, one per distinct file stem.
    ///
    /// Unit ids must be unique within a run; when two files share a stem the first one
    /// (in path order) wins and the other is skipped with a warning.
    pub fn units(&self) -> Vec<SourceUnit> {
        let mut seen = HashSet::new();
        let mut units = Vec::new();

        for path in self.scan() {
            let Some(id) = SourceUnit::id_for_path(&path) else {
                continue;
            };
            if !seen.insert(id.clone()) {
                log::warn!(
                    "Duplicate unit id {id} ({}); keeping the first occurrence",
                    path.display()
                );
                continue;
            }
            units.push(SourceUnit::from_file(id, path));
        }

        units
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|candidate| candidate == &ext))
    }

    fn within_size_limit(&self, entry: &DirEntry) -> bool {
        match entry.metadata() {
            Ok(meta) if meta.len() > self.max_file_size_bytes => {
                log::debug!(
                    "Skipping large file {} ({} bytes > {})",
                    entry.path().display(),
                    meta.len(),
                    self.max_file_size_bytes
                );
                false
            }
            _ => true,
        }
    }
}

/// Build output, tool state and engine caches never hold project sources
fn is_ignored_scope(name: &OsStr) -> bool {
    let lowered = name.to_string_lossy().to_lowercase();
    IGNORED_SCOPES.contains(&lowered.as_str())
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".vs",
    // build output
    "bin",
    "obj",
    "build",
    "builds",
    "target",
    // engine caches
    "library",
    "temp",
    "logs",
    "packages",
    "node_modules",
];
