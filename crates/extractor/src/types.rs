use crate::error::{ExtractError, Result};
use crate::language::last_segment;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Where the text of a source unit comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSource {
    /// Text already held in memory
    Text(String),

    /// File read by the extraction worker
    File(PathBuf),
}

/// One discrete piece of source text analysed for references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Unit name, unique within a run (e.g. "PlayerController")
    pub id: String,

    pub source: UnitSource,
}

impl SourceUnit {
    pub fn from_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: UnitSource::Text(text.into()),
        }
    }

    pub fn from_file(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source: UnitSource::File(path.into()),
        }
    }

    /// Unit id derived from a file path (file name without extension)
    pub fn id_for_path(path: &Path) -> Option<String> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
    }

    /// Read the unit's text. In-memory units never fail.
    pub fn read_text(&self) -> Result<Cow<'_, str>> {
        match &self.source {
            UnitSource::Text(text) => Ok(Cow::Borrowed(text)),
            UnitSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|err| ExtractError::read(path, err)),
        }
    }
}

/// Deduplicated set of type names referenced by one unit
///
/// Ordered so that serialized output and iteration are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSet {
    names: BTreeSet<String>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the name was already present
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn extend(&mut self, other: ReferenceSet) {
        self.names.extend(other.names);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ReferenceSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Per-unit table built from using directives
///
/// `using Vec = Game.Math.Vector3;` registers an alias, `using Game.Math;` or
/// `using static Game.Math.Vector3;` registers an import path. Created fresh for every
/// extraction and never shared between units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
    imports: Vec<String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    pub fn add_import(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.imports.contains(&path) {
            self.imports.push(path);
        }
    }

    /// Fully qualified name for a short type name, if the table knows one.
    ///
    /// Aliases win over imports; among imports the first one whose last segment equals
    /// `short` is used.
    pub fn expand(&self, short: &str) -> Option<&str> {
        if let Some(target) = self.aliases.get(short) {
            return Some(target.as_str());
        }

        self.imports
            .iter()
            .find(|path| path.len() > short.len() && last_segment(path) == short)
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.imports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_set_deduplicates_and_orders() {
        let mut set = ReferenceSet::new();
        assert!(set.insert("Weapon"));
        assert!(set.insert("Armor"));
        assert!(!set.insert("Weapon"));

        let names: Vec<&str> = set.iter().collect();
        assert_eq!(names, vec!["Armor", "Weapon"]);
    }

    #[test]
    fn alias_table_prefers_aliases_then_import_suffix() {
        let mut table = AliasTable::new();
        table.add_import("Game.Core");
        table.add_import("Game.Math.Vector3");
        table.add_alias("Vec", "Game.Math.Vector3");

        assert_eq!(table.expand("Vec"), Some("Game.Math.Vector3"));
        assert_eq!(table.expand("Vector3"), Some("Game.Math.Vector3"));
        assert_eq!(table.expand("Core"), Some("Game.Core"));
        assert_eq!(table.expand("Player"), None);
    }

    #[test]
    fn unreadable_file_reports_path() {
        let unit = SourceUnit::from_file("Missing", "/definitely/not/here/Missing.cs");
        let err = unit.read_text().unwrap_err();
        assert!(err.to_string().contains("Missing.cs"));
    }

    #[test]
    fn id_for_path_uses_file_stem() {
        assert_eq!(
            SourceUnit::id_for_path(Path::new("Assets/Scripts/Player.cs")),
            Some("Player".to_string())
        );
    }
}
