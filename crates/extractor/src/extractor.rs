use crate::config::{ExtractorConfig, PatternRule};
use crate::language::is_filtered;
use crate::normalize::{leading_type_token, normalize_into, split_top_level};
use crate::types::{AliasTable, ReferenceSet, SourceUnit};
use once_cell::sync::Lazy;
use regex::Regex;

// Type token: qualified name, optional generic list, optional array ranks, optional `?`.
const TYPE: &str = r"[A-Za-z_][\w.]*(?:\s*<[^;=(){}]*?>)?(?:\s*\[[\s,]*\])*\??";

static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:public|private|protected|internal)\s+(?:(?:static|readonly|const|volatile|new|override|virtual|abstract|sealed|extern|unsafe|required|event)\s+)*({TYPE})\s+[A-Za-z_]\w*\s*(?:;|=|,|\{{)"
    ))
    .unwrap()
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:public|private|protected|internal|static|virtual|override|abstract|async)\s+(?:(?:public|private|protected|internal|static|virtual|override|abstract|async|sealed|new|extern|unsafe)\s+)*(?:({TYPE})\s+)?[A-Za-z_]\w*\s*(?:<[^>(]*>)?\s*\(([^)]*)\)"
    ))
    .unwrap()
});

static INHERITANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|struct|interface|record)\s+[A-Za-z_]\w*(?:\s*<[^>{]*>)?\s*:\s*([^{;]+?)\s*(?:\bwhere\b|\{|;)")
        .unwrap()
});

static INSTANTIATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z_]\w*\s*=\s*new\s+([A-Za-z_][\w.]*(?:\s*<[^;(){}]*?>)?)\s*[(\[{]")
        .unwrap()
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\[([^\[\]\n]+)\]").unwrap());

static USING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:global\s+)?using\s+(?:static\s+)?(?:([A-Za-z_]\w*)\s*=\s*)?([A-Za-z_][\w.]*)\s*;")
        .unwrap()
});

/// References of one unit grouped by the rule that found them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassReferences {
    pub fields: ReferenceSet,
    pub methods: ReferenceSet,
    pub inheritance: ReferenceSet,
    pub instantiations: ReferenceSet,
    pub attributes: ReferenceSet,
}

impl ClassReferences {
    /// Union of every rule's references
    pub fn references(&self) -> ReferenceSet {
        let mut all = ReferenceSet::new();
        for set in [
            &self.fields,
            &self.methods,
            &self.inheritance,
            &self.instantiations,
            &self.attributes,
        ] {
            all.extend(set.clone());
        }
        all
    }

    fn slot(&mut self, rule: PatternRule) -> &mut ReferenceSet {
        match rule {
            PatternRule::Fields => &mut self.fields,
            PatternRule::Methods => &mut self.methods,
            PatternRule::Inheritance => &mut self.inheritance,
            PatternRule::Instantiations => &mut self.instantiations,
            PatternRule::Attributes => &mut self.attributes,
        }
    }
}

/// Pattern-based reference extractor
///
/// Stateless apart from its configuration; safe to share across worker threads.
#[derive(Debug, Clone, Default)]
pub struct ReferenceExtractor {
    config: ExtractorConfig,
}

impl ReferenceExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the ReferenceSet of a unit's text
    pub fn extract(&self, text: &str) -> ReferenceSet {
        self.extract_classified(text).references()
    }

    /// Extract a unit, reading its text first.
    ///
    /// A read failure is logged and yields an empty set so that one bad unit never
    /// aborts a batch.
    pub fn extract_unit(&self, unit: &SourceUnit) -> ReferenceSet {
        match unit.read_text() {
            Ok(text) => {
                let refs = self.extract(&text);
                log::debug!("{}: {} references", unit.id, refs.len());
                refs
            }
            Err(err) => {
                log::warn!("Skipping unit {}: {err}", unit.id);
                ReferenceSet::new()
            }
        }
    }

    /// Extract references keeping track of which rule produced each one
    pub fn extract_classified(&self, text: &str) -> ClassReferences {
        // Line-anchored rules would miss the first line behind a byte order mark
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

        let aliases = if self.config.expand_aliases {
            collect_aliases(text)
        } else {
            AliasTable::new()
        };

        let mut result = ClassReferences::default();
        for rule in PatternRule::ALL {
            if !self.config.is_enabled(rule) {
                continue;
            }

            let mut raw = Vec::new();
            match rule {
                PatternRule::Fields => capture_fields(text, &mut raw),
                PatternRule::Methods => capture_methods(text, &mut raw),
                PatternRule::Inheritance => capture_inheritance(text, &mut raw),
                PatternRule::Instantiations => capture_instantiations(text, &mut raw),
                PatternRule::Attributes => capture_attributes(text, &mut raw),
            }

            let slot = result.slot(rule);
            for name in raw {
                if let Some(expanded) = aliases.expand(&name) {
                    if !is_filtered(expanded) {
                        slot.insert(expanded);
                    }
                }
                slot.insert(name);
            }
        }

        result
    }
}

/// Build the unit-local alias table from using directives
pub(crate) fn collect_aliases(text: &str) -> AliasTable {
    let mut table = AliasTable::new();
    for caps in USING.captures_iter(text) {
        let Some(path) = caps.get(2) else {
            continue;
        };
        match caps.get(1) {
            Some(alias) => table.add_alias(alias.as_str(), path.as_str()),
            None => table.add_import(path.as_str()),
        }
    }
    table
}

fn capture_fields(text: &str, out: &mut Vec<String>) {
    for caps in FIELD.captures_iter(text) {
        if let Some(ty) = caps.get(1) {
            normalize_into(ty.as_str(), out);
        }
    }
}

fn capture_methods(text: &str, out: &mut Vec<String>) {
    for caps in METHOD.captures_iter(text) {
        if let Some(ret) = caps.get(1) {
            normalize_into(ret.as_str(), out);
        }
        if let Some(params) = caps.get(2) {
            for param in split_top_level(params.as_str()) {
                normalize_into(leading_type_token(param), out);
            }
        }
    }
}

fn capture_inheritance(text: &str, out: &mut Vec<String>) {
    for caps in INHERITANCE.captures_iter(text) {
        if let Some(list) = caps.get(1) {
            for base in split_top_level(list.as_str()) {
                normalize_into(base, out);
            }
        }
    }
}

fn capture_instantiations(text: &str, out: &mut Vec<String>) {
    for caps in INSTANTIATION.captures_iter(text) {
        if let Some(ty) = caps.get(1) {
            normalize_into(ty.as_str(), out);
        }
    }
}

fn capture_attributes(text: &str, out: &mut Vec<String>) {
    for caps in ATTRIBUTE.captures_iter(text) {
        let Some(body) = caps.get(1) else {
            continue;
        };
        for entry in split_top_level(body.as_str()) {
            // `[assembly: Foo]` / `[field: Foo]` target specifiers
            let entry = match entry.split_once(':') {
                Some((target, rest)) if !rest.starts_with(':') && !target.contains('(') => {
                    rest.trim()
                }
                _ => entry,
            };
            let name = entry.split('(').next().unwrap_or_default().trim();
            if name.is_empty() {
                continue;
            }
            normalize_into(&canonical_attribute_name(name), out);
        }
    }
}

/// `SerializeField` -> `SerializeFieldAttribute`
fn canonical_attribute_name(name: &str) -> String {
    if name.ends_with("Attribute") {
        name.to_string()
    } else {
        format!("{name}Attribute")
    }
}
