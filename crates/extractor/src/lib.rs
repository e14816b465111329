//! # Refscope Extractor
//!
//! Lightweight static analysis that turns the text of a source unit into the set of
//! type names it refers to.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> Source Scanner (.gitignore aware)
//!     │      └─> SourceUnit[] (id = file stem)
//!     │
//!     └──> Reference Extractor (pattern rules)
//!            ├─ field declarations
//!            ├─ method signatures
//!            ├─ inheritance lists
//!            ├─ `new` instantiations
//!            ├─ attribute usages
//!            ├─ using directives ──> AliasTable
//!            └─ keyword / common-type filter ──> ReferenceSet
//! ```
//!
//! The extractor does not build an AST. Its rules are approximate by nature and may
//! miss or over-report on unusual formatting; callers only depend on the
//! `text -> ReferenceSet` contract.
//!
//! ## Example
//!
//! ```rust
//! use refscope_extractor::{ExtractorConfig, ReferenceExtractor};
//!
//! let extractor = ReferenceExtractor::new(ExtractorConfig::default());
//! let refs = extractor.extract("public class Player : Actor { private Weapon weapon; }");
//!
//! assert!(refs.contains("Actor"));
//! assert!(refs.contains("Weapon"));
//! ```

mod config;
mod error;
mod extractor;
mod language;
mod normalize;
mod scanner;
mod types;

pub use config::{ExtractorConfig, PatternRule};
pub use error::{ExtractError, Result};
pub use extractor::{ClassReferences, ReferenceExtractor};
pub use language::{is_common_type, is_keyword, is_filtered, COMMON_TYPES, KEYWORDS};
pub use scanner::SourceScanner;
pub use types::{AliasTable, ReferenceSet, SourceUnit, UnitSource};
