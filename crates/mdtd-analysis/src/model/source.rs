//! Per-file model: the parsed `SourceUnit` and its failure counterpart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CallableUnit, TypeCategory};
use crate::scanner::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    Trait,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModel {
    pub name: String,
    pub type_category: TypeCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
}

/// A declared class, struct, interface, enum or trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeModel {
    pub name: String,
    pub kind: TypeKind,
    pub fields: Vec<FieldModel>,
    /// Member unit names in declaration order.
    pub methods: Vec<String>,
    pub bases: Vec<String>,
    pub line: u32,
}

impl TypeModel {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// Language-neutral result of parsing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub path: String,
    pub language: Language,
    /// xxh3 of the raw bytes, hex encoded.
    pub content_hash: String,
    /// Units in declaration order.
    pub units: Vec<CallableUnit>,
    pub types: BTreeMap<String, TypeModel>,
}

impl SourceUnit {
    pub fn empty(path: impl Into<String>, language: Language, content_hash: String) -> Self {
        Self {
            path: path.into(),
            language,
            content_hash,
            units: Vec::new(),
            types: BTreeMap::new(),
        }
    }

    pub fn find(&self, qualified_name: &str) -> Option<&CallableUnit> {
        self.units.iter().find(|u| u.qualified_name() == qualified_name)
    }

    /// Units owned by `type_name`, in declaration order.
    pub fn members_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = (usize, &'a CallableUnit)> + 'a {
        self.units
            .iter()
            .enumerate()
            .filter(move |(_, u)| u.owning_type.as_deref() == Some(type_name))
    }
}

/// An unrecoverable syntax region, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxRegion {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub message: String,
}

/// A file that could not be fully parsed. `partial` holds the units whose
/// own syntax was intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub path: String,
    pub language: Language,
    pub partial: SourceUnit,
    pub regions: Vec<SyntaxRegion>,
}

impl ParseFailure {
    /// Failure covering the whole file, with nothing recovered.
    pub fn whole_file(path: &str, language: Language, content_hash: String, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            language,
            partial: SourceUnit::empty(path, language, content_hash),
            regions: vec![SyntaxRegion {
                start_line: 1,
                start_column: 1,
                end_line: 1,
                end_column: 1,
                message: message.into(),
            }],
        }
    }
}
