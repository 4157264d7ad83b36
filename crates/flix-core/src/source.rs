//! Source Analyzer: contrato do parser externo
//!
//! O motor de pinagem depende apenas da saída estruturada do parser
//! (imports, parâmetros, tipo da operação), nunca do texto bruto.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FlixError;

/// One import declaration, either `import "Name"` or `import Name from 0xADDR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ImportRef {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }

    pub fn explicit(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Some(address.into()),
        }
    }

    pub fn is_explicit_address(&self) -> bool {
        self.address.is_some()
    }
}

impl fmt::Display for ImportRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "import {} from {}", self.name, address),
            None => write!(f, "import \"{}\"", self.name),
        }
    }
}

/// Read-only scripts versus state-mutating transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Script,
    Transaction,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Transaction => "transaction",
        }
    }

    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "script" => Some(Self::Script),
            "transaction" => Some(Self::Transaction),
            _ => None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Script)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub label: String,
    pub type_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PragmaParameter {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Contract whose balance the argument spends, `@balance` in comment blocks
    #[serde(default)]
    pub balance: Option<String>,
}

/// Metadata declared in an `#interaction(...)` pragma, or in a
/// `/** @f_version ... */` comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pragma {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub parameters: Vec<PragmaParameter>,
}

/// Everything the builder needs to know about a piece of source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub imports: Vec<ImportRef>,
    pub parameters: Vec<ParameterDecl>,
    pub kind: Option<OperationKind>,
    /// Declared return type of a script's `main`
    pub return_type: Option<String>,
    pub pragma: Option<Pragma>,
    /// First `/** @f_version ... */` block, the 1.0.0 metadata source
    #[serde(default)]
    pub comment_block: Option<Pragma>,
}

impl SourceMetadata {
    /// Imports with duplicate names removed, first occurrence wins.
    pub fn distinct_imports(&self) -> Vec<ImportRef> {
        let mut seen = std::collections::HashSet::new();
        self.imports
            .iter()
            .filter(|imp| seen.insert(imp.name.clone()))
            .cloned()
            .collect()
    }
}

/// The parser collaborator.
pub trait SourceAnalyzer: Send + Sync {
    fn analyze(&self, code: &str) -> Result<SourceMetadata, FlixError>;

    /// Import references only. Deployed contracts are scanned this way, so
    /// nothing but their imports can make the scan fail.
    fn imports(&self, code: &str) -> Result<Vec<ImportRef>, FlixError> {
        self.analyze(code).map(|meta| meta.imports)
    }

    /// Rewrites import declarations in place. `rewrite` returns the replacement
    /// text for one import, or `None` to leave that import untouched.
    fn rewrite_imports(
        &self,
        code: &str,
        rewrite: &dyn Fn(&ImportRef) -> Option<String>,
    ) -> Result<String, FlixError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_display() {
        assert_eq!(ImportRef::bare("FlowToken").to_string(), "import \"FlowToken\"");
        assert_eq!(
            ImportRef::explicit("FlowToken", "0x7e60df042a9c0868").to_string(),
            "import FlowToken from 0x7e60df042a9c0868"
        );
    }

    #[test]
    fn test_distinct_imports_keep_first() {
        let meta = SourceMetadata {
            imports: vec![
                ImportRef::bare("A"),
                ImportRef::explicit("B", "0x01"),
                ImportRef::explicit("A", "0x02"),
            ],
            ..Default::default()
        };
        let names: Vec<_> = meta.distinct_imports().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(OperationKind::from_type_tag("script"), Some(OperationKind::Script));
        assert!(OperationKind::Script.is_read_only());
        assert!(!OperationKind::Transaction.is_read_only());
        assert_eq!(OperationKind::from_type_tag("contract"), None);
    }
}
