//! `SourceAnalyzer` backed by the pest scanner.
use tracing::debug;

use flix_core::{FlixError, ImportRef, SourceAnalyzer, SourceMetadata};

use crate::parser::{parse_imports, parse_source};

#[derive(Debug, Clone, Copy, Default)]
pub struct CadenceAnalyzer;

impl CadenceAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SourceAnalyzer for CadenceAnalyzer {
    fn analyze(&self, code: &str) -> Result<SourceMetadata, FlixError> {
        let parsed = parse_source(code)?;
        let imports: Vec<ImportRef> = parsed.imports.into_iter().flat_map(|decl| decl.imports).collect();
        debug!(imports = imports.len(), params = parsed.parameters.len(), "source analyzed");

        Ok(SourceMetadata {
            imports,
            parameters: parsed.parameters,
            kind: parsed.kind,
            return_type: parsed.return_type,
            pragma: parsed.pragma,
            comment_block: parsed.comment_block,
        })
    }

    fn imports(&self, code: &str) -> Result<Vec<ImportRef>, FlixError> {
        Ok(parse_imports(code)?.into_iter().flat_map(|decl| decl.imports).collect())
    }

    fn rewrite_imports(
        &self,
        code: &str,
        rewrite: &dyn Fn(&ImportRef) -> Option<String>,
    ) -> Result<String, FlixError> {
        let imports = parse_imports(code)?;
        let mut out = String::with_capacity(code.len());
        let mut cursor = 0;

        for decl in &imports {
            let replacements: Vec<Option<String>> = decl.imports.iter().map(rewrite).collect();
            if replacements.iter().all(Option::is_none) {
                continue;
            }
            let text: Vec<String> = decl
                .imports
                .iter()
                .zip(replacements)
                .map(|(import, replacement)| replacement.unwrap_or_else(|| import.to_string()))
                .collect();

            out.push_str(&code[cursor..decl.span.start]);
            out.push_str(&text.join("\n"));
            cursor = decl.span.end;
        }
        out.push_str(&code[cursor..]);
        Ok(out)
    }
}
