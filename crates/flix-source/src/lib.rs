//! FLIX Source: scanner de Cadence
//!
//! Extrai imports, ponto de entrada (`transaction` / `fun main`), parâmetros,
//! tipo de retorno, o pragma `#interaction(...)` e o bloco `/** @f_version */`.

pub mod analyzer;
pub mod parser;

pub use analyzer::CadenceAnalyzer;
pub use parser::{parse_imports, parse_source, CadenceParser, ImportDecl, ParseError, ParsedSource, Rule};
