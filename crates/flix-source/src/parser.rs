//! Parser: gramática pest -> declarações estruturadas
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::ops::Range;
use thiserror::Error;

use flix_core::{FlixError, ImportRef, OperationKind, ParameterDecl, Pragma, PragmaParameter};

#[derive(Parser)]
#[grammar = "source.pest"]
pub struct CadenceParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },
}

impl From<ParseError> for FlixError {
    fn from(err: ParseError) -> Self {
        FlixError::MalformedSource(err.to_string())
    }
}

/// One `import` statement and where it sits in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub span: Range<usize>,
    pub imports: Vec<ImportRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    pub imports: Vec<ImportDecl>,
    pub kind: Option<OperationKind>,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: Option<String>,
    pub pragma: Option<Pragma>,
    pub comment_block: Option<Pragma>,
}

pub fn parse_source(code: &str) -> Result<ParsedSource, ParseError> {
    let source = CadenceParser::parse(Rule::source, code)
        .map_err(Box::new)?
        .next()
        .ok_or_else(|| invalid(0, "empty parse"))?;

    let mut parsed = ParsedSource::default();
    for pair in source.into_inner() {
        let line = pair.as_span().start_pos().line_col().0;
        match pair.as_rule() {
            Rule::import_decl => parsed.imports.push(import_decl(pair)),
            Rule::transaction_decl | Rule::main_decl => {
                if parsed.kind.is_some() {
                    return Err(invalid(line, "more than one transaction or main declaration"));
                }
                let kind = if pair.as_rule() == Rule::main_decl {
                    OperationKind::Script
                } else {
                    OperationKind::Transaction
                };
                let (parameters, return_type) = entry_point(pair);
                parsed.kind = Some(kind);
                parsed.parameters = parameters;
                parsed.return_type = return_type;
            }
            Rule::pragma => {
                if parsed.pragma.is_some() {
                    return Err(invalid(line, "duplicate #interaction pragma"));
                }
                parsed.pragma = Some(pragma(pair)?);
            }
            Rule::pragma_start => return Err(invalid(line, "malformed #interaction pragma")),
            // first block wins
            Rule::doc_block if parsed.comment_block.is_none() => parsed.comment_block = Some(comment_block(pair)?),
            _ => {}
        }
    }
    Ok(parsed)
}

/// Import declarations only; entry points and metadata are not checked.
pub fn parse_imports(code: &str) -> Result<Vec<ImportDecl>, ParseError> {
    let source = CadenceParser::parse(Rule::source, code)
        .map_err(Box::new)?
        .next()
        .ok_or_else(|| invalid(0, "empty parse"))?;
    Ok(source
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::import_decl)
        .map(import_decl)
        .collect())
}

fn invalid(line: usize, message: &str) -> ParseError {
    ParseError::Invalid {
        line,
        message: message.to_string(),
    }
}

fn import_decl(pair: Pair<Rule>) -> ImportDecl {
    let span = pair.as_span();
    let mut names = Vec::new();
    let mut address = None;
    let mut location = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::import_names => names = inner.into_inner().map(|p| p.as_str().to_string()).collect(),
            Rule::address_lit => address = Some(inner.as_str().to_string()),
            Rule::string_lit => location = Some(string_value(inner)),
            _ => {}
        }
    }

    let imports = match (names.is_empty(), address) {
        (true, _) => location.into_iter().map(ImportRef::bare).collect(),
        (false, Some(address)) => names
            .into_iter()
            .map(|name| ImportRef::explicit(name, address.clone()))
            .collect(),
        // `import A from "./A.cdc"`: resolved by name
        (false, None) => names.into_iter().map(ImportRef::bare).collect(),
    };

    ImportDecl {
        span: span.start()..span.end(),
        imports,
    }
}

fn entry_point(pair: Pair<Rule>) -> (Vec<ParameterDecl>, Option<String>) {
    let mut parameters = Vec::new();
    let mut return_type = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::param => parameters.push(param(inner)),
            Rule::type_expr => return_type = Some(inner.as_str().to_string()),
            _ => {}
        }
    }
    (parameters, return_type)
}

fn param(pair: Pair<Rule>) -> ParameterDecl {
    let mut label = String::new();
    let mut type_name = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            // argument label first when present, the parameter name last
            Rule::ident => label = inner.as_str().to_string(),
            Rule::type_expr => type_name = inner.as_str().to_string(),
            _ => {}
        }
    }
    ParameterDecl {
        label,
        type_name,
        title: None,
        description: None,
    }
}

fn pragma(pair: Pair<Rule>) -> Result<Pragma, ParseError> {
    let mut pragma = Pragma::default();
    for field in pair.into_inner().filter(|p| p.as_rule() == Rule::pragma_field) {
        let line = field.as_span().start_pos().line_col().0;
        let (name, value) = field_parts(field);
        match (name.as_str(), value) {
            ("version", Some(FieldValue::Text(v))) => pragma.version = Some(v),
            ("title", Some(FieldValue::Text(v))) => pragma.title = Some(v),
            ("description", Some(FieldValue::Text(v))) => pragma.description = Some(v),
            ("language", Some(FieldValue::Text(v))) => pragma.language = Some(v),
            ("parameters", Some(FieldValue::Params(params))) => {
                pragma.parameters = params
                    .into_iter()
                    .map(|p| pragma_parameter(p, line))
                    .collect::<Result<_, _>>()?
            }
            (other, _) => return Err(invalid(line, &format!("unexpected pragma field `{}`", other))),
        }
    }
    Ok(pragma)
}

enum FieldValue<'i> {
    Text(String),
    Params(Vec<Pair<'i, Rule>>),
}

fn field_parts(field: Pair<Rule>) -> (String, Option<FieldValue>) {
    let mut name = String::new();
    let mut value = None;
    for inner in field.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::string_lit => value = Some(FieldValue::Text(string_value(inner))),
            Rule::pragma_params => value = Some(FieldValue::Params(inner.into_inner().collect())),
            _ => {}
        }
    }
    (name, value)
}

fn pragma_parameter(pair: Pair<Rule>, line: usize) -> Result<PragmaParameter, ParseError> {
    let mut parameter = PragmaParameter::default();
    for field in pair.into_inner().filter(|p| p.as_rule() == Rule::pragma_field) {
        match field_parts(field) {
            (name, Some(FieldValue::Text(v))) if name == "name" => parameter.name = v,
            (name, Some(FieldValue::Text(v))) if name == "title" => parameter.title = Some(v),
            (name, Some(FieldValue::Text(v))) if name == "description" => parameter.description = Some(v),
            (name, _) => return Err(invalid(line, &format!("unexpected parameter field `{}`", name))),
        }
    }
    if parameter.name.is_empty() {
        return Err(invalid(line, "pragma parameter without a name"));
    }
    Ok(parameter)
}

/// `@f_version`, `@lang`, `@message <title|description>: text`,
/// `@parameter <title|description> <name>: text` and `@balance <name>: contract`.
/// Other tags are skipped.
fn comment_block(pair: Pair<Rule>) -> Result<Pragma, ParseError> {
    let mut block = Pragma::default();
    for tag in pair.into_inner().filter(|p| p.as_rule() == Rule::doc_tag) {
        let line = tag.as_span().start_pos().line_col().0;
        let mut inner = tag.into_inner();
        let key = inner.next().map(|p| p.as_str()).unwrap_or("");
        let value = inner.next().map(|p| p.as_str().trim()).unwrap_or("");
        let malformed = || invalid(line, &format!("malformed @{} `{}`", key, value));

        match key {
            "f_version" => block.version = Some(value.to_string()),
            "lang" => block.language = Some(value.to_string()),
            "message" => match labelled(value) {
                Some(("title", text)) => block.title = Some(text),
                Some(("description", text)) => block.description = Some(text),
                _ => return Err(malformed()),
            },
            "parameter" => {
                let (field, rest) = value.split_once(char::is_whitespace).ok_or_else(malformed)?;
                let (name, text) = labelled(rest.trim()).ok_or_else(malformed)?;
                let parameter = block_parameter(&mut block.parameters, name);
                match field {
                    "title" => parameter.title = Some(text),
                    "description" => parameter.description = Some(text),
                    _ => return Err(malformed()),
                }
            }
            "balance" => {
                let (name, contract) = labelled(value).ok_or_else(malformed)?;
                block_parameter(&mut block.parameters, name).balance = Some(contract);
            }
            _ => {}
        }
    }
    Ok(block)
}

/// `label: text`, the label a single identifier.
fn labelled(value: &str) -> Option<(&str, String)> {
    let (label, text) = value.split_once(':')?;
    let (label, text) = (label.trim(), text.trim());
    let is_ident = !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    (is_ident && !text.is_empty()).then(|| (label, text.to_string()))
}

fn block_parameter<'a>(parameters: &'a mut Vec<PragmaParameter>, name: &str) -> &'a mut PragmaParameter {
    let index = match parameters.iter().position(|p| p.name == name) {
        Some(index) => index,
        None => {
            parameters.push(PragmaParameter {
                name: name.to_string(),
                ..Default::default()
            });
            parameters.len() - 1
        }
    };
    &mut parameters[index]
}

fn string_value(pair: Pair<Rule>) -> String {
    let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
