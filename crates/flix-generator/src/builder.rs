//! Template Builder: orquestra um build do código-fonte ao template selado
//!
//! ```text
//! Empty → MetadataFilled → DependenciesResolved → NetworkPinsComputed → Identified
//! ```
//! A build either reaches `Identified` or returns an error and no template.
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use flix_core::{
    BuildContext, BuildState, ChainReader, FlixError, ImportRef, OperationKind, ParameterDecl, Pragma,
    SourceAnalyzer, SourceMetadata,
};
use flix_pin::{NetworkPinCalculator, PinCache, PinEngine};
use flix_registry::{ContractRegistry, ImportResolver};
use flix_schema::messages::DEFAULT_LANGUAGE;
use flix_schema::{
    seal, v1, DependencyInfo, FormatVersion, InteractionTemplate, Message, NetworkEntry, ParameterInfo, PinRecord,
    TemplateDraft, TemplateView,
};
use flix_source::CadenceAnalyzer;

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;

pub struct TemplateBuilder {
    config: GeneratorConfig,
    resolver: ImportResolver,
    analyzer: Arc<dyn SourceAnalyzer>,
    readers: BTreeMap<String, Arc<dyn ChainReader>>,
}

impl TemplateBuilder {
    pub fn new(config: GeneratorConfig, registry: Arc<ContractRegistry>, analyzer: Arc<dyn SourceAnalyzer>) -> Self {
        Self {
            config,
            resolver: ImportResolver::new(registry),
            analyzer,
            readers: BTreeMap::new(),
        }
    }

    /// Builder over the config's registry and the Cadence scanner.
    pub fn from_config(config: GeneratorConfig) -> Self {
        let registry = Arc::new(config.registry());
        Self::new(config, registry, Arc::new(CadenceAnalyzer))
    }

    /// Dependencies on `network` get pinned through `reader`.
    pub fn with_reader(mut self, network: impl Into<String>, reader: Arc<dyn ChainReader>) -> Self {
        self.readers.insert(network.into(), reader);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ContractRegistry {
        self.resolver.registry()
    }

    pub fn network_pins(&self) -> NetworkPinCalculator {
        NetworkPinCalculator::new(self.analyzer.clone())
    }

    /// Builds and seals a template from `code`. Messages found in `prefill`
    /// seed the new template where the source declares none.
    pub async fn build(
        &self,
        ctx: &BuildContext,
        code: &str,
        prefill: Option<&InteractionTemplate>,
    ) -> Result<InteractionTemplate, GeneratorError> {
        match self.run(ctx, code, prefill).await {
            Ok(template) => {
                info!(trace_id = %ctx.trace_id, id = %template.id(), format = %self.config.format, "template built");
                Ok(template)
            }
            Err(e) => {
                warn!(trace_id = %ctx.trace_id, error = %e, "template build aborted");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        ctx: &BuildContext,
        code: &str,
        prefill: Option<&InteractionTemplate>,
    ) -> Result<InteractionTemplate, GeneratorError> {
        let mut state = BuildState::Empty;
        ctx.check()?;

        let meta = self.analyzer.analyze(code)?;
        let kind = meta
            .kind
            .ok_or_else(|| FlixError::MalformedSource("no transaction or main declaration".to_string()))?;
        let mut draft = self.fill_metadata(code, kind, &meta, prefill)?;
        state = advance(ctx, state);

        draft.dependencies = self.resolve_dependencies(ctx, &meta).await?;
        state = advance(ctx, state);

        let mut template = draft.into_template();
        let pins = self.network_pins().compute_all(&template, &self.config.networks)?;
        // v1 documents have no slot for network pins; computing them still
        // proves every dependency is placed on every target network
        template.set_network_pins(pins);
        state = advance(ctx, state);

        ctx.check()?;
        let template = seal(template)?;
        advance(ctx, state);
        Ok(template)
    }

    fn fill_metadata(
        &self,
        code: &str,
        kind: OperationKind,
        meta: &SourceMetadata,
        prefill: Option<&InteractionTemplate>,
    ) -> Result<TemplateDraft, FlixError> {
        let format = self.config.format;
        // v2 reads the #interaction pragma, v1 the /** @f_version */ block
        let declared = match format {
            FormatVersion::V2 => meta.pragma.as_ref(),
            FormatVersion::V1 => meta.comment_block.as_ref(),
        };
        let language = declared
            .and_then(|p| p.language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let mut messages = declared
            .map(|p| localized(&language, p.title.as_deref(), p.description.as_deref()))
            .unwrap_or_default();
        if messages.is_empty() {
            messages = prefill.map(|t| t.messages()).unwrap_or_default();
        }

        let prefill_params = prefill.map(|t| t.parameters()).unwrap_or_default();
        let parameters = parameters(format, &meta.parameters, declared, &language, &prefill_params)?;

        let output = match (format, kind, &meta.return_type) {
            (FormatVersion::V2, OperationKind::Script, Some(return_type)) => Some(ParameterInfo {
                label: "result".to_string(),
                index: 0,
                type_name: return_type.clone(),
                messages: Vec::new(),
                is_output: true,
                balance: None,
            }),
            _ => None,
        };

        Ok(TemplateDraft {
            format,
            kind: Some(kind),
            interface: String::new(),
            messages,
            body: self.normalize_imports(code, format)?,
            dependencies: Vec::new(),
            parameters,
            output,
        })
    }

    /// v2 stores `import "Name"`, v1 stores `import Name from 0xNAMEADDRESS`.
    fn normalize_imports(&self, code: &str, format: FormatVersion) -> Result<String, FlixError> {
        match format {
            FormatVersion::V2 => self.analyzer.rewrite_imports(code, &|import: &ImportRef| {
                import
                    .is_explicit_address()
                    .then(|| ImportRef::bare(import.name.clone()).to_string())
            }),
            FormatVersion::V1 => self.analyzer.rewrite_imports(code, &|import: &ImportRef| {
                Some(ImportRef::explicit(import.name.clone(), v1::placeholder(&import.name)).to_string())
            }),
        }
    }

    async fn resolve_dependencies(
        &self,
        ctx: &BuildContext,
        meta: &SourceMetadata,
    ) -> Result<Vec<DependencyInfo>, FlixError> {
        ctx.check()?;
        let imports = meta.distinct_imports();
        let resolved = imports
            .iter()
            .map(|import| self.resolver.resolve_all(import, &self.config.networks))
            .collect::<Result<Vec<_>, _>>()?;

        let mut roots: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        for entry in resolved.iter().flatten() {
            if entry.pin.is_some() {
                debug!(contract = %entry.contract, network = %entry.network, "using registry pin");
            } else if self.readers.contains_key(&entry.network) {
                roots
                    .entry(entry.network.clone())
                    .or_default()
                    .push((entry.contract.clone(), entry.address.clone()));
            }
        }

        let pinned: BTreeMap<String, BTreeMap<String, PinRecord>> =
            try_join_all(roots.into_iter().map(|(network, roots)| self.pin_network(ctx, network, roots)))
                .await?
                .into_iter()
                .collect();

        let dependencies = imports
            .into_iter()
            .zip(resolved)
            .map(|(import, entries)| {
                let networks: Vec<NetworkEntry> = entries
                    .into_iter()
                    .map(|entry| {
                        let pin = entry.pin.or_else(|| {
                            pinned
                                .get(entry.network.as_str())
                                .and_then(|records| records.get(&entry.contract))
                                .cloned()
                        });
                        NetworkEntry {
                            network: entry.network,
                            address: entry.address,
                            pin,
                        }
                    })
                    .collect();
                debug!(trace_id = %ctx.trace_id, contract = %import.name, networks = networks.len(), "dependency resolved");
                DependencyInfo {
                    contract: import.name,
                    networks,
                }
            })
            .collect();
        Ok(dependencies)
    }

    /// Pins every top-level dependency placed on `network` in one engine run.
    /// Networks without a reader get no pins.
    async fn pin_network(
        &self,
        ctx: &BuildContext,
        network: String,
        roots: Vec<(String, String)>,
    ) -> Result<(String, BTreeMap<String, PinRecord>), FlixError> {
        let Some(reader) = self.readers.get(&network) else {
            return Ok((network, BTreeMap::new()));
        };
        let engine = PinEngine::new(network.clone(), reader.clone(), self.analyzer.clone(), self.resolver.clone())
            .with_max_concurrent_fetches(self.config.max_concurrent_fetches);
        let cache = PinCache::new();
        // height is read once per network per build
        let height = engine.latest_height(ctx).await?;
        let records = engine.compute_pins(ctx, &cache, &roots, height).await?;

        Ok((network, roots.into_iter().map(|(name, _)| name).zip(records).collect()))
    }
}

fn advance(ctx: &BuildContext, state: BuildState) -> BuildState {
    let next = state.next().unwrap_or(state);
    info!(trace_id = %ctx.trace_id, from = %state, to = %next, "build state");
    next
}

fn localized(language: &str, title: Option<&str>, description: Option<&str>) -> Vec<Message> {
    [("title", title), ("description", description)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| Message::new(key, language, v)))
        .collect()
}

/// Source parameters in declaration order with declared metadata applied.
///
/// Pragma parameters (v2) line up with the source by index and must carry the
/// same name. Comment block parameters (v1) are looked up by name; names the
/// source does not declare are ignored. Prefill messages fill in by label.
fn parameters(
    format: FormatVersion,
    declared: &[ParameterDecl],
    metadata: Option<&Pragma>,
    language: &str,
    prefill: &[ParameterInfo],
) -> Result<Vec<ParameterInfo>, FlixError> {
    let overrides = metadata.map(|p| p.parameters.as_slice()).unwrap_or_default();
    if format == FormatVersion::V2 && overrides.len() > declared.len() {
        return Err(FlixError::MalformedSource(format!(
            "pragma describes {} parameters, source declares {}",
            overrides.len(),
            declared.len()
        )));
    }

    declared
        .iter()
        .enumerate()
        .map(|(index, decl)| {
            let over = match format {
                FormatVersion::V2 => overrides.get(index),
                FormatVersion::V1 => overrides.iter().find(|o| o.name == decl.label),
            };
            if let Some(over) = over.filter(|o| o.name != decl.label) {
                return Err(FlixError::MalformedSource(format!(
                    "pragma parameter {} is `{}`, source parameter is `{}`",
                    index, over.name, decl.label
                )));
            }

            let seed = prefill.iter().find(|p| p.label == decl.label);
            let mut messages = localized(language, decl.title.as_deref(), decl.description.as_deref());
            if let Some(over) = over {
                messages = messages_or(
                    localized(language, over.title.as_deref(), over.description.as_deref()),
                    messages,
                );
            }
            if messages.is_empty() {
                if let Some(seed) = seed {
                    messages = seed.messages.clone();
                }
            }
            // only the 1.0.0 layout stores a balance
            let balance = match format {
                FormatVersion::V1 => over
                    .and_then(|o| o.balance.clone())
                    .or_else(|| seed.and_then(|s| s.balance.clone())),
                FormatVersion::V2 => None,
            };

            Ok(ParameterInfo {
                label: decl.label.clone(),
                index,
                type_name: decl.type_name.clone(),
                messages,
                is_output: false,
                balance,
            })
        })
        .collect()
}

fn messages_or(preferred: Vec<Message>, fallback: Vec<Message>) -> Vec<Message> {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}
