//! Pin Engine: árvore de pins de um contrato e de todas as suas dependências
//!
//! Two passes over one run-local [`PinCache`]:
//! 1. discovery walks the import graph level by level, fetching every
//!    contract identity once, siblings concurrently (bounded);
//! 2. assembly hashes the tree bottom-up, post-order, failing on cycles.
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::iter;
use std::sync::Arc;
use tracing::debug;

use flix_core::hashing::sha3_hex_concat;
use flix_core::{normalize_address, sha3_hex, BuildContext, ChainReader, FlixError, SourceAnalyzer, SourceMetadata};
use flix_registry::ImportResolver;
use flix_schema::{DependencyPin, PinRecord};

use crate::cache::{identity_key, FetchedContract, PinCache};

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Pins contracts deployed on one network.
pub struct PinEngine {
    network: String,
    reader: Arc<dyn ChainReader>,
    analyzer: Arc<dyn SourceAnalyzer>,
    resolver: ImportResolver,
    max_concurrent_fetches: usize,
}

impl PinEngine {
    pub fn new(
        network: impl Into<String>,
        reader: Arc<dyn ChainReader>,
        analyzer: Arc<dyn SourceAnalyzer>,
        resolver: ImportResolver,
    ) -> Self {
        Self {
            network: network.into(),
            reader,
            analyzer,
            resolver,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub async fn latest_height(&self, ctx: &BuildContext) -> Result<u64, FlixError> {
        ctx.guard(self.reader.get_latest_height(&self.network)).await
    }

    /// Pin tree of `name` deployed at `address`, recorded at `height`.
    pub async fn compute_pin(
        &self,
        ctx: &BuildContext,
        cache: &PinCache,
        name: &str,
        address: &str,
        height: u64,
    ) -> Result<PinRecord, FlixError> {
        let mut records = self
            .compute_pins(ctx, cache, &[(name.to_string(), address.to_string())], height)
            .await?;
        records
            .pop()
            .ok_or_else(|| FlixError::fetch(name, address, &self.network, "no pin computed"))
    }

    /// Pin trees of several `(name, address)` roots, in the order given.
    ///
    /// All roots share one discovery pass, so sibling roots are fetched
    /// concurrently and a contract they have in common is fetched once.
    pub async fn compute_pins(
        &self,
        ctx: &BuildContext,
        cache: &PinCache,
        roots: &[(String, String)],
        height: u64,
    ) -> Result<Vec<PinRecord>, FlixError> {
        let roots: Vec<(String, String)> = roots
            .iter()
            .map(|(name, address)| (name.clone(), normalize_address(address)))
            .collect();
        let missing: Vec<(String, String)> = roots
            .iter()
            .filter(|(name, address)| {
                let cached = cache.pin(&identity_key(&self.network, address, name)).is_some();
                if cached {
                    debug!(trace_id = %ctx.trace_id, contract = %name, network = %self.network, "pin cache hit");
                }
                !cached
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            self.discover(ctx, cache, missing).await?;
        }

        roots
            .iter()
            .map(|(name, address)| {
                let tree = self.assemble(ctx, cache, &identity_key(&self.network, address, name), &mut Vec::new())?;
                debug!(
                    trace_id = %ctx.trace_id,
                    contract = %name,
                    network = %self.network,
                    pin = %tree.pin,
                    "pin computed"
                );
                Ok(PinRecord::from_tree(height, tree))
            })
            .collect()
    }

    async fn discover(
        &self,
        ctx: &BuildContext,
        cache: &PinCache,
        mut frontier: Vec<(String, String)>,
    ) -> Result<(), FlixError> {
        let mut seen = HashSet::new();

        while !frontier.is_empty() {
            ctx.check()?;
            let mut next = Vec::new();
            let mut to_fetch = Vec::new();
            for (name, address) in frontier.drain(..) {
                let key = identity_key(&self.network, &address, &name);
                if !seen.insert(key.clone()) {
                    continue;
                }
                match cache.contract(&key) {
                    Some(known) => next.extend(known.children.iter().cloned()),
                    None => to_fetch.push((key, name, address)),
                }
            }

            let fetched: Vec<(String, FetchedContract)> = stream::iter(to_fetch)
                .map(|(key, name, address)| async move {
                    let contract = self.fetch(ctx, &name, &address).await?;
                    Ok::<_, FlixError>((key, contract))
                })
                .buffer_unordered(self.max_concurrent_fetches)
                .try_collect()
                .await?;

            for (key, contract) in fetched {
                let stored = cache.insert_contract(key, contract);
                next.extend(stored.children.iter().cloned());
            }
            frontier = next;
        }
        Ok(())
    }

    async fn fetch(&self, ctx: &BuildContext, name: &str, address: &str) -> Result<FetchedContract, FlixError> {
        debug!(trace_id = %ctx.trace_id, contract = name, address, network = %self.network, "fetching contract");
        let code = ctx.guard(self.reader.get_deployed_source(address, name)).await?;
        let pin_self = sha3_hex(&code);

        let text = String::from_utf8(code)
            .map_err(|e| FlixError::MalformedSource(format!("{} at {} is not UTF-8: {}", name, address, e)))?;
        let meta = SourceMetadata {
            imports: self.analyzer.imports(&text)?,
            ..Default::default()
        };
        let children = meta
            .distinct_imports()
            .iter()
            .map(|import| {
                self.resolver
                    .resolve(import, &self.network)
                    .map(|resolved| (resolved.contract, resolved.address))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FetchedContract {
            name: name.to_string(),
            address: address.to_string(),
            pin_self,
            children,
        })
    }

    fn assemble(
        &self,
        ctx: &BuildContext,
        cache: &PinCache,
        key: &str,
        path: &mut Vec<String>,
    ) -> Result<DependencyPin, FlixError> {
        ctx.check()?;
        if let Some(pin) = cache.pin(key) {
            return Ok(pin);
        }
        if path.iter().any(|k| k == key) {
            path.push(key.to_string());
            return Err(FlixError::CyclicDependency(path.join(" -> ")));
        }
        let contract = cache
            .contract(key)
            .ok_or_else(|| FlixError::fetch(key, "", &self.network, "contract was never fetched"))?;

        path.push(key.to_string());
        let imports = contract
            .children
            .iter()
            .map(|(name, address)| self.assemble(ctx, cache, &identity_key(&self.network, address, name), path))
            .collect::<Result<Vec<_>, _>>()?;
        path.pop();

        let pin = sha3_hex_concat(iter::once(contract.pin_self.as_str()).chain(imports.iter().map(|p| p.pin.as_str())));
        let node = DependencyPin {
            pin,
            pin_self: contract.pin_self.clone(),
            pin_contract_name: contract.name.clone(),
            pin_contract_address: contract.address.clone(),
            imports,
        };
        cache.insert_pin(key.to_string(), node.clone());
        Ok(node)
    }
}
