use crate::limits::{extract_concurrency, hardware_concurrency};
use crate::types::{GraphNode, ReferenceGraph};
use refscope_extractor::{ReferenceExtractor, ReferenceSet, SourceUnit};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Strip namespace qualifiers: `Game.Units.Player` -> `Player`, `global::Foo` -> `Foo`
pub fn resolve_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '.' || c == ':')
        .find(|segment| !segment.is_empty())
        .unwrap_or(name)
}

/// Build a reference graph from source units
pub struct GraphBuilder {
    extractor: Arc<ReferenceExtractor>,
    concurrency: usize,
}

impl GraphBuilder {
    pub fn new(extractor: ReferenceExtractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
            concurrency: extract_concurrency(),
        }
    }

    /// Override the worker count (clamped to `1..=hardware_concurrency()`)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, hardware_concurrency());
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Build graph: one node per unit, one edge per resolved reference.
    ///
    /// Units with duplicate ids are skipped after the first occurrence.
    pub async fn build(&self, units: Vec<SourceUnit>) -> ReferenceGraph {
        let units = dedupe_units(units);
        let references = self.extract_all(&units).await;

        let mut graph = ReferenceGraph::new();

        // Phase 1: nodes in input order
        for unit in &units {
            if let Err(e) = graph.add_node(GraphNode::new(unit.id.clone())) {
                log::warn!("Skipping unit: {e}");
            }
        }

        // Phase 2: edges, iterating units in id order so the result never depends on
        // which worker finished first
        let mut unresolved = 0usize;
        for (unit_id, names) in &references {
            for name in names.iter() {
                let target = resolve_name(name);
                if target == unit_id {
                    continue;
                }
                if !graph.contains(target) {
                    log::warn!("Unresolved reference {name} in {unit_id}");
                    unresolved += 1;
                    continue;
                }
                if let Err(e) = graph.add_edge(unit_id, target) {
                    log::warn!("Failed to add edge {unit_id} -> {target}: {e}");
                }
            }
        }

        log::info!(
            "Built reference graph: {} nodes, {} edges ({} unresolved references)",
            graph.node_count(),
            graph.edge_count(),
            unresolved
        );

        graph
    }

    /// Run the extractor over every unit with bounded fan-out
    pub async fn extract_all(&self, units: &[SourceUnit]) -> BTreeMap<String, ReferenceSet> {
        let collected: Arc<Mutex<HashMap<String, ReferenceSet>>> =
            Arc::new(Mutex::new(HashMap::with_capacity(units.len())));

        for batch in units.chunks(self.concurrency) {
            let mut tasks = Vec::with_capacity(batch.len());
            for unit in batch {
                let unit = unit.clone();
                let extractor = Arc::clone(&self.extractor);
                let collected = Arc::clone(&collected);
                let task = tokio::task::spawn_blocking(move || {
                    let references = extractor.extract_unit(&unit);
                    log::debug!("{}: {} references", unit.id, references.len());
                    let mut map = collected
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    map.insert(unit.id, references);
                });
                tasks.push(task);
            }

            for task in tasks {
                if let Err(e) = task.await {
                    log::warn!("Extraction task panicked: {e}");
                }
            }
        }

        let map = match Arc::try_unwrap(collected) {
            Ok(mutex) => mutex
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
        };

        map.into_iter().collect()
    }
}

fn dedupe_units(units: Vec<SourceUnit>) -> Vec<SourceUnit> {
    let mut seen = std::collections::HashSet::new();
    units
        .into_iter()
        .filter(|unit| {
            let fresh = seen.insert(unit.id.clone());
            if !fresh {
                log::warn!("Duplicate unit id {}; keeping the first occurrence", unit.id);
            }
            fresh
        })
        .collect()
}
