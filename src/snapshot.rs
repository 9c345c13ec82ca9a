use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::types::{CleanRecord, Grupo};

/// One (categoria, quantidade) slice of a group's breakdown, ordered by
/// descending count so tooltip "top N" slices are deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub classificacao_cnae: String,
    pub quantidade: i64,
}

/// Per-neighborhood aggregate for one ingest batch.
///
/// Invariant: `total == group_totals.values().sum()`, and every recognized
/// group has an entry (0 when absent). Density metrics exist in `metrics`
/// only when the bairro has a joined population.
#[derive(Debug, Clone, Serialize)]
pub struct NeighborhoodSummary {
    pub bairro: String,
    pub populacao: Option<u64>,
    pub area_km2: Option<f64>,
    pub total: i64,
    pub group_totals: BTreeMap<Grupo, i64>,
    pub breakdown: BTreeMap<Grupo, Vec<CategoryCount>>,
    pub metrics: BTreeMap<String, f64>,
    pub percentis: BTreeMap<String, f64>,
}

/// Catalog metadata observed during one ingest pass.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub grupos: Vec<String>,
    pub categorias: Vec<String>,
    pub metrics: Vec<String>,
}

/// Immutable result of one full ingest pass. Built in isolation, then
/// published wholesale; never partially mutated.
#[derive(Debug)]
pub struct Snapshot {
    /// Per-neighborhood summaries, keyed by normalized bairro.
    pub summaries: BTreeMap<String, NeighborhoodSummary>,
    /// Raw normalized record index: bairro key -> cleaned rows in input order.
    pub records: BTreeMap<String, Vec<CleanRecord>>,
    /// Per-dataset tables: slug -> rows aggregated by (bairro, grupo, categoria).
    pub datasets: BTreeMap<String, Vec<CleanRecord>>,
    pub catalog: Catalog,
    pub built_at: DateTime<Utc>,
}

/// Single-writer, many-reader publication point for snapshots.
///
/// Readers clone the `Arc` under a short read lock and then work lock-free
/// against that immutable snapshot; a rebuild publishes with one swap, so
/// in-flight reads keep the old snapshot until they finish.
pub struct SnapshotHandle {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot a request should bind to for its entire execution.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().expect("snapshot lock poisoned").clone()
    }

    /// Atomically replaces the published snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        let mut guard = self.current.write().expect("snapshot lock poisoned");
        *guard = Arc::new(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants;

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            summaries: BTreeMap::new(),
            records: BTreeMap::new(),
            datasets: BTreeMap::new(),
            catalog: Catalog {
                grupos: vec![],
                categorias: vec![],
                metrics: constants::METRICS.iter().map(|m| m.to_string()).collect(),
            },
            built_at: Utc::now(),
        }
    }

    #[test]
    fn publish_swaps_while_old_reference_stays_valid() {
        let handle = SnapshotHandle::new(empty_snapshot());
        let before = handle.current();

        let mut next = empty_snapshot();
        next.catalog.grupos.push("Misto".to_string());
        handle.publish(next);

        // The old reference still reads consistently
        assert!(before.catalog.grupos.is_empty());
        // New readers observe the replacement
        assert_eq!(handle.current().catalog.grupos, vec!["Misto".to_string()]);
    }
}
