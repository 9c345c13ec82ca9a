use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::constants;
use crate::metrics as obs;
use crate::normalize::normalize;
use crate::numeric::{parse_count, parse_number};
use crate::rank;
use crate::registry;
use crate::snapshot::{Catalog, CategoryCount, NeighborhoodSummary, Snapshot};
use crate::types::{CensusRow, CleanRecord, Grupo, RawEstablishmentRecord};

/// Census data joined per normalized bairro key.
struct CensusEntry {
    populacao: Option<u64>,
    area_km2: f64,
}

/// Builds a complete snapshot from one ingest batch.
///
/// Pure with respect to its inputs; the caller publishes the result via
/// `SnapshotHandle`. Malformed rows degrade (zero/skip), they never abort
/// the batch.
pub fn build_snapshot(records: &[RawEstablishmentRecord], census: &[CensusRow]) -> Snapshot {
    let started = std::time::Instant::now();

    let mut index: BTreeMap<String, Vec<CleanRecord>> = BTreeMap::new();
    let mut group_totals: BTreeMap<String, BTreeMap<Grupo, i64>> = BTreeMap::new();
    let mut population_hints: BTreeMap<String, u64> = BTreeMap::new();
    let mut grupos_seen: BTreeSet<&'static str> = BTreeSet::new();
    let mut categorias_seen: BTreeSet<String> = BTreeSet::new();

    // Pass 1: establishments
    let mut skipped = 0usize;
    for raw in records {
        let bairro = normalize(&raw.bairro);
        if bairro.is_empty() {
            skipped += 1;
            obs::record_row_skipped("empty_bairro");
            continue;
        }

        let classification = registry::classify(&raw.classificacao_cnae, &raw.classificacao_grupo);
        let quantidade = parse_count(&raw.quantidade);

        // Hint aggregation uses max across duplicate rows; the census, when
        // present, still wins (first-row policy, applied below).
        if let Some(hint) = raw.populacao.as_deref().and_then(parse_number) {
            if hint > 0.0 {
                let hint = hint.round() as u64;
                let slot = population_hints.entry(bairro.clone()).or_insert(0);
                *slot = (*slot).max(hint);
            }
        }

        grupos_seen.insert(classification.grupo.as_label());
        let categoria = raw.classificacao_cnae.trim().to_string();
        if !categoria.is_empty() {
            categorias_seen.insert(categoria.clone());
        }

        let clean = CleanRecord {
            bairro: bairro.clone(),
            classificacao_grupo: classification.grupo.as_label().to_string(),
            classificacao_cnae: categoria,
            quantidade,
            dataset: classification.dataset.to_string(),
            grupo: classification.grupo,
        };

        *group_totals
            .entry(bairro.clone())
            .or_default()
            .entry(classification.grupo)
            .or_insert(0) += quantidade;
        index.entry(bairro).or_default().push(clean);
        obs::record_row_ingested();
    }

    // Pass 2: census join. First row per key wins, by input order.
    let mut census_by_bairro: BTreeMap<String, CensusEntry> = BTreeMap::new();
    for row in census {
        let bairro = normalize(&row.nome);
        if bairro.is_empty() {
            continue;
        }
        census_by_bairro.entry(bairro).or_insert_with(|| {
            let area_km2 = row
                .shape_area
                .as_deref()
                .and_then(parse_number)
                .map(|m2| m2 / 1_000_000.0)
                .unwrap_or(constants::FALLBACK_AREA_KM2);
            let populacao = row
                .populacao
                .as_deref()
                .and_then(parse_number)
                .filter(|p| *p > 0.0)
                .map(|p| p.round() as u64);
            CensusEntry { populacao, area_km2 }
        });
    }

    // Pass 3: summaries with derived metrics
    let mut summaries: BTreeMap<String, NeighborhoodSummary> = BTreeMap::new();
    for (bairro, rows) in &index {
        let totals = group_totals.get(bairro).cloned().unwrap_or_default();
        let total: i64 = totals.values().sum();

        let census_entry = census_by_bairro.get(bairro);
        let populacao = match census_entry.and_then(|c| c.populacao) {
            Some(p) => Some(p),
            None => population_hints.get(bairro).copied(),
        };
        let area_km2 = census_entry.map(|c| c.area_km2);

        let mut metrics: BTreeMap<String, f64> = BTreeMap::new();
        metrics.insert(constants::METRIC_TOTAL.to_string(), total as f64);
        for grupo in Grupo::RECOGNIZED {
            let count = totals.get(&grupo).copied().unwrap_or(0);
            metrics.insert(format!("total_{}", grupo.as_key()), count as f64);
        }

        let total_ultra = totals.get(&Grupo::Ultraprocessado).copied().unwrap_or(0);
        let ratio = if total > 0 {
            total_ultra as f64 / total as f64
        } else {
            0.0
        };
        metrics.insert(constants::METRIC_RATIO_ULTRA.to_string(), ratio);

        // Density metrics are defined only for joined, positive populations;
        // bairros without one are thereby excluded from density ranking and
        // density choropleths.
        if let Some(pop) = populacao.filter(|p| *p > 0) {
            let pop = pop as f64;
            metrics.insert(
                constants::METRIC_DENS_TOTAL.to_string(),
                round2(total as f64 * 10_000.0 / pop),
            );
            for grupo in Grupo::RECOGNIZED {
                let count = totals.get(&grupo).copied().unwrap_or(0) as f64;
                metrics.insert(
                    format!("densidade_{}_por_10k", grupo.as_key()),
                    round2(count * 10_000.0 / pop),
                );
            }
        } else {
            debug!(bairro = %bairro, "sem população no censo; densidades indefinidas");
        }

        // Ensure the recognized groups are present even when empty
        let mut full_totals = totals.clone();
        for grupo in Grupo::RECOGNIZED {
            full_totals.entry(grupo).or_insert(0);
        }

        summaries.insert(
            bairro.clone(),
            NeighborhoodSummary {
                bairro: bairro.clone(),
                populacao,
                area_km2,
                total,
                group_totals: full_totals,
                breakdown: breakdown_for(rows),
                metrics,
                percentis: BTreeMap::new(),
            },
        );
    }

    rank::rank_metrics(&mut summaries, &constants::RANKED_METRICS);

    let datasets = dataset_tables(&index);
    let catalog = Catalog {
        grupos: grupos_seen.iter().map(|g| g.to_string()).collect(),
        categorias: categorias_seen.into_iter().collect(),
        metrics: constants::METRICS.iter().map(|m| m.to_string()).collect(),
    };

    let elapsed = started.elapsed().as_secs_f64();
    obs::record_snapshot_built(elapsed);
    info!(
        bairros = summaries.len(),
        linhas = records.len(),
        ignoradas = skipped,
        segundos = elapsed,
        "snapshot construído"
    );

    Snapshot {
        summaries,
        records: index,
        datasets,
        catalog,
        built_at: Utc::now(),
    }
}

/// Per-group breakdown of one bairro's rows, aggregated by categoria and
/// ordered by descending count (ties alphabetical).
fn breakdown_for(rows: &[CleanRecord]) -> BTreeMap<Grupo, Vec<CategoryCount>> {
    let mut by_group: BTreeMap<Grupo, BTreeMap<String, i64>> = BTreeMap::new();
    for row in rows {
        *by_group
            .entry(row.grupo)
            .or_default()
            .entry(row.classificacao_cnae.clone())
            .or_insert(0) += row.quantidade;
    }

    by_group
        .into_iter()
        .map(|(grupo, counts)| {
            let mut list: Vec<CategoryCount> = counts
                .into_iter()
                .map(|(classificacao_cnae, quantidade)| CategoryCount {
                    classificacao_cnae,
                    quantidade,
                })
                .collect();
            list.sort_by(|a, b| {
                b.quantidade
                    .cmp(&a.quantidade)
                    .then_with(|| a.classificacao_cnae.cmp(&b.classificacao_cnae))
            });
            (grupo, list)
        })
        .collect()
}

/// Per-dataset tables: rows aggregated by (bairro, grupo, categoria),
/// summing quantities, in bairro order.
fn dataset_tables(index: &BTreeMap<String, Vec<CleanRecord>>) -> BTreeMap<String, Vec<CleanRecord>> {
    let mut keyed: BTreeMap<(String, String, Grupo, String), i64> = BTreeMap::new();
    for rows in index.values() {
        for row in rows {
            *keyed
                .entry((
                    row.dataset.clone(),
                    row.bairro.clone(),
                    row.grupo,
                    row.classificacao_cnae.clone(),
                ))
                .or_insert(0) += row.quantidade;
        }
    }

    let mut tables: BTreeMap<String, Vec<CleanRecord>> = BTreeMap::new();
    for ((dataset, bairro, grupo, categoria), quantidade) in keyed {
        tables.entry(dataset.clone()).or_default().push(CleanRecord {
            bairro,
            classificacao_grupo: grupo.as_label().to_string(),
            classificacao_cnae: categoria,
            quantidade,
            dataset,
            grupo,
        });
    }
    tables
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
