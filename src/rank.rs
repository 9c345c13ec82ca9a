use std::collections::BTreeMap;

use crate::snapshot::NeighborhoodSummary;

/// Annotates every summary with rank-based percentiles for the given
/// metrics.
///
/// Per metric: entries with a defined value are collected in map order
/// (alphabetical by bairro), stable-sorted ascending by value, and the
/// entry at sorted index `i` of `n` gets `round(((i + 1) / n) * 100, 2)`.
/// Ties therefore resolve alphabetically, deterministically across
/// rebuilds of the same inputs. Values always lie in (0, 100].
pub fn rank_metrics(summaries: &mut BTreeMap<String, NeighborhoodSummary>, metric_names: &[&str]) {
    for metric in metric_names {
        let mut ranked: Vec<(String, f64)> = summaries
            .iter()
            .filter_map(|(bairro, s)| s.metrics.get(*metric).map(|v| (bairro.clone(), *v)))
            .collect();

        if ranked.is_empty() {
            continue;
        }

        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let n = ranked.len() as f64;
        for (i, (bairro, _)) in ranked.into_iter().enumerate() {
            let percentil = ((i as f64 + 1.0) / n * 100.0 * 100.0).round() / 100.0;
            if let Some(summary) = summaries.get_mut(&bairro) {
                summary.percentis.insert(metric.to_string(), percentil);
            }
        }
    }
}
