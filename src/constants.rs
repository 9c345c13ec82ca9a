/// Metric name constants to ensure consistency across the codebase.
/// These are the only metric names the choropleth and ranking endpoints accept.

pub const METRIC_TOTAL: &str = "total";
pub const METRIC_TOTAL_IN_NATURA: &str = "total_in_natura";
pub const METRIC_TOTAL_MISTO: &str = "total_misto";
pub const METRIC_TOTAL_ULTRA: &str = "total_ultraprocessado";
pub const METRIC_RATIO_ULTRA: &str = "ratio_ultra_sobre_total";
pub const METRIC_DENS_TOTAL: &str = "densidade_total_por_10k";
pub const METRIC_DENS_IN_NATURA: &str = "densidade_in_natura_por_10k";
pub const METRIC_DENS_MISTO: &str = "densidade_misto_por_10k";
pub const METRIC_DENS_ULTRA: &str = "densidade_ultraprocessado_por_10k";

/// Fixed list of recognized metrics, in catalog order.
pub const METRICS: [&str; 9] = [
    METRIC_TOTAL,
    METRIC_TOTAL_IN_NATURA,
    METRIC_TOTAL_MISTO,
    METRIC_TOTAL_ULTRA,
    METRIC_RATIO_ULTRA,
    METRIC_DENS_TOTAL,
    METRIC_DENS_IN_NATURA,
    METRIC_DENS_MISTO,
    METRIC_DENS_ULTRA,
];

/// Density metrics get percentile ranks; count metrics do not.
pub const RANKED_METRICS: [&str; 4] = [
    METRIC_DENS_TOTAL,
    METRIC_DENS_IN_NATURA,
    METRIC_DENS_MISTO,
    METRIC_DENS_ULTRA,
];

/// Default choropleth layer requested by the map client.
pub const DEFAULT_CHOROPLETH_METRIC: &str = METRIC_TOTAL_ULTRA;

/// Area fallback (km²) for census rows without a Shape_Area field.
pub const FALLBACK_AREA_KM2: f64 = 1.0;

/// Returns true if `name` is one of the recognized metric names.
pub fn is_known_metric(name: &str) -> bool {
    METRICS.contains(&name)
}
