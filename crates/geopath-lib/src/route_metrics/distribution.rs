//! Route distribution aggregation
//!
//! Groups identical routes by their canonical string, counts them and
//! ranks the distinct routes by descending frequency.

use super::{MetricEngine, MetricValue, RouteMetric};
use crate::models::CoordRoute;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use tracing::info;

/// One distinct route with its frequency and requested metrics
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRow {
    pub count: usize,
    pub metrics: Vec<MetricValue>,
    pub route: String,
}

/// Count identical routes and compute `metrics` once per distinct route
///
/// Rows are ordered by descending count; equal counts keep the order in
/// which the routes were first seen.
pub fn distribution(
    routes: &[CoordRoute],
    metrics: &[RouteMetric],
    engine: &mut MetricEngine,
) -> Vec<DistributionRow> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, &CoordRoute, usize)> = Vec::new();

    for route in routes {
        let canonical = route.canonical();
        match position.get(&canonical) {
            Some(&i) => groups[i].2 += 1,
            None => {
                position.insert(canonical.clone(), groups.len());
                groups.push((canonical, route, 1));
            }
        }
    }

    // stable: ties stay in first-seen order
    groups.sort_by(|a, b| b.2.cmp(&a.2));

    let rows: Vec<DistributionRow> = groups
        .into_iter()
        .map(|(canonical, route, count)| DistributionRow {
            count,
            metrics: metrics
                .iter()
                .map(|&metric| engine.route_metric(route, metric))
                .collect(),
            route: canonical,
        })
        .collect();

    info!(
        routes = routes.len(),
        distinct_routes = rows.len(),
        "Computed routes distribution"
    );
    rows
}

/// Write distribution rows as TSV: `count`, one column per metric, `route`
pub fn write_distribution(
    rows: &[DistributionRow],
    metrics: &[RouteMetric],
    writer: impl Write,
) -> Result<()> {
    let mut tsv = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);

    let mut header = vec!["count"];
    header.extend(metrics.iter().map(RouteMetric::as_str));
    header.push("route");
    tsv.write_record(&header)
        .context("Failed to write distribution header")?;

    for row in rows {
        let mut record = Vec::with_capacity(row.metrics.len() + 2);
        record.push(row.count.to_string());
        record.extend(row.metrics.iter().map(MetricValue::to_string));
        record.push(row.route.clone());
        tsv.write_record(&record)
            .context("Failed to write distribution row")?;
    }

    tsv.flush().context("Failed to flush distribution output")?;
    Ok(())
}
