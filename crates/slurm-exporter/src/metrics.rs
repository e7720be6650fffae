use std::sync::atomic::{AtomicU64, Ordering};

use crate::adapter::{Gauge, Observation};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Exporter self-metrics, shared across scrapes.
#[derive(Debug, Default)]
pub struct ExporterMetrics {
    /// Collection cycles started.
    pub scrapes_total: AtomicU64,
    /// Cycles aborted because `sinfo` failed.
    pub scrape_failures_total: AtomicU64,
    /// `sinfo` rows skipped because they could not be decoded.
    pub decode_errors_total: AtomicU64,
    /// Node names seen on more than one distinct row.
    pub duplicate_conflicts_total: AtomicU64,
    /// Nodes published by the last successful cycle (gauge).
    pub nodes: AtomicU64,
}

/// Render node observations in Prometheus text exposition format, one
/// `HELP`/`TYPE` header per non-empty gauge family.
pub fn render_observations(observations: &[Observation]) -> String {
    let mut body = String::new();
    for gauge in Gauge::ALL {
        let mut family = observations.iter().filter(|o| o.gauge == gauge).peekable();
        if family.peek().is_none() {
            continue;
        }

        body.push_str(&format!(
            "# HELP {name} {help}\n# TYPE {name} gauge\n",
            name = gauge.name(),
            help = gauge.help(),
        ));
        for obs in family {
            let labels = obs
                .labels
                .iter()
                .map(|(key, value)| format!("{key}=\"{}\"", escape_label_value(value)))
                .collect::<Vec<_>>()
                .join(",");
            body.push_str(&format!("{}{{{labels}}} {}\n", gauge.name(), obs.value));
        }
    }
    body
}

pub fn render_exporter_metrics(metrics: &ExporterMetrics) -> String {
    format!(
        "# HELP slurm_exporter_scrapes_total Collection cycles started.\n\
         # TYPE slurm_exporter_scrapes_total counter\n\
         slurm_exporter_scrapes_total {}\n\
         # HELP slurm_exporter_scrape_failures_total Collection cycles aborted because sinfo failed.\n\
         # TYPE slurm_exporter_scrape_failures_total counter\n\
         slurm_exporter_scrape_failures_total {}\n\
         # HELP slurm_exporter_decode_errors_total sinfo rows skipped because they could not be decoded.\n\
         # TYPE slurm_exporter_decode_errors_total counter\n\
         slurm_exporter_decode_errors_total {}\n\
         # HELP slurm_exporter_duplicate_conflicts_total Node names reported on more than one distinct sinfo row.\n\
         # TYPE slurm_exporter_duplicate_conflicts_total counter\n\
         slurm_exporter_duplicate_conflicts_total {}\n\
         # HELP slurm_exporter_nodes Nodes published by the last successful collection cycle.\n\
         # TYPE slurm_exporter_nodes gauge\n\
         slurm_exporter_nodes {}\n",
        metrics.scrapes_total.load(Ordering::Relaxed),
        metrics.scrape_failures_total.load(Ordering::Relaxed),
        metrics.decode_errors_total.load(Ordering::Relaxed),
        metrics.duplicate_conflicts_total.load(Ordering::Relaxed),
        metrics.nodes.load(Ordering::Relaxed),
    )
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
