use std::sync::atomic::Ordering;

use tracing::Instrument;

use slurm_common::{parse_node_records, ParseOutcome};

use crate::source::SourceError;
use crate::state::AppState;

/// Who asked for a collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// A Prometheus scrape; accounted in the exporter self-metrics.
    Scrape,
    /// An operator request on `/nodes`; leaves the self-metrics untouched.
    Inspect,
}

/// Run one collection cycle: fetch `sinfo` output and parse it.
///
/// A source failure aborts the cycle. With `exit_on_source_failure` set it
/// also raises the fatal signal in [`AppState`], which stops the server so
/// `main` can return the error.
pub async fn collect(st: &AppState, cycle: Cycle) -> Result<ParseOutcome, SourceError> {
    let _cycle = st.cycle.lock().await;
    let scrape = cycle == Cycle::Scrape;
    if scrape {
        st.metrics.scrapes_total.fetch_add(1, Ordering::Relaxed);
    }

    async {
        let raw = match st.source.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                if scrape {
                    st.metrics.scrape_failures_total.fetch_add(1, Ordering::Relaxed);
                }
                tracing::error!(error=%e, "node source failed, no metrics published this cycle");
                if st.exit_on_source_failure {
                    st.fatal.send_replace(Some(e.to_string()));
                }
                return Err(e);
            }
        };

        let outcome = parse_node_records(&raw);
        for rejected in &outcome.rejected {
            tracing::warn!(line=%rejected.line, error=%rejected.error, "skipping undecodable sinfo row");
        }
        for node in &outcome.conflicts {
            tracing::warn!(%node, "node reported on conflicting sinfo rows, keeping first");
        }

        if scrape {
            st.metrics
                .decode_errors_total
                .fetch_add(outcome.rejected.len() as u64, Ordering::Relaxed);
            st.metrics
                .duplicate_conflicts_total
                .fetch_add(outcome.conflicts.len() as u64, Ordering::Relaxed);
            st.metrics
                .nodes
                .store(outcome.nodes.len() as u64, Ordering::Relaxed);
        }

        tracing::debug!(
            nodes = outcome.nodes.len(),
            rejected = outcome.rejected.len(),
            ?cycle,
            "collection cycle finished"
        );
        Ok(outcome)
    }
    .instrument(tracing::info_span!("collect", ?cycle))
    .await
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::source::NodeSource;

    /// In-memory source returning fixed output, or an exit failure when empty.
    pub(crate) struct StaticSource(pub Option<&'static str>);

    #[async_trait]
    impl NodeSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
            match self.0 {
                Some(out) => Ok(out.as_bytes().to_vec()),
                None => Err(SourceError::Exit {
                    bin: "sinfo".to_string(),
                    code: Some(1),
                    stderr: "slurm_load_node: Unable to contact slurm controller".to_string(),
                }),
            }
        }
    }

    pub(crate) fn state(output: Option<&'static str>) -> AppState {
        AppState::new(Arc::new(StaticSource(output)), false)
    }

    fn fail_fast_state() -> AppState {
        AppState::new(Arc::new(StaticSource(None)), true)
    }

    #[tokio::test]
    async fn test_collect_counts_rejections_and_conflicts() {
        let st = state(Some(
            "n1 0 0 0/4/0/4 idle (null) (null)\n\
             n1 5 0 0/4/0/4 idle (null) (null)\n\
             n2 0 0 bogus idle (null) (null)\n",
        ));
        let outcome = collect(&st, Cycle::Scrape).await.unwrap();

        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(st.metrics.scrapes_total.load(Ordering::Relaxed), 1);
        assert_eq!(st.metrics.decode_errors_total.load(Ordering::Relaxed), 1);
        assert_eq!(st.metrics.duplicate_conflicts_total.load(Ordering::Relaxed), 1);
        assert_eq!(st.metrics.nodes.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_collect_source_failure() {
        let st = state(None);
        let err = collect(&st, Cycle::Scrape).await.unwrap_err();

        assert!(matches!(err, SourceError::Exit { .. }));
        assert_eq!(st.metrics.scrape_failures_total.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_each_cycle_rebuilds_the_map() {
        let st = state(Some("n1 0 0 0/4/0/4 idle (null) (null)\n"));
        let first = collect(&st, Cycle::Scrape).await.unwrap();
        let second = collect(&st, Cycle::Scrape).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(st.metrics.scrapes_total.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_source_failure_raises_fatal_signal_when_fail_fast() {
        let st = fail_fast_state();
        let mut fatal = st.fatal.subscribe();

        let err = collect(&st, Cycle::Scrape).await.unwrap_err();
        assert!(matches!(err, SourceError::Exit { .. }));

        let reason = fatal.wait_for(Option::is_some).await.unwrap().clone();
        assert!(reason.unwrap().contains("Unable to contact slurm controller"));
    }

    #[tokio::test]
    async fn test_source_failure_keeps_running_by_default() {
        let st = state(None);
        collect(&st, Cycle::Scrape).await.unwrap_err();
        assert!(st.fatal.borrow().is_none());
    }

    #[tokio::test]
    async fn test_inspect_cycle_leaves_counters_alone() {
        let st = state(Some(
            "n1 0 0 0/4/0/4 idle (null) (null)\n\
             n2 0 0 bogus idle (null) (null)\n",
        ));
        let outcome = collect(&st, Cycle::Inspect).await.unwrap();
        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);

        assert_eq!(st.metrics.scrapes_total.load(Ordering::Relaxed), 0);
        assert_eq!(st.metrics.decode_errors_total.load(Ordering::Relaxed), 0);
        assert_eq!(st.metrics.nodes.load(Ordering::Relaxed), 0);

        collect(&state(None), Cycle::Inspect).await.unwrap_err();
    }
}
