use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use slurm_common::NodeRecord;

use crate::adapter::observe;
use crate::collector::{collect, Cycle};
use crate::metrics::{render_exporter_metrics, render_observations, CONTENT_TYPE};
use crate::source::SourceError;
use crate::state::AppState;

pub fn router(st: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/nodes", get(nodes_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(st)
}

/// GET /metrics — runs one collection cycle and renders it in Prometheus
/// text exposition format.
pub async fn metrics_handler(State(st): State<AppState>) -> Response {
    match collect(&st, Cycle::Scrape).await {
        Ok(outcome) => {
            let mut body = render_observations(&observe(&outcome.nodes));
            body.push_str(&render_exporter_metrics(&st.metrics));
            (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
        }
        Err(e) => source_unavailable(e),
    }
}

/// GET /nodes — the decoded node records of a fresh collection cycle. Not
/// counted as a scrape.
pub async fn nodes_handler(State(st): State<AppState>) -> Response {
    match collect(&st, Cycle::Inspect).await {
        Ok(outcome) => {
            let nodes: Vec<NodeRecord> = outcome.nodes.into_values().collect();
            Json(nodes).into_response()
        }
        Err(e) => source_unavailable(e),
    }
}

/// GET /healthz — simple liveness probe.
pub async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn source_unavailable(e: SourceError) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, format!("node source failed: {e}\n")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::tests::state;

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const OUTPUT: &str = "\
gpu01 1024 2048 4/2/0/6 mixed gpu:a100:8 gpu:a100:3(IDX:0,2-3)
cpu01 0 4096 0/16/0/16 idle (null) (null)
gpu01 1024 2048 4/2/0/6 mixed gpu:a100:8 gpu:a100:3(IDX:0,2-3)
";

    #[tokio::test]
    async fn test_metrics_handler_renders_nodes() {
        let resp = metrics_handler(State(state(Some(OUTPUT)))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], CONTENT_TYPE);

        let body = body_text(resp).await;
        assert!(body.contains("slurm_node_cpu_alloc{node=\"gpu01\",status=\"mixed\"} 4\n"));
        assert!(body.contains("slurm_node_mem_total{node=\"cpu01\",status=\"idle\"} 4096\n"));
        assert!(body.contains(
            "slurm_node_gpu_alloc{node=\"gpu01\",gpu_type=\"a100\",index=\"2\"} 1\n"
        ));
        assert!(body.contains(
            "slurm_node_gpu_alloc{node=\"gpu01\",gpu_type=\"a100\",index=\"7\"} 0\n"
        ));
        assert!(!body.contains("slurm_node_gpu_alloc{node=\"cpu01\""));
        assert_eq!(body.matches("slurm_node_cpu_total{").count(), 2);
        assert!(body.contains("slurm_exporter_nodes 2\n"));
    }

    #[tokio::test]
    async fn test_metrics_handler_source_failure() {
        let resp = metrics_handler(State(state(None))).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_text(resp).await;
        assert!(!body.contains("slurm_node_"));
        assert!(body.contains("Unable to contact slurm controller"));
    }

    #[tokio::test]
    async fn test_nodes_handler_does_not_count_as_scrape() {
        let st = state(Some(OUTPUT));
        nodes_handler(State(st.clone())).await;
        nodes_handler(State(st.clone())).await;

        let body = body_text(metrics_handler(State(st)).await).await;
        assert!(body.contains("slurm_exporter_scrapes_total 1\n"));
    }

    #[tokio::test]
    async fn test_nodes_handler() {
        let resp = nodes_handler(State(state(Some(OUTPUT)))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let nodes: Vec<NodeRecord> = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "cpu01");
        assert_eq!(nodes[1].gpu.as_ref().unwrap().allocated_count, 3);
    }

    #[tokio::test]
    async fn test_healthz() {
        let resp = healthz_handler().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }
}
