use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
    routing::get, Router,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const EXPONENTIAL_SECONDS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Install the global recorder, serve `/metrics` and record request metrics for every route.
pub fn setup_metrics_routes(router: Router) -> Result<Router, BuildError> {
    let recorder_handle = setup_metrics_recorder()?;

    Ok(add_metrics_routes(router, recorder_handle))
}

pub fn add_metrics_routes(router: Router, recorder_handle: PrometheusHandle) -> Router {
    router
        .route(
            "/metrics",
            get(move || std::future::ready(recorder_handle.render())),
        )
        .layer(axum::middleware::from_fn(track_metrics))
}

fn metrics_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets(EXPONENTIAL_SECONDS)
}

pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    metrics_builder()?.install_recorder()
}

/// Middleware to record request counts and latencies, labelled by matched route.
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    // Label by route template so user ids don't blow up cardinality.
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched_path) => matched_path.as_str().to_owned(),
        None => "unmatched".to_owned(),
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", response.status().as_u16().to_string()),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::StatusCode;
    use http_body_util::BodyExt; // for `collect`
    use tower::ServiceExt; // for `oneshot`
    use uuid::Uuid;

    async fn get_status(app: &Router, uri: &str) -> StatusCode {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn requests_are_labelled_by_route_template() {
        let recorder = metrics_builder().unwrap().build_recorder();
        let app = add_metrics_routes(
            Router::new().route("/users/:user_id/links", get(|| async { "[]" })),
            recorder.handle(),
        );
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let user_id = Uuid::new_v4();

        let rendered = metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                for _ in 0..2 {
                    let status = get_status(&app, &format!("/users/{user_id}/links")).await;
                    assert_eq!(status, StatusCode::OK);
                }

                let response = app
                    .clone()
                    .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);

                let body = response.into_body().collect().await.unwrap().to_bytes();
                String::from_utf8(body.to_vec()).unwrap()
            })
        });

        let requests: Vec<&str> = rendered
            .lines()
            .filter(|line| line.starts_with("http_requests_total{"))
            .collect();
        assert_eq!(requests.len(), 1, "{rendered}");
        assert!(requests[0].contains(r#"path="/users/:user_id/links""#));
        assert!(requests[0].contains(r#"method="GET""#));
        assert!(requests[0].contains(r#"status="200""#));
        assert!(requests[0].ends_with(" 2"));
        assert!(rendered.contains("http_requests_duration_seconds_bucket{"));
        assert!(!rendered.contains(&user_id.to_string()));
    }
}
