use axum::{extract::DefaultBodyLimit, routing, Router};
use link_common::PgLinkStore;
use tower::limit::GlobalConcurrencyLimitLayer;

use super::links;

pub fn add_routes(
    router: Router,
    store: PgLinkStore,
    max_body_size: usize,
    concurrency_limit: usize,
) -> Router {
    let links_router = Router::new()
        .route(
            "/users/:user_id/links",
            routing::get(links::list_links)
                .post(links::create_link)
                .patch(links::update_positions),
        )
        .route(
            "/users/:user_id/links/:link_id",
            routing::put(links::update_link).delete(links::delete_link),
        )
        .with_state(store)
        .layer(GlobalConcurrencyLimitLayer::new(concurrency_limit))
        .layer(DefaultBodyLimit::max(max_body_size));

    router
        .route("/", routing::get(index))
        .route("/_readiness", routing::get(index))
        .route("/_liveness", routing::get(index)) // No async loop, just check axum health
        .merge(links_router)
}

pub async fn index() -> &'static str {
    "profile links api"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt; // for `collect`
    use sqlx::PgPool;
    use tower::ServiceExt; // for `call`, `oneshot`, and `ready`

    #[sqlx::test(migrations = "../migrations")]
    async fn index(db: PgPool) {
        let app = add_routes(Router::new(), PgLinkStore::new_from_pool(db), 1_000_000, 10);

        for uri in ["/", "/_readiness", "/_liveness"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"profile links api");
        }
    }
}
