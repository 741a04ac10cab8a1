use std::sync::Arc;

use axum::Router;

use taller_infra::InMemoryWorkshopStore;

#[tokio::main]
async fn main() {
    taller_observability::init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_router().await;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn build_router() -> Router {
    #[cfg(feature = "postgres")]
    if let Ok(url) = std::env::var("DATABASE_URL") {
        let pool = sqlx::PgPool::connect(&url)
            .await
            .expect("failed to connect to postgres");
        let store = taller_infra::PgWorkshopStore::new(pool);
        store.migrate().await.expect("migrations failed");
        return taller_api::app::build_app(Arc::new(store));
    }

    tracing::warn!("no postgres backend configured; using volatile in-memory store");
    taller_api::app::build_app(Arc::new(InMemoryWorkshopStore::new()))
}
