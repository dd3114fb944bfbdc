use larder_inventory::BackorderPolicy;

#[tokio::main]
async fn main() {
    larder_observability::init();

    let policy = match std::env::var("LARDER_ALLOW_BACKORDER").as_deref() {
        Ok("1") | Ok("true") => BackorderPolicy::Allow,
        _ => BackorderPolicy::Reject,
    };
    let bind = std::env::var("LARDER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = larder_api::app::build_app(policy);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind}: {e}"));

    tracing::info!(%bind, ?policy, "larder api listening");

    axum::serve(listener, app).await.unwrap();
}
