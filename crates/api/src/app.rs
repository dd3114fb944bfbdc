use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};

use larder_infra::{InMemoryInventoryStore, InventoryStore, StockLedger};
use larder_inventory::BackorderPolicy;
use larder_units::UnitRegistry;

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared ledger service behind every handler.
pub struct AppServices {
    pub ledger: StockLedger<InMemoryInventoryStore>,
}

/// Build the application router over an in-memory store, seeded with the
/// standard unit catalog.
pub fn build_app(policy: BackorderPolicy) -> Router {
    let store = InMemoryInventoryStore::new();
    let ledger = StockLedger::with_policy(store, policy);
    seed_standard_units(&ledger);

    let services = Arc::new(AppServices { ledger });
    router(services)
}

pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/healthz", get(routes::system::healthz))
        .nest("/api/units", routes::units::router())
        .nest("/api/ingredients", routes::ingredients::router())
        .nest("/api/recipes", routes::recipes::router())
        .nest("/api/orders", routes::orders::router())
        .layer(Extension(services))
}

fn seed_standard_units(ledger: &StockLedger<InMemoryInventoryStore>) {
    for unit in UnitRegistry::standard().units() {
        // Freshly built store; registration of the static catalog only fails
        // if a previous seeding already ran, which is fine to ignore.
        if let Err(err) = ledger.store().insert_unit(unit.clone()) {
            tracing::debug!(%err, unit = %unit.name, "skipping standard unit");
        }
    }
}
