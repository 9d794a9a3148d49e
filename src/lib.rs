pub mod clock;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use clock::{Clock, SystemClock};
use services::{ExpirySweeper, ReservationManager};
use store::{BookingStore, MemoryStore, PgStore, ShowCatalog};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn ShowCatalog>,
    pub reservations: ReservationManager,
    pub sweeper: ExpirySweeper,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn ShowCatalog>,
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        booking: &config::BookingConfig,
    ) -> anyhow::Result<Arc<Self>> {
        let hold = chrono::Duration::from_std(booking.hold)?;
        let reservations = ReservationManager::new(catalog.clone(), store, clock).with_hold(hold);
        let sweeper = ExpirySweeper::new(reservations.clone(), booking.sweep_interval);

        Ok(Arc::new(Self {
            catalog,
            reservations,
            sweeper,
        }))
    }

    /// State backed by Postgres and the system clock.
    pub fn postgres(db: database::Database, config: &config::Config) -> anyhow::Result<Arc<Self>> {
        let store = Arc::new(PgStore::new(db));
        Self::new(store.clone(), store, Arc::new(SystemClock), &config.booking)
    }

    /// State backed by the in-process store.
    pub fn in_memory(clock: Arc<dyn Clock>, booking: &config::BookingConfig) -> anyhow::Result<Arc<Self>> {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, clock, booking)
    }
}

/// The full HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Seat Reservation API v1.0" }))
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
        )
        // Mount the routes from the controllers module
        .nest("/api", controllers::routes())
        // Pass the application state to the router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
