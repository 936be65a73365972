use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/availability", get(handlers::bookings::availability))
        .route("/api/calendar", get(handlers::bookings::calendar))
        .route("/api/slots", get(handlers::bookings::slots))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/cancel",
            get(handlers::bookings::load_cancel).post(handlers::bookings::confirm_cancel),
        )
        .route(
            "/api/bookings/reschedule",
            get(handlers::bookings::load_reschedule)
                .post(handlers::bookings::confirm_reschedule),
        )
        .route(
            "/api/reminders/sweep",
            get(handlers::admin::sweep_reminders).post(handlers::admin::sweep_reminders),
        )
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/calendar/:booking_id",
            get(handlers::calendar::download_ics),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
