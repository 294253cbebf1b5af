//! Route definitions for the GACP Certification Back Office

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public + protected /me)
        .nest("/auth", auth_routes(state.clone()))
        // Payment gateway webhook (public - authenticated by HMAC signature)
        .route("/webhooks/payment", post(handlers::payment_webhook))
        // Public traceability (unauthenticated - for QR code scanning)
        .route("/trace/:code", get(handlers::get_trace_view))
        // Public certificate verification (unauthenticated)
        .route(
            "/certificates/verify/:certificate_number",
            get(handlers::verify_certificate),
        )
        // Protected routes - certification applications
        .nest("/applications", application_routes(state.clone()))
        // Protected routes - invoices and payments
        .nest("/invoices", invoice_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        // Protected routes - quotes
        .nest("/quotes", quote_routes(state.clone()))
        // Protected routes - on-site audits
        .nest("/audits", audit_routes(state.clone()))
        // Protected routes - certificates
        .nest("/certificates", certificate_routes(state.clone()))
        // Protected routes - farms and provenance records
        .nest("/farms", farm_routes(state.clone()))
        // Protected routes - in-app notifications
        .nest("/notifications", notification_routes(state.clone()))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        // Protected endpoints
        .route(
            "/staff",
            post(handlers::register_staff)
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/me",
            get(handlers::me)
                .route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}

/// Application workflow routes (protected)
fn application_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_applications).post(handlers::create_application),
        )
        .route("/stats", get(handlers::application_stats))
        .route(
            "/:application_id",
            get(handlers::get_application)
                .put(handlers::update_application)
                .delete(handlers::delete_application),
        )
        .route("/:application_id/confirm", post(handlers::confirm_application))
        .route("/:application_id/resubmit", post(handlers::resubmit_application))
        .route("/:application_id/review/start", post(handlers::start_review))
        .route("/:application_id/review", post(handlers::review_decision))
        .route("/:application_id/history", get(handlers::application_history))
        // Audit actions keyed by application
        .route("/:application_id/audit/start", post(handlers::start_audit))
        .route("/:application_id/audit/result", post(handlers::submit_audit_result))
        // Certificate issuance
        .route("/:application_id/certificate", post(handlers::issue_certificate))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Invoice routes (protected)
fn invoice_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices))
        .route("/overdue-sweep", post(handlers::overdue_sweep))
        .route("/:invoice_id", get(handlers::get_invoice))
        .route("/:invoice_id/mark-paid", post(handlers::mark_invoice_paid))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Payment status routes (protected)
fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:invoice_id/status", get(handlers::payment_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Quote routes (protected)
fn quote_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_quotes).post(handlers::create_quote))
        .route("/expire-sweep", post(handlers::expire_quotes))
        .route("/:quote_id", get(handlers::get_quote))
        .route("/:quote_id/send", post(handlers::send_quote))
        .route("/:quote_id/accept", post(handlers::accept_quote))
        .route("/:quote_id/reject", post(handlers::reject_quote))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Audit scheduling routes (protected)
fn audit_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::schedule_audit))
        .route("/worklist", get(handlers::audit_worklist))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Certificate routes (protected)
fn certificate_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_certificates))
        .route("/:certificate_id", get(handlers::get_certificate))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Farm and provenance routes (protected)
fn farm_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_farms).post(handlers::create_farm))
        .route(
            "/:farm_id",
            get(handlers::get_farm).put(handlers::update_farm),
        )
        .route("/:farm_id/cycles", get(handlers::list_farm_cycles))
        .route("/:farm_id/batches", get(handlers::list_farm_batches))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/unread-count", get(handlers::unread_count))
        .route("/mark-all-read", post(handlers::mark_all_notifications_read))
        .route("/:notification_id/read", post(handlers::mark_notification_read))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
