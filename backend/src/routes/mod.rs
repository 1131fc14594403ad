//! Route definitions for the stock management API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - product catalogue
        .nest("/products", product_routes(state.clone()))
        // Protected routes - orders
        .nest("/orders", order_routes(state.clone()))
        // Protected routes - invoices
        .nest("/invoices", invoice_routes(state.clone()))
        // Protected routes - supplier directory
        .nest("/suppliers", supplier_routes(state.clone()))
        // Protected routes - notification inbox
        .nest("/notifications", notification_routes(state.clone()))
        // Protected routes - deletion history
        .nest("/history", history_routes(state.clone()))
        // Protected routes - agent balances
        .nest("/balances", balance_routes(state.clone()))
        // Protected routes - agent administration
        .nest("/agents", agent_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Product routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/restore", post(handlers::restore_product))
        .route(
            "/:product_id/orders",
            get(handlers::list_product_orders).post(handlers::place_product_order),
        )
        .route(
            "/:product_id/suppliers",
            get(handlers::list_product_suppliers).post(handlers::add_product_supplier),
        )
        .route(
            "/:product_id/suppliers/:supplier_id",
            delete(handlers::remove_product_supplier),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Order routes (protected)
fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::place_order))
        .route(
            "/:order_id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/:order_id/restore", post(handlers::restore_order))
        .route("/:order_id/confirm-payment", post(handlers::confirm_payment))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Invoice routes (protected)
fn invoice_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::create_invoice))
        .route(
            "/:invoice_id",
            get(handlers::get_invoice).delete(handlers::delete_invoice),
        )
        .route("/:invoice_id/status", put(handlers::update_invoice_status))
        .route("/:invoice_id/payments", post(handlers::record_payment))
        .route("/:invoice_id/restore", post(handlers::restore_invoice))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Supplier routes (protected)
fn supplier_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route("/me", get(handlers::get_my_supplier))
        .route(
            "/:supplier_id",
            get(handlers::get_supplier).put(handlers::update_supplier),
        )
        .route("/:supplier_id/activate", post(handlers::activate_supplier))
        .route("/:supplier_id/deactivate", post(handlers::deactivate_supplier))
        .route("/:supplier_id/password", put(handlers::set_supplier_password))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/:notification_id/read", post(handlers::mark_as_read))
        .route("/:notification_id/processed", post(handlers::mark_as_processed))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// History routes (protected)
fn history_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Balance routes (protected)
fn balance_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_balances))
        .route("/me", get(handlers::get_my_balance))
        .route("/:agent_id", get(handlers::get_agent_balance))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Agent administration routes (protected)
fn agent_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_agents).post(handlers::create_agent))
        .route("/:agent_id/groups", put(handlers::set_agent_groups))
        .route("/:agent_id/activate", post(handlers::activate_agent))
        .route("/:agent_id/deactivate", post(handlers::deactivate_agent))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
