use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sabores", get(handlers::list_flavors))
        .route("/stock", get(handlers::get_stock))
        .route("/vender", post(handlers::sell))
        .route("/total", get(handlers::get_total))
        .route("/limpiar-ventas", post(handlers::clear_sales))
        .route("/reset", post(handlers::reset))
        .route("/guardar", post(handlers::save))
        .with_state(state)
}
