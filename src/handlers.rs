use crate::errors::AppError;
use crate::ledger::LedgerError;
use crate::models::{parse_quantity, MessageResponse, SaleRequest, SaleResponse, TotalResponse};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

pub async fn list_flavors(State(state): State<AppState>) -> Json<Vec<String>> {
    let ledger = state.ledger.read().await;
    Json(ledger.flavors())
}

pub async fn get_stock(State(state): State<AppState>) -> Json<BTreeMap<String, u32>> {
    let ledger = state.ledger.read().await;
    Json(ledger.stock())
}

pub async fn sell(
    State(state): State<AppState>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<Json<SaleResponse>, AppError> {
    let Json(payload) = payload.inspect_err(|err| warn!("malformed sale request: {err}"))?;

    let flavor = payload.sabor.trim();
    if flavor.is_empty() {
        warn!("sale rejected: empty flavor");
        return Err(AppError::validation("El campo 'sabor' no puede estar vacío."));
    }
    let quantity = parse_quantity(&payload.cantidad).map_err(rejected)?;

    let receipt = {
        let mut ledger = state.ledger.write().await;
        ledger.sell(flavor, quantity).map_err(rejected)?
    };

    let sale = receipt.sale;
    info!(
        flavor = %sale.flavor,
        quantity = sale.quantity,
        remaining = sale.remaining_stock,
        total = %receipt.running_total,
        "sale recorded"
    );

    Ok(Json(SaleResponse {
        message: format!(
            "Venta registrada: {} helado(s) de sabor {}. Stock restante: {}",
            sale.quantity, sale.flavor, sale.remaining_stock
        ),
        total: sale.amount,
        total_ventas: receipt.running_total,
        venta: sale,
    }))
}

pub async fn get_total(State(state): State<AppState>) -> Json<TotalResponse> {
    let ledger = state.ledger.read().await;
    Json(TotalResponse {
        total_ventas: ledger.total(),
        ventas: ledger.sales().to_vec(),
    })
}

pub async fn clear_sales(State(state): State<AppState>) -> Json<MessageResponse> {
    state.ledger.write().await.clear_sales();
    info!("sales cleared");
    Json(MessageResponse::new("Todas las ventas han sido eliminadas."))
}

pub async fn reset(State(state): State<AppState>) -> Json<MessageResponse> {
    state.ledger.write().await.reset_all();
    info!("stock reset and sales cleared");
    Json(MessageResponse::new(
        "Todos los stocks han sido restablecidos a su valor inicial y las ventas han sido reiniciadas.",
    ))
}

pub async fn save(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    let saved = state.archive.save(&state.ledger).await.inspect_err(|err| {
        error!("failed to save sales to {}: {err}", state.archive.path().display());
    })?;

    info!(count = saved.count, path = %state.archive.path().display(), "sales saved");
    Ok(Json(MessageResponse::new(format!(
        "Se guardaron {} venta(s) por un total de ${}.",
        saved.count, saved.total
    ))))
}

fn rejected(err: LedgerError) -> AppError {
    warn!("sale rejected: {err}");
    err.into()
}
